use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use recovery_core::client::heartbeat::{Heartbeat, HttpLivenessProbe, LivenessProbe};
use recovery_core::client::http::HttpAnalysisClient;
use recovery_core::client::{AnalysisClient, CsvUpload};
use recovery_core::dashboard::{Dashboard, SampleAsset};
use recovery_core::view::table::{SortDirection, SortKey, SortState};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Upper bound on waiting for the first connectivity probe before rendering.
const STATUS_SETTLE_TIMEOUT: Duration = Duration::from_secs(6);

#[derive(Debug, Parser)]
#[command(name = "recovery_cli", about = "Sales recovery dashboard for the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Upload a sales CSV and render the recovery dashboard.
    Analyze(AnalyzeArgs),
    /// Check whether the analysis service is reachable.
    Status,
    /// Write the bundled sample CSV to disk.
    Sample {
        #[arg(long, default_value = "sales_recovery_sample.csv")]
        out: PathBuf,
    },
}

#[derive(Debug, Args)]
struct AnalyzeArgs {
    /// Sales CSV (semicolon separated).
    #[arg(long, required_unless_present = "sample", conflicts_with = "sample")]
    file: Option<PathBuf>,

    /// Use the bundled sample dataset instead of --file.
    #[arg(long)]
    sample: bool,

    /// Inactivity threshold in days (minimum 60).
    #[arg(long, default_value = "60")]
    threshold: String,

    /// Table sort column (Cliente, last_purchase_date, days_since_last_purchase,
    /// average_ticket_value, total_revenue).
    #[arg(long, default_value = "total_revenue")]
    sort: SortKey,

    /// asc or desc. Defaults to desc.
    #[arg(long)]
    direction: Option<SortDirection>,

    #[arg(long, default_value_t = 1)]
    page: usize,

    /// 10, 15 or 30.
    #[arg(long, default_value_t = 10)]
    page_size: usize,

    /// Print the validated analysis result as JSON instead of the dashboard.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    let settings = recovery_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Analyze(args) => analyze(&settings, args).await,
        Command::Status => status(&settings).await,
        Command::Sample { out } => write_sample(&settings, out).await,
    };

    if let Err(err) = &result {
        sentry_anyhow::capture_anyhow(err);
        tracing::error!(error = %err, "command failed");
    }
    result
}

async fn analyze(
    settings: &recovery_core::config::Settings,
    args: AnalyzeArgs,
) -> anyhow::Result<ExitCode> {
    let client = HttpAnalysisClient::from_settings(settings)?;
    let heartbeat = Heartbeat::spawn(
        HttpLivenessProbe::from_settings(settings)?,
        Duration::from_secs(settings.heartbeat_interval_secs),
    );

    let mut dashboard = Dashboard::new();
    dashboard.set_threshold(args.threshold);
    dashboard.set_page_size(args.page_size)?;
    dashboard.set_sort(SortState {
        key: args.sort,
        direction: args.direction.unwrap_or(SortDirection::Desc),
    });

    let dataset = match args.file {
        Some(path) if !args.sample => Dataset::File(path),
        _ => Dataset::Sample(settings.sample_csv_path.clone()),
    };

    tracing::info!(
        base_url = %client.base_url(),
        threshold = %dashboard.threshold_input(),
        "submitting analysis"
    );
    let loaded = run_analysis(&mut dashboard, &dataset, &client).await?;
    if loaded {
        dashboard.go_to_page(args.page);
    }

    let mut status = heartbeat.subscribe();
    let _ = tokio::time::timeout(STATUS_SETTLE_TIMEOUT, status.changed()).await;

    if args.json {
        if let Some(result) = dashboard.results() {
            println!("{}", serde_json::to_string_pretty(result)?);
        }
    }
    if !args.json || !loaded {
        let mut out = String::new();
        recovery_core::render::render_dashboard(&mut out, &dashboard, heartbeat.is_online())?;
        print!("{out}");
    }

    Ok(if loaded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

enum Dataset {
    File(PathBuf),
    Sample(PathBuf),
}

/// Selects the dataset and submits it. A rejected selection skips the request
/// so its message stays on the dashboard.
async fn run_analysis(
    dashboard: &mut Dashboard,
    dataset: &Dataset,
    client: &dyn AnalysisClient,
) -> anyhow::Result<bool> {
    let selected = match dataset {
        Dataset::Sample(path) => dashboard.use_sample(&SampleAsset::new(path)).await,
        Dataset::File(path) => {
            let bytes = tokio::fs::read(path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            dashboard.select_file(CsvUpload::new(file_name, bytes))
        }
    };
    if !selected {
        return Ok(false);
    }
    Ok(dashboard.submit(client).await)
}

async fn status(settings: &recovery_core::config::Settings) -> anyhow::Result<ExitCode> {
    let probe = HttpLivenessProbe::from_settings(settings)?;
    let online = probe.is_online().await;
    println!(
        "{} {}",
        settings.analysis_api_url,
        if online { "online" } else { "offline" }
    );
    Ok(if online {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn write_sample(
    settings: &recovery_core::config::Settings,
    out: PathBuf,
) -> anyhow::Result<ExitCode> {
    let asset = SampleAsset::new(&settings.sample_csv_path);
    let written = asset.copy_to(&out).await?;
    tracing::info!(path = %out.display(), bytes = written, "sample dataset written");
    println!("{}", out.display());
    Ok(ExitCode::SUCCESS)
}

fn init_sentry(settings: &recovery_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use recovery_core::client::error::{AnalysisError, ErrorKind};
    use recovery_core::dashboard::{INVALID_FORMAT_MESSAGE, SAMPLE_LOAD_MESSAGE};
    use recovery_core::domain::analysis::AnalysisResult;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingClient {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl AnalysisClient for CountingClient {
        async fn submit(
            &self,
            _file: &CsvUpload,
            _threshold_days: u32,
        ) -> Result<AnalysisResult, AnalysisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(AnalysisError::Transport {
                detail: "unreachable".to_string(),
            })
        }
    }

    fn scratch_file(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("recovery-cli-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, b"Cliente;Valor\n").unwrap();
        path
    }

    #[tokio::test]
    async fn non_csv_file_keeps_its_message_and_skips_the_request() {
        let client = CountingClient::default();
        let mut dashboard = Dashboard::new();
        let dataset = Dataset::File(scratch_file("data.txt"));

        let loaded = run_analysis(&mut dashboard, &dataset, &client).await.unwrap();
        assert!(!loaded);
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
        assert_eq!(dashboard.feedback().unwrap().text, INVALID_FORMAT_MESSAGE);
    }

    #[tokio::test]
    async fn missing_sample_keeps_sample_load_error() {
        let client = CountingClient::default();
        let mut dashboard = Dashboard::new();
        let dataset = Dataset::Sample(PathBuf::from("missing.csv"));

        let loaded = run_analysis(&mut dashboard, &dataset, &client).await.unwrap();
        assert!(!loaded);
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
        assert_eq!(dashboard.error().unwrap().kind(), ErrorKind::SampleLoad);
        assert_eq!(dashboard.feedback().unwrap().text, SAMPLE_LOAD_MESSAGE);
    }

    #[tokio::test]
    async fn csv_file_is_submitted_once() {
        let client = CountingClient::default();
        let mut dashboard = Dashboard::new();
        let dataset = Dataset::File(scratch_file("vendas.csv"));

        let loaded = run_analysis(&mut dashboard, &dataset, &client).await.unwrap();
        assert!(!loaded);
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
        assert_eq!(dashboard.error().unwrap().kind(), ErrorKind::Transport);
    }

    #[test]
    fn parses_analyze_flags() {
        let cli = Cli::try_parse_from([
            "recovery_cli",
            "analyze",
            "--file",
            "vendas.csv",
            "--threshold",
            "90",
            "--sort",
            "Cliente",
            "--direction",
            "asc",
            "--page-size",
            "15",
        ])
        .unwrap();

        let Command::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(args.file, Some(PathBuf::from("vendas.csv")));
        assert_eq!(args.threshold, "90");
        assert_eq!(args.sort, SortKey::ClientName);
        assert_eq!(args.direction, Some(SortDirection::Asc));
        assert_eq!(args.page_size, 15);
        assert!(!args.sample);
    }

    #[test]
    fn analyze_requires_file_or_sample() {
        assert!(Cli::try_parse_from(["recovery_cli", "analyze"]).is_err());
        assert!(Cli::try_parse_from(["recovery_cli", "analyze", "--sample"]).is_ok());
        assert!(Cli::try_parse_from([
            "recovery_cli",
            "analyze",
            "--sample",
            "--file",
            "x.csv"
        ])
        .is_err());
    }

    #[test]
    fn rejects_unknown_sort_key() {
        assert!(Cli::try_parse_from([
            "recovery_cli",
            "analyze",
            "--sample",
            "--sort",
            "profit"
        ])
        .is_err());
    }
}
