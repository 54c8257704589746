pub mod client;
pub mod dashboard;
pub mod domain;
pub mod render;
pub mod time;
pub mod view;

pub mod config {
    use std::path::PathBuf;

    pub const DEFAULT_ANALYSIS_API_URL: &str = "http://localhost:8000";
    pub const DEFAULT_ANALYSIS_TIMEOUT_SECS: u64 = 120;
    pub const DEFAULT_HEARTBEAT_INTERVAL_SECS: u64 = 10;
    pub const DEFAULT_SAMPLE_CSV_PATH: &str = "assets/sales_recovery_sample.csv";

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub analysis_api_url: String,
        pub analysis_timeout_secs: u64,
        pub heartbeat_interval_secs: u64,
        pub sample_csv_path: PathBuf,
        pub sentry_dsn: Option<String>,
    }

    impl Default for Settings {
        fn default() -> Self {
            Self {
                analysis_api_url: DEFAULT_ANALYSIS_API_URL.to_string(),
                analysis_timeout_secs: DEFAULT_ANALYSIS_TIMEOUT_SECS,
                heartbeat_interval_secs: DEFAULT_HEARTBEAT_INTERVAL_SECS,
                sample_csv_path: PathBuf::from(DEFAULT_SAMPLE_CSV_PATH),
                sentry_dsn: None,
            }
        }
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Self::from_lookup(|key| std::env::var(key).ok())
        }

        pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
            let defaults = Self::default();
            let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
            let positive = |key: &str, default: u64| {
                non_empty(key)
                    .and_then(|s| s.trim().parse::<u64>().ok())
                    .filter(|v| *v > 0)
                    .unwrap_or(default)
            };

            let analysis_api_url = non_empty("ANALYSIS_API_URL")
                .map(|s| s.trim().trim_end_matches('/').to_string())
                .unwrap_or(defaults.analysis_api_url);
            anyhow::ensure!(
                analysis_api_url.starts_with("http://") || analysis_api_url.starts_with("https://"),
                "ANALYSIS_API_URL must be an http(s) URL (got {analysis_api_url})"
            );

            Ok(Self {
                analysis_api_url,
                analysis_timeout_secs: positive(
                    "ANALYSIS_TIMEOUT_SECS",
                    defaults.analysis_timeout_secs,
                ),
                heartbeat_interval_secs: positive(
                    "HEARTBEAT_INTERVAL_SECS",
                    defaults.heartbeat_interval_secs,
                ),
                sample_csv_path: non_empty("SAMPLE_CSV_PATH")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.sample_csv_path),
                sentry_dsn: non_empty("SENTRY_DSN"),
            })
        }
    }

}

#[cfg(test)]
pub(crate) mod test_support {
    use serde_json::{json, Value};

    pub async fn spawn_server(app: axum::Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    /// `n` clients with strictly decreasing revenue, in backend rank order.
    pub fn sample_result_json(n: usize) -> Value {
        let clients: Vec<Value> = (0..n)
            .map(|i| {
                json!({
                    "Cliente": format!("Client {i:02}"),
                    "CNPJ/CPF": format!("000.000.000-{i:02}"),
                    "last_purchase_date": "2024-01-15",
                    "days_since_last_purchase": 90 + i,
                    "average_ticket_value": 100.0 + i as f64,
                    "total_revenue": 10_000.0 - (i as f64) * 100.0,
                    "purchase_history": ["2023-09-01", "2023-11-10", "2024-01-15"],
                })
            })
            .collect();

        json!({
            "summary": {
                "recovery_potential_value": 42_000.5,
                "churned_clients_total": n,
                "global_average_ticket": 180.75,
                "suggested_daily_calls": (n as u64).div_ceil(22),
            },
            "recovery_focus_list": clients,
        })
    }
}
