use crate::client::error::AnalysisError;
use crate::client::{AnalysisClient, CsvUpload};
use crate::domain::analysis::{AnalysisResult, ClientRecord};
use crate::view::chart::{self, ChartBar};
use crate::view::feedback::{self, DisplayMessage};
use crate::view::kpi::{self, KpiCard, OperationalGoal};
use crate::view::table::{self, Pager, SortKey, SortState, TableView};
use std::path::{Path, PathBuf};

pub const MIN_THRESHOLD_DAYS: u32 = 60;
pub const SAMPLE_FILE_NAME: &str = "sales_recovery_sample.csv";

pub const INVALID_FORMAT_MESSAGE: &str = "Invalid file format. Please select a .CSV file.";
pub const NO_FILE_MESSAGE: &str = "No file selected. Please upload a CSV dataset.";
pub const EMPTY_FILE_MESSAGE: &str = "The selected file is empty. Please choose a CSV with sales data.";
pub const EMPTY_THRESHOLD_MESSAGE: &str = "Inactivity threshold cannot be empty.";
pub const NON_NUMERIC_THRESHOLD_MESSAGE: &str = "Inactivity threshold must be a whole number of days.";
pub const LOW_THRESHOLD_MESSAGE: &str = "Minimum inactivity threshold is 60 days.";
pub const BUSY_MESSAGE: &str = "An analysis is already running.";
pub const SAMPLE_LOAD_MESSAGE: &str =
    "Failed to load sample file. Check if the file is in the public folder.";

/// The bundled sample dataset on disk.
#[derive(Debug, Clone)]
pub struct SampleAsset {
    path: PathBuf,
}

impl SampleAsset {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Result<CsvUpload, AnalysisError> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|err| {
            tracing::warn!(path = %self.path.display(), error = %err, "sample dataset read failed");
            AnalysisError::SampleLoad {
                detail: SAMPLE_LOAD_MESSAGE.to_string(),
            }
        })?;
        Ok(CsvUpload::new(SAMPLE_FILE_NAME, bytes))
    }

    /// Writes the sample next to the user's files; returns bytes written.
    pub async fn copy_to(&self, dest: &Path) -> Result<u64, AnalysisError> {
        tokio::fs::copy(&self.path, dest).await.map_err(|err| {
            tracing::warn!(
                from = %self.path.display(),
                to = %dest.display(),
                error = %err,
                "sample dataset copy failed"
            );
            AnalysisError::SampleLoad {
                detail: format!("Failed to save sample file to {}: {err}", dest.display()),
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Ready,
    Loading,
    Loaded,
}

/// Proof that `begin_submit` passed; hand it back to `complete`.
#[derive(Debug, Clone)]
pub struct RequestTicket {
    generation: u64,
    pub file: CsvUpload,
    pub threshold_days: u32,
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    selected_file: Option<CsvUpload>,
    threshold_input: String,
    results: Option<AnalysisResult>,
    loading: bool,
    started: bool,
    error: Option<AnalysisError>,
    success: bool,
    sort: SortState,
    pager: Pager,
    // Bumped by `remove_file` so a request resolving afterwards is dropped.
    generation: u64,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self {
            selected_file: None,
            threshold_input: MIN_THRESHOLD_DAYS.to_string(),
            results: None,
            loading: false,
            started: false,
            error: None,
            success: false,
            sort: SortState::default(),
            pager: Pager::default(),
            generation: 0,
        }
    }
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        if self.loading {
            Phase::Loading
        } else if self.results.is_some() {
            Phase::Loaded
        } else if self.selected_file.is_some() {
            Phase::Ready
        } else {
            Phase::Idle
        }
    }

    pub fn selected_file(&self) -> Option<&CsvUpload> {
        self.selected_file.as_ref()
    }

    pub fn results(&self) -> Option<&AnalysisResult> {
        self.results.as_ref()
    }

    pub fn error(&self) -> Option<&AnalysisError> {
        self.error.as_ref()
    }

    pub fn succeeded(&self) -> bool {
        self.success
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn threshold_input(&self) -> &str {
        &self.threshold_input
    }

    /// Whether the threshold field should be flagged while typing.
    pub fn threshold_below_minimum(&self) -> bool {
        matches!(self.threshold_input.trim().parse::<i64>(), Ok(days) if days < i64::from(MIN_THRESHOLD_DAYS))
    }

    pub fn can_submit(&self) -> bool {
        self.selected_file.is_some() && !self.loading
    }

    /// Dashboard panels are shown once a run starts and while results exist.
    pub fn dashboard_visible(&self) -> bool {
        self.started || self.results.is_some()
    }

    pub fn shows_guide(&self) -> bool {
        self.selected_file.is_none()
    }

    /// Returns false when the file was rejected.
    pub fn select_file(&mut self, file: CsvUpload) -> bool {
        self.clear_feedback();
        if !file.has_csv_extension() {
            tracing::info!(file_name = %file.file_name, "rejected non-csv selection");
            self.selected_file = None;
            self.error = Some(AnalysisError::validation(INVALID_FORMAT_MESSAGE));
            return false;
        }
        self.selected_file = Some(file);
        true
    }

    pub async fn use_sample(&mut self, sample: &SampleAsset) -> bool {
        self.clear_feedback();
        match sample.load().await {
            Ok(file) => {
                self.selected_file = Some(file);
                true
            }
            Err(err) => {
                self.error = Some(err);
                false
            }
        }
    }

    pub fn set_threshold(&mut self, input: impl Into<String>) {
        self.threshold_input = input.into();
    }

    /// Resets the selection and results. An in-flight request keeps the
    /// dashboard loading until it completes; its outcome is then dropped.
    pub fn remove_file(&mut self) {
        self.selected_file = None;
        self.results = None;
        self.started = false;
        self.clear_feedback();
        self.pager.page = 1;
        self.generation += 1;
    }

    pub fn dismiss_feedback(&mut self) {
        self.clear_feedback();
    }

    fn clear_feedback(&mut self) {
        self.error = None;
        self.success = false;
    }

    fn reject(&mut self, message: &str) -> AnalysisError {
        let err = AnalysisError::validation(message);
        self.error = Some(err.clone());
        err
    }

    /// Pre-flight checks, first failure wins. On success the run is marked as started.
    pub fn begin_submit(&mut self) -> Result<RequestTicket, AnalysisError> {
        if self.loading {
            return Err(AnalysisError::validation(BUSY_MESSAGE));
        }
        self.clear_feedback();

        let Some(file) = self.selected_file.clone() else {
            return Err(self.reject(NO_FILE_MESSAGE));
        };
        if file.is_empty() {
            return Err(self.reject(EMPTY_FILE_MESSAGE));
        }

        let raw = self.threshold_input.trim().to_string();
        if raw.is_empty() {
            return Err(self.reject(EMPTY_THRESHOLD_MESSAGE));
        }
        let threshold_days = match raw.parse::<i64>() {
            Ok(days) if days < i64::from(MIN_THRESHOLD_DAYS) => {
                return Err(self.reject(LOW_THRESHOLD_MESSAGE));
            }
            Ok(days) => match u32::try_from(days) {
                Ok(days) => days,
                Err(_) => return Err(self.reject(NON_NUMERIC_THRESHOLD_MESSAGE)),
            },
            Err(_) => return Err(self.reject(NON_NUMERIC_THRESHOLD_MESSAGE)),
        };

        self.loading = true;
        self.started = true;
        self.results = None;
        self.pager.page = 1;

        Ok(RequestTicket {
            generation: self.generation,
            file,
            threshold_days,
        })
    }

    /// Applies a finished request. Returns false when the ticket is stale.
    pub fn complete(
        &mut self,
        ticket: RequestTicket,
        outcome: Result<AnalysisResult, AnalysisError>,
    ) -> bool {
        self.loading = false;
        if ticket.generation != self.generation {
            tracing::info!(
                file_name = %ticket.file.file_name,
                "dropping analysis result for a removed file"
            );
            return false;
        }

        match outcome {
            Ok(result) => {
                tracing::info!(
                    clients = result.recovery_focus_list.len(),
                    churned = result.summary.churned_clients_total,
                    "analysis loaded"
                );
                self.results = Some(result);
                self.success = true;
            }
            Err(err) => {
                tracing::warn!(error = %err, "analysis failed");
                self.started = false;
                self.results = None;
                self.error = Some(err);
            }
        }
        true
    }

    /// Validate, call the service once, apply the outcome. Returns true when results loaded.
    pub async fn submit(&mut self, client: &dyn AnalysisClient) -> bool {
        let ticket = match self.begin_submit() {
            Ok(ticket) => ticket,
            Err(_) => return false,
        };
        let outcome = client.submit(&ticket.file, ticket.threshold_days).await;
        self.complete(ticket, outcome) && self.results.is_some()
    }

    pub fn sort(&self) -> SortState {
        self.sort
    }

    pub fn request_sort(&mut self, key: SortKey) {
        self.sort = self.sort.request(key);
    }

    pub fn set_sort(&mut self, sort: SortState) {
        self.sort = sort;
    }

    pub fn pager(&self) -> Pager {
        self.pager
    }

    pub fn set_page_size(&mut self, page_size: usize) -> anyhow::Result<()> {
        self.pager.set_page_size(page_size)
    }

    pub fn go_to_page(&mut self, page: usize) {
        let count = self.client_count();
        self.pager.go_to(page, count);
    }

    pub fn next_page(&mut self) {
        let count = self.client_count();
        self.pager.next(count);
    }

    pub fn previous_page(&mut self) {
        let count = self.client_count();
        self.pager.previous(count);
    }

    fn client_count(&self) -> usize {
        self.results
            .as_ref()
            .map_or(0, |r| r.recovery_focus_list.len())
    }

    pub fn feedback(&self) -> Option<DisplayMessage> {
        feedback::describe(self.error.as_ref(), self.success)
    }

    pub fn kpis(&self) -> [KpiCard; 3] {
        kpi::project_kpis(self.results.as_ref().map(|r| &r.summary))
    }

    pub fn operational_goal(&self) -> OperationalGoal {
        kpi::operational_goal(self.results.as_ref().map(|r| &r.summary))
    }

    pub fn chart(&self) -> Vec<ChartBar> {
        chart::project(self.clients())
    }

    pub fn table(&self) -> TableView {
        table::project(self.clients(), self.sort, self.pager)
    }

    fn clients(&self) -> &[ClientRecord] {
        self.results
            .as_ref()
            .map_or(&[], |r| r.recovery_focus_list.as_slice())
    }
}
