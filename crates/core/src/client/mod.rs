pub mod error;
pub mod heartbeat;
pub mod http;

use crate::domain::analysis::AnalysisResult;
use crate::client::error::AnalysisError;

/// A CSV file picked by the user, held in memory until submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl CsvUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub fn has_csv_extension(&self) -> bool {
        self.file_name.to_lowercase().ends_with(".csv")
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[async_trait::async_trait]
pub trait AnalysisClient: Send + Sync {
    /// Submits one upload for analysis. Exactly one attempt, no retry.
    async fn submit(
        &self,
        file: &CsvUpload,
        threshold_days: u32,
    ) -> Result<AnalysisResult, AnalysisError>;
}
