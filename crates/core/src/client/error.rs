use std::fmt;

pub const BACKEND_FALLBACK_DETAIL: &str = "Analysis Error: Failed to process sales data.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Transport,
    Backend,
    Schema,
    SampleLoad,
}

/// Every way an analysis round-trip can fail, in the shape the dashboard shows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// Rejected before any request was made.
    Validation { detail: String },
    /// The request never produced a readable response.
    Transport { detail: String },
    /// Non-2xx from the service; `detail` is its `detail` field or the fallback.
    Backend { status: u16, detail: String },
    /// 2xx whose body does not decode into an analysis result.
    Schema { detail: String },
    /// The bundled sample dataset could not be read.
    SampleLoad { detail: String },
}

impl AnalysisError {
    pub fn validation(detail: impl Into<String>) -> Self {
        Self::Validation {
            detail: detail.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::Backend { .. } => ErrorKind::Backend,
            Self::Schema { .. } => ErrorKind::Schema,
            Self::SampleLoad { .. } => ErrorKind::SampleLoad,
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            Self::Validation { detail }
            | Self::Transport { detail }
            | Self::Backend { detail, .. }
            | Self::Schema { detail }
            | Self::SampleLoad { detail } => detail,
        }
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation { detail } => write!(f, "{detail}"),
            Self::Transport { detail } => write!(f, "analysis request failed: {detail}"),
            Self::Backend { status, detail } => {
                write!(f, "analysis service error (status={status}): {detail}")
            }
            Self::Schema { detail } => write!(f, "unexpected analysis response: {detail}"),
            Self::SampleLoad { detail } => write!(f, "sample dataset unavailable: {detail}"),
        }
    }
}

impl std::error::Error for AnalysisError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_is_the_raw_message() {
        let err = AnalysisError::Backend {
            status: 422,
            detail: "No columns to parse from file".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::Backend);
        assert_eq!(err.detail(), "No columns to parse from file");
        assert!(err.to_string().contains("status=422"));
    }

    #[test]
    fn survives_anyhow_round_trip() {
        let err: anyhow::Error = AnalysisError::validation("bad input").into();
        let back = err.downcast_ref::<AnalysisError>().unwrap();
        assert_eq!(back.kind(), ErrorKind::Validation);
    }
}
