use crate::client::error::AnalysisError;

pub const EMPTY_OR_MALFORMED_MESSAGE: &str =
    "The file is empty or formatted incorrectly. Please check your CSV content.";
pub const ENCODING_MESSAGE: &str =
    "Encoding error detected. Please ensure the file is saved as UTF-8 or Latin-1.";
pub const MISSING_COLUMNS_MESSAGE: &str = "Required columns missing. Ensure your CSV has: \
     'Cliente', 'Valor', 'Data da Emissão', 'Pedido' and 'CNPJ/CPF'.";
pub const UNEXPECTED_MESSAGE: &str = "An unexpected error occurred during analysis.";
pub const SUCCESS_MESSAGE: &str = "Analysis completed successfully!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackCode {
    EmptyOrMalformed,
    Encoding,
    MissingColumns,
    Validation,
    Transport,
    Schema,
    SampleLoad,
    Backend,
    Success,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Error,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayMessage {
    pub code: FeedbackCode,
    pub tone: Tone,
    pub text: String,
}

impl DisplayMessage {
    fn error(code: FeedbackCode, text: impl Into<String>) -> Self {
        Self {
            code,
            tone: Tone::Error,
            text: text.into(),
        }
    }
}

/// Banner for the current feedback state. An error always wins over success.
pub fn describe(error: Option<&AnalysisError>, success: bool) -> Option<DisplayMessage> {
    match error {
        Some(err) => Some(describe_error(err)),
        None if success => Some(DisplayMessage {
            code: FeedbackCode::Success,
            tone: Tone::Success,
            text: SUCCESS_MESSAGE.to_string(),
        }),
        None => None,
    }
}

pub fn describe_error(err: &AnalysisError) -> DisplayMessage {
    let code = match err {
        AnalysisError::Backend { detail, .. } => {
            if let Some((code, text)) = classify_backend_detail(detail) {
                return DisplayMessage::error(code, text);
            }
            FeedbackCode::Backend
        }
        AnalysisError::Validation { .. } => FeedbackCode::Validation,
        AnalysisError::Transport { .. } => FeedbackCode::Transport,
        AnalysisError::Schema { .. } => FeedbackCode::Schema,
        AnalysisError::SampleLoad { .. } => FeedbackCode::SampleLoad,
    };

    let detail = err.detail().trim();
    if detail.is_empty() {
        DisplayMessage::error(code, UNEXPECTED_MESSAGE)
    } else {
        DisplayMessage::error(code, detail)
    }
}

/// Known service failure phrases, first match wins.
pub fn classify_backend_detail(detail: &str) -> Option<(FeedbackCode, &'static str)> {
    if detail.contains("No columns to parse") {
        return Some((FeedbackCode::EmptyOrMalformed, EMPTY_OR_MALFORMED_MESSAGE));
    }
    if detail.contains("encoding") {
        return Some((FeedbackCode::Encoding, ENCODING_MESSAGE));
    }
    if detail.contains("column") || detail.contains("not found") {
        return Some((FeedbackCode::MissingColumns, MISSING_COLUMNS_MESSAGE));
    }
    None
}
