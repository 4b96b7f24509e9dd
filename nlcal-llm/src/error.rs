use nlcal_core::ExtractionFailure;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("model returned no generated text")]
    EmptyResponse,
}

impl From<LlmError> for ExtractionFailure {
    fn from(e: LlmError) -> Self {
        ExtractionFailure::Model(e.to_string())
    }
}
