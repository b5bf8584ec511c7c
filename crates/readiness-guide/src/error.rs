use thiserror::Error;

#[derive(Debug, Error)]
pub enum GuideError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("failed to parse completion response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("guidance backend not configured: {0}")]
    NotConfigured(String),

    #[error("completion response contained no text")]
    EmptyResponse,
}
