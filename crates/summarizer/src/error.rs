#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("summarizer API key is not configured")]
    NotConfigured,

    #[error("summarizer request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("summarizer API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected summarizer response: {reason}")]
    MalformedResponse { reason: String },
}

impl Error {
    #[must_use]
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
