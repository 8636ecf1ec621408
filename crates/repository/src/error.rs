#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No base URL configured.
    #[error("repository API is not configured")]
    NotConfigured,

    /// Connection, timeout or body read failure.
    #[error("repository request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-200 HTTP status.
    #[error("repository API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// HTTP 200 but `status` was not `success`.
    #[error("repository API error: {message}")]
    Api { message: String },

    /// Response body did not match the expected shape.
    #[error("malformed repository response: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
