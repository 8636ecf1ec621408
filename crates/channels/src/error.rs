use std::error::Error as StdError;

/// Result of a transport call.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures of a chat transport, as seen by the command handlers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The transport refused to build a frame from the given input.
    #[error("invalid transport input: {message}")]
    InvalidInput { message: String },

    /// No live connection to the transport.
    #[error("transport unavailable: {message}")]
    Unavailable { message: String },

    #[error("no answer from the transport for {operation}")]
    Timeout { operation: String },

    /// The transport answered with a failure result.
    #[error("transport rejected {operation}: {reason}")]
    Rejected { operation: String, reason: String },

    #[error("{context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// A frame could not be encoded or decoded.
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

impl Error {
    #[must_use]
    pub fn invalid_input(message: impl std::fmt::Display) -> Self {
        Self::InvalidInput {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn unavailable(message: impl std::fmt::Display) -> Self {
        Self::Unavailable {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }

    #[must_use]
    pub fn rejected(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Rejected {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn external(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }
}
