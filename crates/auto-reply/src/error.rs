/// A numeric reference that cannot be resolved against the conversation's
/// last search.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReferenceError {
    #[error("no prior search in this conversation")]
    NoPriorSearch,

    #[error("index {index} is outside 1-{len}")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Failures that escape a message handler. Everything user-facing is turned
/// into a reply before it gets here.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to deliver reply: {0}")]
    Channel(#[from] paperbot_channels::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
