//! Text summarization backends.

pub mod error;
pub mod gemini;

use async_trait::async_trait;

pub use {
    error::{Error, Result},
    gemini::GeminiSummarizer,
};

/// Turns one prompt into one generated text.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &str;

    /// Submit `prompt` as a single request and return the generated text.
    async fn summarize(&self, prompt: &str) -> Result<String>;
}
