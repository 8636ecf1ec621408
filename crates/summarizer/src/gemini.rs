use std::time::Duration;

use {
    async_trait::async_trait,
    secrecy::{ExposeSecret, Secret},
    tracing::{debug, trace, warn},
};

#[cfg(feature = "metrics")]
use paperbot_metrics::{counter, histogram, labels, summarizer as sum_metrics};

use crate::{Error, Result, Summarizer};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Gemini `generateContent` client.
pub struct GeminiSummarizer {
    api_key: Option<Secret<String>>,
    model: String,
    base_url: String,
    max_output_tokens: u32,
    client: reqwest::Client,
}

impl GeminiSummarizer {
    /// Requests fail with [`Error::NotConfigured`] while `api_key` is `None`.
    pub fn new(api_key: Option<Secret<String>>, model: impl Into<String>) -> Self {
        Self {
            api_key,
            model: model.into(),
            base_url: DEFAULT_BASE_URL.into(),
            max_output_tokens: 8192,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = tokens;
        self
    }

    /// Analysis of a long document can take a while; default is no timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let api_key = self.api_key.as_ref().ok_or(Error::NotConfigured)?;

        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "maxOutputTokens": self.max_output_tokens },
        });

        debug!(
            model = %self.model,
            prompt_chars = prompt.chars().count(),
            "gemini generateContent request"
        );

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let http_resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key.expose_secret())
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = http_resp.status();
        let text = http_resp.text().await?;
        if !status.is_success() {
            warn!(status = %status, body = %text, "gemini API error");
            return Err(Error::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let resp: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| Error::malformed(format!("invalid JSON: {e}")))?;
        trace!(response = %resp, "gemini raw response");

        extract_candidate_text(&resp)
    }
}

/// Concatenate the text parts of the first candidate.
fn extract_candidate_text(resp: &serde_json::Value) -> Result<String> {
    let parts = resp["candidates"][0]["content"]["parts"]
        .as_array()
        .ok_or_else(|| {
            let reason = resp["promptFeedback"]["blockReason"]
                .as_str()
                .map(|r| format!("prompt blocked: {r}"))
                .unwrap_or_else(|| "missing candidates[0].content.parts".to_string());
            Error::malformed(reason)
        })?;

    let texts: Vec<&str> = parts.iter().filter_map(|p| p["text"].as_str()).collect();
    if texts.is_empty() {
        return Err(Error::malformed("candidate has no text parts"));
    }
    Ok(texts.join(""))
}

#[async_trait]
impl Summarizer for GeminiSummarizer {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn summarize(&self, prompt: &str) -> Result<String> {
        #[cfg(feature = "metrics")]
        let start = std::time::Instant::now();
        #[cfg(feature = "metrics")]
        counter!(sum_metrics::REQUESTS_TOTAL, labels::MODEL => self.model.clone()).increment(1);

        let result = self.generate(prompt).await;

        #[cfg(feature = "metrics")]
        {
            histogram!(sum_metrics::REQUEST_DURATION_SECONDS, labels::MODEL => self.model.clone())
                .record(start.elapsed().as_secs_f64());
            if result.is_err() {
                counter!(sum_metrics::ERRORS_TOTAL, labels::MODEL => self.model.clone())
                    .increment(1);
            }
        }

        result
    }
}
