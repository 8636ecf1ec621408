//! Config schema: repository API, summarizer, document pipeline, transport.

use {
    secrecy::Secret,
    serde::Deserialize,
    std::{path::PathBuf, time::Duration},
};

use crate::{Error, Result};

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PaperbotConfig {
    pub repository: RepositoryConfig,
    pub summarizer: SummarizerConfig,
    pub pipeline: PipelineConfig,
    pub whatsapp: WhatsAppConfig,
    pub chat: ChatConfig,
    pub metrics: MetricsConfig,
}

impl PaperbotConfig {
    /// Reject values that would make the bot misbehave at runtime.
    pub fn validate(&self) -> Result<()> {
        if self.repository.request_timeout_secs == 0 {
            return Err(Error::invalid(
                "repository.request_timeout_secs",
                "must be at least 1",
            ));
        }
        if let Some(url) = &self.repository.base_url
            && !(url.starts_with("http://") || url.starts_with("https://"))
        {
            return Err(Error::invalid(
                "repository.base_url",
                format!("expected an http(s) URL, got {url:?}"),
            ));
        }
        if self.pipeline.max_pages == 0 {
            return Err(Error::invalid("pipeline.max_pages", "must be at least 1"));
        }
        if self.pipeline.max_chars == 0 {
            return Err(Error::invalid("pipeline.max_chars", "must be at least 1"));
        }
        if self.pipeline.download_timeout_secs == 0 {
            return Err(Error::invalid(
                "pipeline.download_timeout_secs",
                "must be at least 1",
            ));
        }
        if self.summarizer.model.trim().is_empty() {
            return Err(Error::invalid("summarizer.model", "must not be empty"));
        }
        if self.chat.max_listed_results == 0 {
            return Err(Error::invalid("chat.max_listed_results", "must be at least 1"));
        }
        if !(self.whatsapp.sidecar_url.starts_with("ws://")
            || self.whatsapp.sidecar_url.starts_with("wss://"))
        {
            return Err(Error::invalid(
                "whatsapp.sidecar_url",
                format!("expected a ws(s) URL, got {:?}", self.whatsapp.sidecar_url),
            ));
        }
        Ok(())
    }
}

/// Document repository search/detail API.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Base URL; `/search` and `/detail` are appended.
    pub base_url: Option<String>,
    pub request_timeout_secs: u64,
    /// Metadata key holding `"; "`-separated author names.
    pub author_key: String,
    /// Metadata key holding the publication year.
    pub year_key: String,
}

impl RepositoryConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            request_timeout_secs: 30,
            author_key: "Penulis".into(),
            year_key: "Tahun Terbit".into(),
        }
    }
}

/// Gemini text generation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    pub api_key: Option<Secret<String>>,
    pub model: String,
    pub base_url: String,
    pub max_output_tokens: u32,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.0-flash".into(),
            base_url: "https://generativelanguage.googleapis.com".into(),
            max_output_tokens: 8192,
        }
    }
}

/// Download → extract → truncate limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub download_timeout_secs: u64,
    /// Only the first `max_pages` pages are extracted.
    pub max_pages: usize,
    /// Extracted text budget in characters.
    pub max_chars: usize,
    /// Where downloaded documents are staged. OS temp dir when unset.
    pub temp_dir: Option<PathBuf>,
}

impl PipelineConfig {
    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            download_timeout_secs: 30,
            max_pages: 10,
            max_chars: 16_000,
            temp_dir: None,
        }
    }
}

/// WhatsApp Web sidecar connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WhatsAppConfig {
    pub account_id: String,
    pub sidecar_url: String,
    /// Session storage handed to the sidecar on login.
    pub auth_dir: Option<PathBuf>,
    pub connect_retries: u32,
    pub request_timeout_secs: u64,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            account_id: "default".into(),
            sidecar_url: "ws://127.0.0.1:9876".into(),
            auth_dir: None,
            connect_retries: 10,
            request_timeout_secs: 60,
        }
    }
}

/// Chat rendering.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Search results listed per reply.
    pub max_listed_results: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_listed_results: 5,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, secrecy::ExposeSecret};

    #[test]
    fn defaults_match_pipeline_limits() {
        let cfg = PaperbotConfig::default();
        assert_eq!(cfg.pipeline.max_pages, 10);
        assert_eq!(cfg.pipeline.max_chars, 16_000);
        assert_eq!(cfg.pipeline.download_timeout(), Duration::from_secs(30));
        assert_eq!(cfg.chat.max_listed_results, 5);
        assert_eq!(cfg.summarizer.model, "gemini-2.0-flash");
        assert_eq!(cfg.repository.author_key, "Penulis");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn deserialize_partial_toml() {
        let cfg: PaperbotConfig = toml::from_str(
            r#"
            [repository]
            base_url = "https://repo.example.ac.id/api"

            [summarizer]
            api_key = "k-123"

            [pipeline]
            max_pages = 3
            "#,
        )
        .unwrap();
        assert_eq!(
            cfg.repository.base_url.as_deref(),
            Some("https://repo.example.ac.id/api")
        );
        assert_eq!(
            cfg.summarizer.api_key.as_ref().unwrap().expose_secret(),
            "k-123"
        );
        assert_eq!(cfg.pipeline.max_pages, 3);
        assert_eq!(cfg.pipeline.max_chars, 16_000);
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let cfg: PaperbotConfig = toml::from_str("[summarizer]\napi_key = \"hunter2\"").unwrap();
        assert!(!format!("{cfg:?}").contains("hunter2"));
    }

    #[test]
    fn validate_rejects_zero_limits() {
        let mut cfg = PaperbotConfig::default();
        cfg.pipeline.max_pages = 0;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("pipeline.max_pages"));

        let mut cfg = PaperbotConfig::default();
        cfg.whatsapp.sidecar_url = "http://localhost".into();
        assert!(cfg.validate().is_err());
    }
}
