//! Download → extract → truncate → summarize for one document.
//!
//! Every stage either hands its output to the next one or aborts the run with
//! a [`PipelineError`]. The staged PDF lives in a temp file owned by the run,
//! so it is removed whichever way the run ends.

pub mod extract;
pub mod prompt;

use std::{io::Write, path::PathBuf, sync::Arc, time::Instant};

use {
    paperbot_channels::ConversationId,
    paperbot_config::PipelineConfig,
    paperbot_summarizer::Summarizer,
    tracing::{debug, info, warn},
};

#[cfg(feature = "metrics")]
use paperbot_metrics::{counter, histogram, labels, pipeline as pipeline_metrics};

use crate::notify::Notifier;

pub use {
    extract::{ExtractionError, PageSource, PdfDocument, extract_pages, truncate},
    prompt::build_prompt,
};

const PDF_MIME: &str = "application/pdf";

/// What is known about a document before its text is read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentInfo {
    pub title: String,
    pub authors: Vec<String>,
    pub year: String,
    pub abstract_text: Option<String>,
}

impl DocumentInfo {
    pub fn authors_line(&self) -> String {
        if self.authors.is_empty() {
            "No authors".into()
        } else {
            self.authors.join(", ")
        }
    }
}

#[derive(Debug, Clone)]
pub enum PipelineRequest {
    /// A search result picked by its listing number.
    ByIndex {
        conversation: ConversationId,
        index: usize,
        pdf_url: String,
        info: DocumentInfo,
    },
    ByUrl { url: String, info: DocumentInfo },
    /// Bytes already fetched from the chat, with the type the sender declared.
    ByAttachment {
        data: Vec<u8>,
        mime_type: Option<String>,
    },
}

impl PipelineRequest {
    /// Metric/log label for the request origin.
    pub fn source(&self) -> &'static str {
        match self {
            Self::ByIndex { .. } => "index",
            Self::ByUrl { .. } => "url",
            Self::ByAttachment { .. } => "attachment",
        }
    }

    fn info(&self) -> Option<&DocumentInfo> {
        match self {
            Self::ByIndex { info, .. } | Self::ByUrl { info, .. } => Some(info),
            Self::ByAttachment { .. } => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server answered HTTP {0}")]
    Status(u16),

    #[error("response body was empty")]
    Empty,
}

/// Why a run was aborted.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("download failed: {0}")]
    Download(#[from] DownloadError),

    #[error("document is not a PDF (declared type: {mime_type})")]
    NotPdf { mime_type: String },

    #[error("text extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("summarization failed: {0}")]
    Summarizer(#[from] paperbot_summarizer::Error),

    #[error("could not stage the document: {0}")]
    TempFile(#[from] std::io::Error),
}

impl PipelineError {
    /// Stage the run was in when it aborted.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Download(_) | Self::NotPdf { .. } => "download",
            Self::Extraction(_) | Self::TempFile(_) => "extract",
            Self::Summarizer(_) => "summarize",
        }
    }

    /// The one message the user sees for this abort.
    pub fn user_message(&self) -> String {
        use paperbot_summarizer::Error as SummarizerError;

        match self {
            Self::Download(_) => "❌ Failed to download the PDF".into(),
            Self::NotPdf { mime_type } => format!("❌ The document is not a PDF. Type: {mime_type}"),
            Self::Extraction(e) => format!("❌ Failed to extract text from the PDF: {e}"),
            Self::TempFile(e) => format!("❌ Failed to extract text from the PDF: {e}"),
            Self::Summarizer(SummarizerError::NotConfigured) => {
                "❌ Document analysis is not configured.".into()
            },
            Self::Summarizer(SummarizerError::Status { status, .. }) => {
                format!("❌ Gemini API error: status {status}.")
            },
            Self::Summarizer(SummarizerError::MalformedResponse { .. }) => {
                "❌ Gemini API error: could not read the response.".into()
            },
            Self::Summarizer(e) => format!("❌ Error while analyzing the document: {e}"),
        }
    }
}

pub struct DocumentPipeline {
    summarizer: Arc<dyn Summarizer>,
    client: reqwest::Client,
    config: PipelineConfig,
}

impl DocumentPipeline {
    pub fn new(
        summarizer: Arc<dyn Summarizer>,
        config: PipelineConfig,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.download_timeout())
            .build()?;
        Ok(Self {
            summarizer,
            client,
            config,
        })
    }

    /// Run the request to completion. Progress notes go through `notifier`;
    /// the summary or the abort reason is returned for the caller to deliver.
    pub async fn run(
        &self,
        request: PipelineRequest,
        notifier: &Notifier<'_>,
    ) -> Result<String, PipelineError> {
        let source = request.source();
        let start = Instant::now();
        #[cfg(feature = "metrics")]
        counter!(pipeline_metrics::RUNS_TOTAL, labels::SOURCE => source).increment(1);

        let result = self.run_stages(request, notifier).await;

        #[cfg(feature = "metrics")]
        histogram!(pipeline_metrics::RUN_DURATION_SECONDS, labels::SOURCE => source)
            .record(start.elapsed().as_secs_f64());

        match &result {
            Ok(summary) => info!(
                conversation = %notifier.conversation(),
                source,
                chars = summary.chars().count(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "document analysis finished"
            ),
            Err(e) => {
                warn!(
                    conversation = %notifier.conversation(),
                    source,
                    stage = e.stage(),
                    error = ?e,
                    "document analysis aborted"
                );
                #[cfg(feature = "metrics")]
                counter!(pipeline_metrics::ABORTS_TOTAL, labels::STAGE => e.stage()).increment(1);
            },
        }
        result
    }

    async fn run_stages(
        &self,
        request: PipelineRequest,
        notifier: &Notifier<'_>,
    ) -> Result<String, PipelineError> {
        let info = request.info().cloned();

        let bytes = match request {
            PipelineRequest::ByIndex {
                conversation,
                index,
                pdf_url,
                info,
            } => {
                debug!(conversation = %conversation, index, url = %pdf_url, "analyzing search result");
                notifier
                    .progress(&format!("📄 Downloading paper: *{}* ({})", info.title, info.year))
                    .await;
                self.download(&pdf_url).await?
            },
            PipelineRequest::ByUrl { url, info } => {
                notifier
                    .progress(&format!("📄 Downloading paper: *{}* ({})", info.title, info.year))
                    .await;
                self.download(&url).await?
            },
            PipelineRequest::ByAttachment { data, mime_type } => {
                check_pdf_mime(mime_type.as_deref())?;
                if data.is_empty() {
                    return Err(DownloadError::Empty.into());
                }
                data
            },
        };

        notifier.progress("⏳ Extracting text from the PDF...").await;
        let text = self.extract(bytes).await?;
        #[cfg(feature = "metrics")]
        histogram!(pipeline_metrics::EXTRACTED_CHARS).record(text.chars().count() as f64);

        let text = truncate(&text, self.config.max_chars);
        let prompt = build_prompt(info.as_ref(), &text);

        notifier
            .progress("🧠 Analyzing the document with Gemini AI...")
            .await;
        debug!(
            summarizer = self.summarizer.name(),
            prompt_chars = prompt.chars().count(),
            "submitting analysis prompt"
        );
        Ok(self.summarizer.summarize(&prompt).await?)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, DownloadError> {
        info!(url, "downloading document");
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(DownloadError::Status(status.as_u16()));
        }
        let bytes = resp.bytes().await?;
        if bytes.is_empty() {
            return Err(DownloadError::Empty);
        }
        debug!(url, bytes = bytes.len(), "document downloaded");
        Ok(bytes.to_vec())
    }

    /// Stage the bytes in a temp file and read its text off the async runtime.
    async fn extract(&self, bytes: Vec<u8>) -> Result<String, PipelineError> {
        let temp_dir = self.config.temp_dir.clone();
        let max_pages = self.config.max_pages;

        tokio::task::spawn_blocking(move || extract_staged(&bytes, temp_dir, max_pages))
            .await
            .map_err(|e| ExtractionError::Task(e.to_string()))?
    }
}

fn extract_staged(
    bytes: &[u8],
    temp_dir: Option<PathBuf>,
    max_pages: usize,
) -> Result<String, PipelineError> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("paper_").suffix(".pdf");
    let mut file = match temp_dir {
        Some(dir) => builder.tempfile_in(dir)?,
        None => builder.tempfile()?,
    };
    file.write_all(bytes)?;
    file.flush()?;
    debug!(path = %file.path().display(), bytes = bytes.len(), "staged document");

    Ok(extract::extract_pdf_text(file.path(), max_pages)?)
}

fn check_pdf_mime(mime_type: Option<&str>) -> Result<(), PipelineError> {
    match mime_type {
        Some(mime) if mime.trim().eq_ignore_ascii_case(PDF_MIME) => Ok(()),
        other => Err(PipelineError::NotPdf {
            mime_type: other.unwrap_or("unknown").to_string(),
        }),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        async_trait::async_trait,
        paperbot_channels::ChannelOutbound,
        rstest::rstest,
        std::sync::Mutex,
    };

    #[derive(Default)]
    struct RecordingOutbound {
        sent: Mutex<Vec<String>>,
    }

    impl RecordingOutbound {
        fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChannelOutbound for RecordingOutbound {
        async fn send_text(&self, _to: &ConversationId, text: &str) -> paperbot_channels::Result<()> {
            self.sent.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    #[derive(Default)]
    struct EchoSummarizer {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Summarizer for EchoSummarizer {
        fn name(&self) -> &str {
            "echo"
        }

        async fn summarize(&self, prompt: &str) -> paperbot_summarizer::Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok("SUMMARY".into())
        }
    }

    fn pipeline(summarizer: Arc<EchoSummarizer>, temp_dir: Option<PathBuf>) -> DocumentPipeline {
        DocumentPipeline::new(summarizer, PipelineConfig {
            temp_dir,
            ..PipelineConfig::default()
        })
        .unwrap()
    }

    fn info() -> DocumentInfo {
        DocumentInfo {
            title: "Paper".into(),
            authors: vec!["Ahmad".into()],
            year: "2020".into(),
            abstract_text: None,
        }
    }

    fn temp_dir_is_empty(dir: &tempfile::TempDir) -> bool {
        std::fs::read_dir(dir.path()).unwrap().next().is_none()
    }

    #[tokio::test]
    async fn url_request_runs_every_stage() {
        let pdf = extract::test_pdf::build(&[Some("Hello World")]);
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/paper.pdf")
            .with_status(200)
            .with_header("content-type", "application/pdf")
            .with_body(pdf)
            .create_async()
            .await;

        let staging = tempfile::tempdir().unwrap();
        let summarizer = Arc::new(EchoSummarizer::default());
        let pipeline = pipeline(Arc::clone(&summarizer), Some(staging.path().to_path_buf()));
        let outbound = RecordingOutbound::default();
        let chat = ConversationId::from("a@s.whatsapp.net");
        let notifier = Notifier::new(&outbound, &chat);

        let summary = pipeline
            .run(
                PipelineRequest::ByUrl {
                    url: format!("{}/paper.pdf", server.url()),
                    info: info(),
                },
                &notifier,
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(summary, "SUMMARY");
        assert_eq!(outbound.sent(), vec![
            "📄 Downloading paper: *Paper* (2020)".to_string(),
            "⏳ Extracting text from the PDF...".to_string(),
            "🧠 Analyzing the document with Gemini AI...".to_string(),
        ]);

        let prompts = summarizer.prompts.lock().unwrap();
        assert!(prompts[0].contains("Title: Paper"));
        assert!(prompts[0].contains("--- Page 1 ---"));
        assert!(prompts[0].contains("Hello"));
        assert!(temp_dir_is_empty(&staging));
    }

    #[rstest]
    #[case(200, "")]
    #[case(404, "missing")]
    #[tokio::test]
    async fn failed_download_aborts_before_summarizing(#[case] status: usize, #[case] body: &str) {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/paper.pdf")
            .with_status(status)
            .with_body(body)
            .create_async()
            .await;

        let summarizer = Arc::new(EchoSummarizer::default());
        let pipeline = pipeline(Arc::clone(&summarizer), None);
        let outbound = RecordingOutbound::default();
        let chat = ConversationId::from("a@s.whatsapp.net");

        let err = pipeline
            .run(
                PipelineRequest::ByUrl {
                    url: format!("{}/paper.pdf", server.url()),
                    info: info(),
                },
                &Notifier::new(&outbound, &chat),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Download(_)));
        assert_eq!(err.stage(), "download");
        assert_eq!(err.user_message(), "❌ Failed to download the PDF");
        assert!(summarizer.prompts.lock().unwrap().is_empty());
        assert_eq!(outbound.sent().len(), 1);
    }

    #[rstest]
    #[case(Some("application/pdf"), true)]
    #[case(Some("Application/PDF"), true)]
    #[case(Some("image/png"), false)]
    #[case(None, false)]
    fn attachment_mime_must_be_pdf(#[case] mime: Option<&str>, #[case] ok: bool) {
        assert_eq!(check_pdf_mime(mime).is_ok(), ok);
    }

    #[tokio::test]
    async fn non_pdf_attachment_is_rejected_with_its_type() {
        let summarizer = Arc::new(EchoSummarizer::default());
        let pipeline = pipeline(Arc::clone(&summarizer), None);
        let outbound = RecordingOutbound::default();
        let chat = ConversationId::from("a@s.whatsapp.net");

        let err = pipeline
            .run(
                PipelineRequest::ByAttachment {
                    data: b"PNG".to_vec(),
                    mime_type: Some("image/png".into()),
                },
                &Notifier::new(&outbound, &chat),
            )
            .await
            .unwrap_err();

        assert_eq!(err.user_message(), "❌ The document is not a PDF. Type: image/png");
        assert!(outbound.sent().is_empty());
        assert!(summarizer.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unreadable_pdf_aborts_and_cleans_up() {
        let staging = tempfile::tempdir().unwrap();
        let summarizer = Arc::new(EchoSummarizer::default());
        let pipeline = pipeline(Arc::clone(&summarizer), Some(staging.path().to_path_buf()));
        let outbound = RecordingOutbound::default();
        let chat = ConversationId::from("a@s.whatsapp.net");

        let err = pipeline
            .run(
                PipelineRequest::ByAttachment {
                    data: b"%PDF-garbage".to_vec(),
                    mime_type: Some("application/pdf".into()),
                },
                &Notifier::new(&outbound, &chat),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Extraction(_)));
        assert!(err.user_message().starts_with("❌ Failed to extract text from the PDF"));
        assert!(summarizer.prompts.lock().unwrap().is_empty());
        assert!(temp_dir_is_empty(&staging));
    }

    #[tokio::test]
    async fn long_documents_are_truncated_before_the_prompt() {
        let long = "x".repeat(200);
        let pdf = extract::test_pdf::build(&[Some(long.as_str())]);
        let summarizer = Arc::new(EchoSummarizer::default());
        let pipeline = DocumentPipeline::new(
            Arc::clone(&summarizer) as Arc<dyn Summarizer>,
            PipelineConfig {
                max_chars: 50,
                ..PipelineConfig::default()
            },
        )
        .unwrap();
        let outbound = RecordingOutbound::default();
        let chat = ConversationId::from("a@s.whatsapp.net");

        pipeline
            .run(
                PipelineRequest::ByAttachment {
                    data: pdf,
                    mime_type: Some("application/pdf".into()),
                },
                &Notifier::new(&outbound, &chat),
            )
            .await
            .unwrap();

        let prompts = summarizer.prompts.lock().unwrap();
        assert!(prompts[0].ends_with(extract::TRUNCATION_MARKER));
        assert!(prompts[0].starts_with("Analyze this scientific work"));
    }

    #[test]
    fn summarizer_errors_have_short_messages() {
        let err = PipelineError::from(paperbot_summarizer::Error::Status {
            status: 429,
            body: "quota".into(),
        });
        assert_eq!(err.user_message(), "❌ Gemini API error: status 429.");
        assert_eq!(err.stage(), "summarize");

        let err = PipelineError::from(paperbot_summarizer::Error::malformed("no candidates"));
        assert_eq!(
            err.user_message(),
            "❌ Gemini API error: could not read the response."
        );
    }
}
