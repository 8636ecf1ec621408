use std::sync::Arc;

use {
    paperbot_channels::{AttachmentDownloader, ChannelOutbound, InboundMessage},
    paperbot_config::{ChatConfig, RepositoryConfig},
    paperbot_repository::RepositoryApi,
    tracing::{debug, error, info, warn},
};

#[cfg(feature = "metrics")]
use paperbot_metrics::{commands as command_metrics, counter, labels};

use crate::{
    ReferenceError, Result,
    cache::ResultCache,
    classify::{ClassifiedMessage, classify},
    command::{self, Command, ParseError},
    notify::Notifier,
    pipeline::{DocumentInfo, DocumentPipeline, PipelineRequest},
    render,
};

/// Presentation knobs for the router.
#[derive(Debug, Clone)]
pub struct RouterSettings {
    /// Search results listed per reply.
    pub max_listed_results: usize,
    /// Detail metadata key with `"; "`-separated authors.
    pub author_key: String,
    /// Detail metadata key with the publication year.
    pub year_key: String,
}

impl RouterSettings {
    pub fn from_config(repository: &RepositoryConfig, chat: &ChatConfig) -> Self {
        Self {
            max_listed_results: chat.max_listed_results,
            author_key: repository.author_key.clone(),
            year_key: repository.year_key.clone(),
        }
    }
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self::from_config(&RepositoryConfig::default(), &ChatConfig::default())
    }
}

/// Turns inbound chat messages into repository lookups and document runs.
pub struct Router {
    repository: Arc<dyn RepositoryApi>,
    pipeline: Arc<DocumentPipeline>,
    outbound: Arc<dyn ChannelOutbound>,
    downloader: Arc<dyn AttachmentDownloader>,
    cache: Arc<ResultCache>,
    settings: RouterSettings,
}

impl Router {
    pub fn new(
        repository: Arc<dyn RepositoryApi>,
        pipeline: Arc<DocumentPipeline>,
        outbound: Arc<dyn ChannelOutbound>,
        downloader: Arc<dyn AttachmentDownloader>,
    ) -> Self {
        Self {
            repository,
            pipeline,
            outbound,
            downloader,
            cache: Arc::new(ResultCache::new()),
            settings: RouterSettings::default(),
        }
    }

    pub fn with_cache(mut self, cache: Arc<ResultCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_settings(mut self, settings: RouterSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    /// Handle one message and never fail: anything escaping the handler is
    /// logged and answered with a generic notice.
    pub async fn process(&self, msg: &InboundMessage) {
        if let Err(e) = self.handle_message(msg).await {
            error!(
                conversation = %msg.conversation,
                message_id = %msg.message_id,
                error = ?e,
                "message handler failed"
            );
            #[cfg(feature = "metrics")]
            counter!(command_metrics::HANDLER_FAILURES_TOTAL).increment(1);

            if let Err(e) = self
                .outbound
                .send_text(&msg.conversation, render::GENERIC_FAILURE)
                .await
            {
                warn!(conversation = %msg.conversation, error = %e, "failed to send failure notice");
            }
        }
    }

    pub async fn handle_message(&self, msg: &InboundMessage) -> Result<()> {
        #[cfg(feature = "metrics")]
        counter!(command_metrics::MESSAGES_RECEIVED_TOTAL).increment(1);

        let classified = classify(&msg.content);
        let notifier = Notifier::new(self.outbound.as_ref(), &msg.conversation);

        let command = match command::parse(&classified) {
            None => {
                debug!(conversation = %msg.conversation, "message is not a command");
                return Ok(());
            },
            Some(Err(e)) => return self.usage_error(&notifier, &e).await,
            Some(Ok(command)) => command,
        };

        info!(
            conversation = %msg.conversation,
            sender = msg.sender_name.as_deref().unwrap_or(&msg.sender_id),
            command = command.name(),
            "handling command"
        );
        #[cfg(feature = "metrics")]
        counter!(command_metrics::RECEIVED_TOTAL, labels::COMMAND => command.name()).increment(1);

        match command {
            Command::Ping => Ok(self.outbound.reply_text(msg, render::PONG).await?),
            Command::Help => Ok(notifier.send(render::HELP).await?),
            Command::Search { keyword } => self.search(&notifier, keyword).await,
            Command::Detail { index } => self.detail(&notifier, index).await,
            Command::AnalyzeIndex { index } => self.analyze_index(&notifier, index).await,
            Command::Url { url } => self.url_detail(&notifier, &url).await,
            Command::Download { url } => self.download(&notifier, url).await,
            Command::AnalyzeAttachment => {
                self.analyze_attachment(&notifier, msg, &classified).await
            },
        }
    }

    async fn usage_error(&self, notifier: &Notifier<'_>, err: &ParseError) -> Result<()> {
        debug!(conversation = %notifier.conversation(), usage = err.usage, "malformed command");
        #[cfg(feature = "metrics")]
        counter!(command_metrics::USER_ERRORS_TOTAL).increment(1);
        Ok(notifier.send(&render::usage(err)).await?)
    }

    async fn search(&self, notifier: &Notifier<'_>, keyword: String) -> Result<()> {
        notifier.progress(&render::search_progress(&keyword)).await;

        let results = match self.repository.search(&keyword).await {
            Ok(results) => results,
            Err(e) => {
                warn!(keyword = %keyword, error = ?e, "search failed");
                return Ok(notifier.send(&render::search_failed(&keyword)).await?);
            },
        };

        if results.is_empty() {
            return Ok(notifier.send(&render::no_results(&keyword)).await?);
        }

        let listing = render::search_listing(&results, self.settings.max_listed_results);
        self.cache.put(notifier.conversation().clone(), results);
        Ok(notifier.send(&listing).await?)
    }

    async fn detail(&self, notifier: &Notifier<'_>, index: usize) -> Result<()> {
        let item = match self.cache.resolve_index(notifier.conversation(), index) {
            Ok(item) => item,
            Err(e) => return self.reference_error(notifier, &e).await,
        };

        notifier.progress(&render::detail_progress(&item.title)).await;
        match self.repository.detail(&item.url).await {
            Ok(detail) => {
                let text = render::document_detail(
                    &detail,
                    &self.settings.author_key,
                    &self.settings.year_key,
                );
                Ok(notifier.send(&text).await?)
            },
            Err(e) => {
                warn!(url = %item.url, error = ?e, "detail lookup failed");
                Ok(notifier.send(render::DETAIL_FAILED).await?)
            },
        }
    }

    async fn analyze_index(&self, notifier: &Notifier<'_>, index: usize) -> Result<()> {
        let item = match self.cache.resolve_index(notifier.conversation(), index) {
            Ok(item) => item,
            Err(e) => return self.reference_error(notifier, &e).await,
        };
        let Some(link) = item.primary_download() else {
            return Ok(notifier.send(render::NO_DOWNLOAD_LINK).await?);
        };
        let pdf_url = link.url.clone();

        let mut info = DocumentInfo {
            title: item.title.clone(),
            authors: item.authors.clone(),
            year: item.year.clone(),
            abstract_text: None,
        };
        match self.repository.detail(&item.url).await {
            Ok(detail) => {
                if let Some(authors) = detail.authors(&self.settings.author_key) {
                    info.authors = authors;
                }
                if let Some(year) = detail.year(&self.settings.year_key)
                    && !year.trim().is_empty()
                {
                    info.year = year.to_string();
                }
                if !detail.abstract_text.trim().is_empty() {
                    info.abstract_text = Some(detail.abstract_text);
                }
            },
            Err(e) => {
                warn!(url = %item.url, error = ?e, "detail enrichment failed, using search metadata");
            },
        }

        self.run_pipeline(notifier, PipelineRequest::ByIndex {
            conversation: notifier.conversation().clone(),
            index,
            pdf_url,
            info,
        })
        .await
    }

    async fn url_detail(&self, notifier: &Notifier<'_>, url: &str) -> Result<()> {
        notifier.progress(&render::url_progress(url)).await;

        let detail = match self.repository.detail(url).await {
            Ok(detail) => detail,
            Err(e) => {
                warn!(url, error = ?e, "detail lookup by URL failed");
                return Ok(notifier.send(&render::url_failed(url)).await?);
            },
        };

        let text =
            render::document_detail(&detail, &self.settings.author_key, &self.settings.year_key);
        notifier.send(&text).await?;
        if !detail.download_links.is_empty() {
            notifier.send(render::DOWNLOAD_PROMPT).await?;
        }
        Ok(())
    }

    async fn download(&self, notifier: &Notifier<'_>, url: String) -> Result<()> {
        notifier.progress(&render::download_progress(&url)).await;

        let info = DocumentInfo {
            title: render::title_from_url(&url),
            authors: vec!["Unknown author".into()],
            year: "Unknown year".into(),
            abstract_text: None,
        };
        self.run_pipeline(notifier, PipelineRequest::ByUrl { url, info })
            .await
    }

    async fn analyze_attachment(
        &self,
        notifier: &Notifier<'_>,
        msg: &InboundMessage,
        classified: &ClassifiedMessage,
    ) -> Result<()> {
        let Some(quoted) = classified.quoted_document() else {
            debug!(conversation = %msg.conversation, "no quoted document to analyze");
            return Ok(());
        };

        notifier.progress(render::ATTACHMENT_PROGRESS).await;
        let attachment = match self
            .downloader
            .download(&msg.account_id, &quoted.content)
            .await
        {
            Ok(attachment) if !attachment.data.is_empty() => attachment,
            Ok(_) => {
                warn!(conversation = %msg.conversation, "quoted document downloaded empty");
                return Ok(notifier.send(render::ATTACHMENT_DOWNLOAD_FAILED).await?);
            },
            Err(e) => {
                warn!(conversation = %msg.conversation, error = ?e, "quoted document download failed");
                return Ok(notifier.send(render::ATTACHMENT_DOWNLOAD_FAILED).await?);
            },
        };

        let declared = quoted
            .content
            .document_message
            .as_ref()
            .and_then(|doc| doc.mimetype.clone());
        let mime_type = declared.or(attachment.media_type);

        self.run_pipeline(notifier, PipelineRequest::ByAttachment {
            data: attachment.data,
            mime_type,
        })
        .await
    }

    async fn run_pipeline(&self, notifier: &Notifier<'_>, request: PipelineRequest) -> Result<()> {
        let reply = match self.pipeline.run(request, notifier).await {
            Ok(summary) => summary,
            Err(e) => e.user_message(),
        };
        Ok(notifier.send(&reply).await?)
    }

    async fn reference_error(
        &self,
        notifier: &Notifier<'_>,
        err: &ReferenceError,
    ) -> Result<()> {
        debug!(conversation = %notifier.conversation(), error = %err, "unresolvable reference");
        #[cfg(feature = "metrics")]
        counter!(command_metrics::USER_ERRORS_TOTAL).increment(1);
        Ok(notifier.send(&render::reference_error(err)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_follow_config() {
        let repo = RepositoryConfig {
            author_key: "Author".into(),
            ..RepositoryConfig::default()
        };
        let chat = ChatConfig {
            max_listed_results: 3,
        };
        let settings = RouterSettings::from_config(&repo, &chat);
        assert_eq!(settings.max_listed_results, 3);
        assert_eq!(settings.author_key, "Author");
        assert_eq!(settings.year_key, "Tahun Terbit");
    }
}
