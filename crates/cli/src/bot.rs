//! Service wiring for `paperbot run`.

use std::{sync::Arc, time::Duration};

use {
    anyhow::Result,
    paperbot_auto_reply::{DocumentPipeline, Router, RouterSettings},
    paperbot_channels::{AttachmentDownloader, ChannelEvent, ChannelOutbound},
    paperbot_config::{PaperbotConfig, RepositoryConfig, SummarizerConfig},
    paperbot_metrics::{MetricsRecorderConfig, init_metrics},
    paperbot_repository::{RepositoryApi, RepositoryClient, UnconfiguredRepository},
    paperbot_summarizer::{GeminiSummarizer, Summarizer},
    paperbot_whatsapp::{WhatsAppChannel, WhatsAppOptions},
    tokio::sync::mpsc,
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
};

/// Inbound events buffered between the transport and the dispatcher.
const EVENT_BUFFER: usize = 256;

/// Upper bound for one summarization request.
const SUMMARIZER_TIMEOUT: Duration = Duration::from_secs(120);

pub fn build_repository(config: &RepositoryConfig) -> Result<Arc<dyn RepositoryApi>> {
    match &config.base_url {
        Some(url) => {
            info!(url = %url, "repository API configured");
            Ok(Arc::new(RepositoryClient::new(
                url.clone(),
                config.request_timeout(),
            )?))
        },
        None => {
            warn!("repository.base_url is not set; search and detail commands will fail");
            Ok(Arc::new(UnconfiguredRepository))
        },
    }
}

pub fn build_summarizer(config: &SummarizerConfig) -> Result<Arc<dyn Summarizer>> {
    if config.api_key.is_none() {
        warn!("summarizer.api_key is not set; document analysis will fail");
    }
    let summarizer = GeminiSummarizer::new(config.api_key.clone(), config.model.clone())
        .with_base_url(config.base_url.clone())
        .with_max_output_tokens(config.max_output_tokens)
        .with_timeout(SUMMARIZER_TIMEOUT)?;
    info!(model = summarizer.model(), "summarizer configured");
    Ok(Arc::new(summarizer))
}

pub async fn run(config: PaperbotConfig) -> Result<()> {
    let metrics = init_metrics(MetricsRecorderConfig {
        enabled: config.metrics.enabled,
        global_labels: vec![("account".into(), config.whatsapp.account_id.clone())],
    })?;

    let repository = build_repository(&config.repository)?;
    let summarizer = build_summarizer(&config.summarizer)?;
    let pipeline = Arc::new(DocumentPipeline::new(summarizer, config.pipeline.clone())?);

    let channel = Arc::new(WhatsAppChannel::new(WhatsAppOptions {
        account_id: config.whatsapp.account_id.clone(),
        sidecar_url: config.whatsapp.sidecar_url.clone(),
        auth_dir: config.whatsapp.auth_dir.clone(),
        connect_retries: config.whatsapp.connect_retries,
        request_timeout: Duration::from_secs(config.whatsapp.request_timeout_secs),
    }));
    let outbound = Arc::new(channel.outbound());

    let router = Arc::new(
        Router::new(
            repository,
            pipeline,
            Arc::clone(&outbound) as Arc<dyn ChannelOutbound>,
            outbound as Arc<dyn AttachmentDownloader>,
        )
        .with_settings(RouterSettings::from_config(&config.repository, &config.chat)),
    );

    let (events_tx, mut events_rx) = mpsc::channel(EVENT_BUFFER);
    let shutdown = CancellationToken::new();

    let transport = {
        let channel = Arc::clone(&channel);
        let shutdown = shutdown.clone();
        tokio::spawn(async move { channel.run(events_tx, shutdown).await })
    };

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutdown requested");
                shutdown.cancel();
            }
        });
    }

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            event = events_rx.recv() => match event {
                Some(ChannelEvent::Connected { account_id }) => {
                    info!(account_id = %account_id, "whatsapp connected, ready for commands");
                },
                Some(ChannelEvent::Disconnected { account_id, reason }) => {
                    warn!(account_id = %account_id, reason = %reason, "whatsapp disconnected");
                },
                Some(ChannelEvent::IncomingMessage(msg)) => {
                    let router = Arc::clone(&router);
                    tokio::spawn(async move { router.process(&msg).await });
                },
                None => break,
            },
        }
    }

    shutdown.cancel();
    transport.await??;

    if config.metrics.enabled {
        debug!(metrics = %metrics.render(), "final metrics snapshot");
    }
    info!("paperbot stopped");
    Ok(())
}
