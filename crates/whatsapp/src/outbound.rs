use std::sync::Arc;

use {
    async_trait::async_trait,
    base64::Engine,
    paperbot_channels::{
        AttachmentDownloader, ChannelAttachment, ChannelOutbound, ConversationId, Error,
        InboundMessage, MessageContent, Result,
    },
    tokio::sync::RwLock,
    tracing::{debug, warn},
};

#[cfg(feature = "metrics")]
use paperbot_metrics::{counter, whatsapp as wa_metrics};

use crate::{
    sidecar::SidecarHandle,
    types::{GatewayMessage, SidecarMessage},
};

/// Sends and downloads through whichever sidecar connection is current.
#[derive(Clone)]
pub struct WhatsAppOutbound {
    account_id: String,
    sidecar: Arc<RwLock<Option<SidecarHandle>>>,
}

impl WhatsAppOutbound {
    pub fn new(account_id: impl Into<String>, sidecar: Arc<RwLock<Option<SidecarHandle>>>) -> Self {
        Self {
            account_id: account_id.into(),
            sidecar,
        }
    }

    async fn handle(&self) -> Result<SidecarHandle> {
        self.sidecar
            .read()
            .await
            .clone()
            .ok_or_else(|| Error::unavailable("whatsapp sidecar is not connected"))
    }

    async fn send(&self, to: &str, text: &str, quoted_message_id: Option<String>) -> Result<()> {
        let handle = self.handle().await?;
        let request_id = uuid::Uuid::new_v4().to_string();
        debug!(request_id, to, chars = text.chars().count(), "sending whatsapp text");

        let reply = handle
            .request(GatewayMessage::SendText {
                request_id,
                account_id: self.account_id.clone(),
                to: to.to_string(),
                text: text.to_string(),
                quoted_message_id,
            })
            .await;

        let result = match reply {
            Ok(SidecarMessage::SendResult { success: true, .. }) => Ok(()),
            Ok(SidecarMessage::SendResult { error, .. }) => Err(Error::rejected(
                "send_text",
                error.unwrap_or_else(|| "unknown error".into()),
            )),
            Ok(other) => Err(Error::rejected(
                "send_text",
                format!("unexpected reply {other:?}"),
            )),
            Err(e) => Err(e),
        };

        #[cfg(feature = "metrics")]
        match &result {
            Ok(()) => counter!(wa_metrics::MESSAGES_SENT_TOTAL).increment(1),
            Err(_) => counter!(wa_metrics::SEND_ERRORS_TOTAL).increment(1),
        }

        if let Err(e) = &result {
            warn!(to, error = %e, "whatsapp send failed");
        }
        result
    }
}

#[async_trait]
impl ChannelOutbound for WhatsAppOutbound {
    async fn send_text(&self, to: &ConversationId, text: &str) -> Result<()> {
        self.send(to.as_str(), text, None).await
    }

    async fn reply_text(&self, original: &InboundMessage, text: &str) -> Result<()> {
        self.send(
            original.conversation.as_str(),
            text,
            Some(original.message_id.clone()),
        )
        .await
    }
}

#[async_trait]
impl AttachmentDownloader for WhatsAppOutbound {
    async fn download(
        &self,
        account_id: &str,
        content: &MessageContent,
    ) -> Result<ChannelAttachment> {
        let handle = self.handle().await?;
        let request_id = uuid::Uuid::new_v4().to_string();
        debug!(request_id, account_id, "requesting media download");

        let reply = handle
            .request(GatewayMessage::DownloadMedia {
                request_id,
                account_id: account_id.to_string(),
                message: content.clone(),
            })
            .await?;

        #[cfg(feature = "metrics")]
        counter!(wa_metrics::MEDIA_DOWNLOADS_TOTAL).increment(1);

        match reply {
            SidecarMessage::MediaResult {
                success: true,
                data: Some(data),
                mime_type,
                ..
            } => {
                let bytes = base64::engine::general_purpose::STANDARD
                    .decode(data.as_bytes())
                    .map_err(|e| Error::external("decode media payload", e))?;
                Ok(ChannelAttachment {
                    media_type: mime_type,
                    data: bytes,
                })
            },
            SidecarMessage::MediaResult { error, .. } => Err(Error::rejected(
                "download_media",
                error.unwrap_or_else(|| "no media data returned".into()),
            )),
            other => Err(Error::rejected(
                "download_media",
                format!("unexpected reply {other:?}"),
            )),
        }
    }
}
