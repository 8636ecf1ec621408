//! Message text and quoted-media classification.

use {
    paperbot_channels::{MediaKind, MessageContent},
    tracing::debug,
};

/// The message a reply points at.
#[derive(Debug, Clone, PartialEq)]
pub struct QuotedMessage {
    pub kind: MediaKind,
    pub stanza_id: Option<String>,
    pub content: MessageContent,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedMessage {
    /// Message text; empty when the message carries none.
    pub text: String,
    pub quoted: Option<QuotedMessage>,
}

impl ClassifiedMessage {
    /// Kind of the quoted content, `None` when nothing is quoted or the
    /// quoted shape is not one we recognise.
    pub fn quoted_kind(&self) -> Option<MediaKind> {
        self.quoted
            .as_ref()
            .map(|q| q.kind)
            .filter(|kind| *kind != MediaKind::Unknown)
    }

    /// The quoted message, if it is a document.
    pub fn quoted_document(&self) -> Option<&QuotedMessage> {
        self.quoted
            .as_ref()
            .filter(|q| q.kind == MediaKind::Document)
    }
}

pub fn classify(content: &MessageContent) -> ClassifiedMessage {
    let quoted = content.quoted().map(|quoted| {
        let kind = media_kind(quoted);
        if kind == MediaKind::Unknown {
            debug!("quoted message has no recognised media shape");
        }
        QuotedMessage {
            kind,
            stanza_id: content
                .extended_text_message
                .as_ref()
                .and_then(|ext| ext.context_info.as_ref())
                .and_then(|ctx| ctx.stanza_id.clone()),
            content: quoted.clone(),
        }
    });

    ClassifiedMessage {
        text: message_text(content).to_string(),
        quoted,
    }
}

fn message_text(content: &MessageContent) -> &str {
    content
        .conversation
        .as_deref()
        .filter(|t| !t.is_empty())
        .or_else(|| {
            content
                .extended_text_message
                .as_ref()
                .and_then(|ext| ext.text.as_deref())
        })
        .unwrap_or_default()
}

/// Probe the structural shape of `content` against the known media kinds.
pub fn media_kind(content: &MessageContent) -> MediaKind {
    if content.video_message.is_some() {
        MediaKind::Video
    } else if content.audio_message.is_some() {
        MediaKind::Audio
    } else if content.image_message.is_some() {
        MediaKind::Image
    } else if content.document_message.is_some() {
        MediaKind::Document
    } else {
        MediaKind::Unknown
    }
}
