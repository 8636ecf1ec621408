use {
    async_trait::async_trait,
    serde::{Deserialize, Serialize},
    std::fmt,
    tokio::sync::mpsc,
};

use crate::{Result, message::MessageContent};

/// Identifier of a chat (WhatsApp JID such as `6281234@s.whatsapp.net`).
///
/// Compared by value so it survives round-trips through the wire protocol
/// and can key per-conversation state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConversationId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ConversationId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A message received on a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub account_id: String,
    pub message_id: String,
    /// Chat the message was posted in; replies go here.
    pub conversation: ConversationId,
    pub sender_id: String,
    pub sender_name: Option<String>,
    pub content: MessageContent,
    pub timestamp: i64,
}

/// Events emitted by a transport.
#[derive(Debug, Clone)]
pub enum ChannelEvent {
    /// The account finished logging in and can send messages.
    Connected { account_id: String },
    /// The account lost its connection.
    Disconnected { account_id: String, reason: String },
    /// A message arrived from another party.
    IncomingMessage(InboundMessage),
}

/// Receiver end of a transport's event stream.
pub type EventReceiver = mpsc::Receiver<ChannelEvent>;

/// Sender end of a transport's event stream.
pub type EventSender = mpsc::Sender<ChannelEvent>;

/// Downloaded media bytes plus the type the sender declared.
#[derive(Debug, Clone)]
pub struct ChannelAttachment {
    pub media_type: Option<String>,
    pub data: Vec<u8>,
}

/// Send messages back to a conversation.
#[async_trait]
pub trait ChannelOutbound: Send + Sync {
    /// Post `text` as a new message in `to`.
    async fn send_text(&self, to: &ConversationId, text: &str) -> Result<()>;

    /// Post `text` quoting `original`. Transports without reply support fall
    /// back to a plain send.
    async fn reply_text(&self, original: &InboundMessage, text: &str) -> Result<()> {
        self.send_text(&original.conversation, text).await
    }
}

/// Fetch the media referenced by a message.
#[async_trait]
pub trait AttachmentDownloader: Send + Sync {
    async fn download(&self, account_id: &str, content: &MessageContent)
    -> Result<ChannelAttachment>;
}
