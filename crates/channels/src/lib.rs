//! Channel abstractions shared by transports and the command pipeline.
//!
//! A transport (e.g. the WhatsApp Web sidecar) turns wire frames into
//! [`ChannelEvent`]s and implements [`ChannelOutbound`] / [`AttachmentDownloader`]
//! so the rest of the bot never touches the wire protocol.

pub mod error;
pub mod message;
pub mod plugin;

pub use {
    error::{Error, Result},
    message::{
        ContextInfo, DocumentMessage, ExtendedTextMessage, MediaKind, MediaMessage, MessageContent,
    },
    plugin::{
        AttachmentDownloader, ChannelAttachment, ChannelEvent, ChannelOutbound, ConversationId,
        EventReceiver, EventSender, InboundMessage,
    },
};
