//! WhatsApp Web transport.
//!
//! Talks to a Baileys sidecar over a local WebSocket: the sidecar owns the
//! WhatsApp session, this crate turns its frames into [`ChannelEvent`]s and
//! exposes sending and media download through the channel traits.
//!
//! [`ChannelEvent`]: paperbot_channels::ChannelEvent

pub mod outbound;
pub mod plugin;
pub mod sidecar;
pub mod types;

pub use {
    outbound::WhatsAppOutbound,
    plugin::{WhatsAppChannel, WhatsAppOptions},
    sidecar::{SidecarHandle, connect, connect_with_retry},
    types::{ConnectionState, GatewayMessage, SidecarMessage},
};
