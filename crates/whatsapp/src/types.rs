//! Sidecar wire protocol. One JSON object per WebSocket text frame,
//! discriminated by `type`.

use {
    paperbot_channels::MessageContent,
    serde::{Deserialize, Serialize},
    std::path::PathBuf,
};

/// Frames sent from the bot to the sidecar.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GatewayMessage {
    Login {
        account_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        auth_dir: Option<PathBuf>,
    },
    Logout {
        account_id: String,
    },
    SendText {
        request_id: String,
        account_id: String,
        to: String,
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        quoted_message_id: Option<String>,
    },
    /// Ask the sidecar to fetch and decrypt the media of `message`.
    DownloadMedia {
        request_id: String,
        account_id: String,
        message: MessageContent,
    },
}

impl GatewayMessage {
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Self::SendText { request_id, .. } | Self::DownloadMedia { request_id, .. } => {
                Some(request_id)
            },
            Self::Login { .. } | Self::Logout { .. } => None,
        }
    }
}

/// Frames sent from the sidecar to the bot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SidecarMessage {
    Qr {
        account_id: String,
        qr: String,
    },
    Connected {
        account_id: String,
        #[serde(default)]
        phone_number: Option<String>,
    },
    Disconnected {
        account_id: String,
        #[serde(default)]
        reason: String,
    },
    LoggedOut {
        account_id: String,
    },
    InboundMessage {
        account_id: String,
        message_id: String,
        chat_jid: String,
        sender_jid: String,
        #[serde(default)]
        sender_name: Option<String>,
        #[serde(default)]
        from_me: bool,
        #[serde(default)]
        timestamp: i64,
        #[serde(default)]
        message: MessageContent,
    },
    SendResult {
        request_id: String,
        success: bool,
        #[serde(default)]
        message_id: Option<String>,
        #[serde(default)]
        error: Option<String>,
    },
    MediaResult {
        request_id: String,
        success: bool,
        /// Base64 media bytes.
        #[serde(default)]
        data: Option<String>,
        #[serde(default)]
        mime_type: Option<String>,
        #[serde(default)]
        error: Option<String>,
    },
    Error {
        #[serde(default)]
        account_id: Option<String>,
        error: String,
    },
}

impl SidecarMessage {
    /// Request this frame answers, for the frames that answer one.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Self::SendResult { request_id, .. } | Self::MediaResult { request_id, .. } => {
                Some(request_id)
            },
            _ => None,
        }
    }
}

/// Login progress of one account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    WaitingForQr,
    QrReceived(String),
    Connected {
        phone_number: Option<String>,
    },
}
