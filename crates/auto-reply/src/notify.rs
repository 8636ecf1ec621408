use {
    paperbot_channels::{ChannelOutbound, ConversationId},
    tracing::warn,
};

/// Sends text back to the conversation a request came from.
pub struct Notifier<'a> {
    outbound: &'a dyn ChannelOutbound,
    conversation: &'a ConversationId,
}

impl<'a> Notifier<'a> {
    pub fn new(outbound: &'a dyn ChannelOutbound, conversation: &'a ConversationId) -> Self {
        Self {
            outbound,
            conversation,
        }
    }

    pub fn conversation(&self) -> &ConversationId {
        self.conversation
    }

    /// Deliver a message the turn depends on.
    pub async fn send(&self, text: &str) -> paperbot_channels::Result<()> {
        self.outbound.send_text(self.conversation, text).await
    }

    /// Deliver a progress note. A lost progress note does not stop the work.
    pub async fn progress(&self, text: &str) {
        if let Err(e) = self.send(text).await {
            warn!(conversation = %self.conversation, error = %e, "failed to send progress message");
        }
    }
}
