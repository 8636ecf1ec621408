//! WhatsApp Web channel: connection lifecycle and inbound event mapping.

use std::{
    path::PathBuf,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use {
    anyhow::Result,
    paperbot_channels::{ChannelEvent, ConversationId, EventSender, InboundMessage},
    tokio::sync::{RwLock, mpsc::error::TrySendError},
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
};

#[cfg(feature = "metrics")]
use paperbot_metrics::{counter, whatsapp as wa_metrics};

use crate::{
    outbound::WhatsAppOutbound,
    sidecar::{MessageCallback, SidecarHandle, connect_with_retry},
    types::{ConnectionState, GatewayMessage, SidecarMessage},
};

/// Maximum reconnect backoff delay.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct WhatsAppOptions {
    pub account_id: String,
    pub sidecar_url: String,
    pub auth_dir: Option<PathBuf>,
    pub connect_retries: u32,
    pub request_timeout: Duration,
}

impl Default for WhatsAppOptions {
    fn default() -> Self {
        Self {
            account_id: "default".into(),
            sidecar_url: "ws://127.0.0.1:9876".into(),
            auth_dir: None,
            connect_retries: 10,
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// One WhatsApp account served through the sidecar.
pub struct WhatsAppChannel {
    options: WhatsAppOptions,
    sidecar: Arc<RwLock<Option<SidecarHandle>>>,
    state: Arc<Mutex<ConnectionState>>,
}

impl WhatsAppChannel {
    pub fn new(options: WhatsAppOptions) -> Self {
        Self {
            options,
            sidecar: Arc::new(RwLock::new(None)),
            state: Arc::new(Mutex::new(ConnectionState::Disconnected)),
        }
    }

    pub fn account_id(&self) -> &str {
        &self.options.account_id
    }

    /// Sender/downloader bound to this channel's current connection.
    pub fn outbound(&self) -> WhatsAppOutbound {
        WhatsAppOutbound::new(self.options.account_id.clone(), Arc::clone(&self.sidecar))
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Connect to the sidecar and ask it to log the account in.
    ///
    /// Inbound traffic is forwarded to `events`. The returned receiver fires
    /// when the connection drops.
    pub async fn start(&self, events: EventSender) -> Result<tokio::sync::oneshot::Receiver<()>> {
        let account_id = self.options.account_id.clone();
        info!(account_id, url = %self.options.sidecar_url, "starting whatsapp web account");

        let state = Arc::clone(&self.state);
        let callback: MessageCallback = Arc::new(move |msg| {
            handle_sidecar_message(msg, &state, &events);
        });

        let (handle, disconnect_rx) = connect_with_retry(
            &self.options.sidecar_url,
            callback,
            self.options.connect_retries,
        )
        .await?;
        let handle = handle.with_request_timeout(self.options.request_timeout);

        handle.send(&GatewayMessage::Login {
            account_id: account_id.clone(),
            auth_dir: self.options.auth_dir.clone(),
        })?;
        set_state(&self.state, ConnectionState::WaitingForQr);
        *self.sidecar.write().await = Some(handle);

        Ok(disconnect_rx)
    }

    /// Keep the account connected until `shutdown` is cancelled, reconnecting
    /// with exponential backoff.
    pub async fn run(&self, events: EventSender, shutdown: CancellationToken) -> Result<()> {
        let mut backoff = Duration::from_secs(1);
        loop {
            let disconnected = match self.start(events.clone()).await {
                Ok(rx) => {
                    backoff = Duration::from_secs(1);
                    rx
                },
                Err(e) => {
                    warn!(error = %e, "could not reach whatsapp sidecar");
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(backoff) => {},
                    }
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                    continue;
                },
            };

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = disconnected => {
                    set_state(&self.state, ConnectionState::Disconnected);
                    let _ = events
                        .send(ChannelEvent::Disconnected {
                            account_id: self.options.account_id.clone(),
                            reason: "sidecar connection closed".into(),
                        })
                        .await;
                },
            }

            info!(delay_ms = backoff.as_millis(), "reconnecting to whatsapp sidecar");
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(backoff) => {},
            }
            backoff = (backoff * 2).min(MAX_BACKOFF);
        }

        self.stop().await;
        Ok(())
    }

    /// Log the account out and drop the connection.
    pub async fn stop(&self) {
        if let Some(handle) = self.sidecar.write().await.take() {
            let _ = handle.send(&GatewayMessage::Logout {
                account_id: self.options.account_id.clone(),
            });
            info!(account_id = %self.options.account_id, "stopped whatsapp web account");
        }
        set_state(&self.state, ConnectionState::Disconnected);
    }
}

fn set_state(state: &Mutex<ConnectionState>, next: ConnectionState) {
    *state.lock().unwrap_or_else(PoisonError::into_inner) = next;
}

/// Queue an event. A full queue hands the event to a task that waits for
/// room, so inbound commands are delayed rather than lost.
fn emit(events: &EventSender, event: ChannelEvent) {
    match events.try_send(event) {
        Ok(()) => {},
        Err(TrySendError::Full(event)) => match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                warn!("event queue full, deferring whatsapp event");
                #[cfg(feature = "metrics")]
                counter!(wa_metrics::EVENTS_DEFERRED_TOTAL).increment(1);

                let events = events.clone();
                runtime.spawn(async move {
                    if events.send(event).await.is_err() {
                        debug!("event receiver gone");
                    }
                });
            },
            Err(_) => {
                warn!("event queue full outside a runtime, dropping whatsapp event");
                #[cfg(feature = "metrics")]
                counter!(wa_metrics::EVENTS_DROPPED_TOTAL).increment(1);
            },
        },
        Err(TrySendError::Closed(_)) => debug!("event receiver gone"),
    }
}

/// Map one unsolicited sidecar frame to state changes and channel events.
fn handle_sidecar_message(
    msg: SidecarMessage,
    state: &Mutex<ConnectionState>,
    events: &EventSender,
) {
    match msg {
        SidecarMessage::Qr { account_id, qr } => {
            info!(account_id, qr, "scan the QR code with WhatsApp to log in");
            set_state(state, ConnectionState::QrReceived(qr));
        },
        SidecarMessage::Connected {
            account_id,
            phone_number,
        } => {
            info!(account_id, ?phone_number, "whatsapp web connected");
            set_state(state, ConnectionState::Connected { phone_number });
            emit(events, ChannelEvent::Connected { account_id });
        },
        SidecarMessage::Disconnected { account_id, reason } => {
            warn!(account_id, reason, "whatsapp web disconnected");
            set_state(state, ConnectionState::Disconnected);
            emit(events, ChannelEvent::Disconnected { account_id, reason });
        },
        SidecarMessage::LoggedOut { account_id } => {
            info!(account_id, "whatsapp web logged out");
            set_state(state, ConnectionState::Disconnected);
            emit(events, ChannelEvent::Disconnected {
                account_id,
                reason: "logged out".into(),
            });
        },
        SidecarMessage::InboundMessage {
            account_id,
            message_id,
            chat_jid,
            sender_jid,
            sender_name,
            from_me,
            timestamp,
            message,
        } => {
            if from_me {
                debug!(account_id, message_id, "skipping own message");
                return;
            }
            debug!(account_id, sender_jid, message_id, "received inbound message");

            #[cfg(feature = "metrics")]
            counter!(wa_metrics::MESSAGES_RECEIVED_TOTAL).increment(1);

            emit(
                events,
                ChannelEvent::IncomingMessage(InboundMessage {
                    account_id,
                    message_id,
                    conversation: ConversationId::from(chat_jid),
                    sender_id: sender_jid,
                    sender_name,
                    content: message,
                    timestamp,
                }),
            );
        },
        SidecarMessage::SendResult {
            request_id,
            success,
            error,
            ..
        } => {
            // Late answer to a request that already timed out.
            debug!(request_id, success, ?error, "unmatched send result");
        },
        SidecarMessage::MediaResult { request_id, .. } => {
            debug!(request_id, "unmatched media result");
        },
        SidecarMessage::Error { account_id, error } => {
            warn!(?account_id, error, "sidecar error");
        },
    }
}
