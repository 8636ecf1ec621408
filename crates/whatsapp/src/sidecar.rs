//! WebSocket connection to the Baileys sidecar.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use {
    anyhow::{Context, Result},
    futures::{SinkExt, StreamExt},
    paperbot_channels::Error as ChannelError,
    tokio::sync::{Mutex, mpsc, oneshot},
    tokio_tungstenite::{connect_async, tungstenite::Message},
    tracing::{debug, info, warn},
};

use crate::types::{GatewayMessage, SidecarMessage};

/// Delay between connection attempts while the sidecar is starting up.
const RETRY_DELAY: Duration = Duration::from_millis(500);

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Invoked for every sidecar frame that is not the answer to a pending request.
pub type MessageCallback = Arc<dyn Fn(SidecarMessage) + Send + Sync>;

type PendingRequests = Arc<Mutex<HashMap<String, oneshot::Sender<SidecarMessage>>>>;

/// Cloneable handle for writing to the sidecar connection.
#[derive(Clone)]
pub struct SidecarHandle {
    write_tx: mpsc::UnboundedSender<String>,
    pending: PendingRequests,
    connected: Arc<AtomicBool>,
    request_timeout: Duration,
}

impl SidecarHandle {
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Fire-and-forget send.
    pub fn send(&self, msg: &GatewayMessage) -> paperbot_channels::Result<()> {
        if !self.is_connected() {
            return Err(ChannelError::unavailable("whatsapp sidecar is not connected"));
        }
        let json = serde_json::to_string(msg)?;
        self.write_tx
            .send(json)
            .map_err(|_| ChannelError::unavailable("whatsapp sidecar connection closed"))
    }

    /// Send a frame carrying a `request_id` and wait for the sidecar's answer.
    pub async fn request(&self, msg: GatewayMessage) -> paperbot_channels::Result<SidecarMessage> {
        let Some(request_id) = msg.request_id().map(str::to_string) else {
            return Err(ChannelError::invalid_input(
                "sidecar request frame has no request_id",
            ));
        };

        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(request_id.clone(), tx);

        if let Err(e) = self.send(&msg) {
            self.pending.lock().await.remove(&request_id);
            return Err(e);
        }

        match tokio::time::timeout(self.request_timeout, rx).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(_)) => Err(ChannelError::unavailable(
                "whatsapp sidecar disconnected before answering",
            )),
            Err(_) => {
                self.pending.lock().await.remove(&request_id);
                warn!(request_id, "sidecar request timed out");
                Err(ChannelError::timeout(format!("sidecar request {request_id}")))
            },
        }
    }
}

/// Open one connection to the sidecar at `url`.
///
/// The returned receiver fires once the connection is gone.
pub async fn connect(
    url: &str,
    callback: MessageCallback,
) -> Result<(SidecarHandle, oneshot::Receiver<()>)> {
    let (ws_stream, _response) = connect_async(url)
        .await
        .with_context(|| format!("failed to connect to whatsapp sidecar at {url}"))?;
    info!(url, "connected to whatsapp sidecar");

    let (write_tx, write_rx) = mpsc::unbounded_channel::<String>();
    let (disconnect_tx, disconnect_rx) = oneshot::channel();
    let handle = SidecarHandle {
        write_tx,
        pending: Arc::new(Mutex::new(HashMap::new())),
        connected: Arc::new(AtomicBool::new(true)),
        request_timeout: DEFAULT_REQUEST_TIMEOUT,
    };

    tokio::spawn(connection_loop(
        ws_stream,
        write_rx,
        Arc::clone(&handle.pending),
        Arc::clone(&handle.connected),
        callback,
        disconnect_tx,
    ));

    Ok((handle, disconnect_rx))
}

/// [`connect`] with up to `retries` extra attempts.
pub async fn connect_with_retry(
    url: &str,
    callback: MessageCallback,
    retries: u32,
) -> Result<(SidecarHandle, oneshot::Receiver<()>)> {
    let mut attempt = 0;
    loop {
        match connect(url, Arc::clone(&callback)).await {
            Ok(conn) => return Ok(conn),
            Err(e) if attempt < retries => {
                attempt += 1;
                debug!(attempt, retries, error = %e, "sidecar not ready, retrying");
                tokio::time::sleep(RETRY_DELAY).await;
            },
            Err(e) => return Err(e),
        }
    }
}

async fn connection_loop<S>(
    ws_stream: tokio_tungstenite::WebSocketStream<S>,
    mut write_rx: mpsc::UnboundedReceiver<String>,
    pending: PendingRequests,
    connected: Arc<AtomicBool>,
    callback: MessageCallback,
    disconnect_tx: oneshot::Sender<()>,
) where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    let (mut ws_sink, mut ws_reader) = ws_stream.split();

    loop {
        tokio::select! {
            msg = ws_reader.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        dispatch_frame(&text, &pending, &callback).await;
                    },
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("sidecar closed the connection");
                        break;
                    },
                    Some(Ok(Message::Ping(data))) => {
                        if let Err(e) = ws_sink.send(Message::Pong(data)).await {
                            warn!(error = %e, "failed to answer sidecar ping");
                            break;
                        }
                    },
                    Some(Ok(_)) => {},
                    Some(Err(e)) => {
                        warn!(error = %e, "sidecar websocket error");
                        break;
                    },
                }
            },
            json = write_rx.recv() => {
                match json {
                    Some(text) => {
                        if let Err(e) = ws_sink.send(Message::Text(text.into())).await {
                            warn!(error = %e, "failed to write to sidecar");
                            break;
                        }
                    },
                    None => {
                        let _ = ws_sink.send(Message::Close(None)).await;
                        break;
                    },
                }
            },
        }
    }

    connected.store(false, Ordering::Release);
    // Dropping the senders wakes every waiter with an error.
    pending.lock().await.clear();
    let _ = disconnect_tx.send(());
    info!("whatsapp sidecar connection ended");
}

async fn dispatch_frame(text: &str, pending: &PendingRequests, callback: &MessageCallback) {
    let msg: SidecarMessage = match serde_json::from_str(text) {
        Ok(msg) => msg,
        Err(e) => {
            warn!(error = %e, "unrecognized sidecar frame");
            return;
        },
    };

    if let Some(request_id) = msg.request_id() {
        let waiter = pending.lock().await.remove(request_id);
        if let Some(tx) = waiter {
            let _ = tx.send(msg);
            return;
        }
    }
    callback(msg);
}
