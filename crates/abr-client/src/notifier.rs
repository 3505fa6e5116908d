//! Push channel listener.
//!
//! The server broadcasts a tiny JSON envelope on `/ws/` whenever the state or
//! a named cache changes. The notifier turns each envelope into a call on the
//! [`InvalidationHandler`] and keeps the socket alive with bounded
//! exponential-backoff reconnects.

use abr_bus::{ClientEvent, ConnectionStatus, EventPublisher};
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::domain::config::{NotifierConfig, ReconnectPolicy};
use crate::domain::error::{ClientError, ClientResult};
use crate::domain::message::{parse_push_message, PushTarget};
use crate::ports::inbound::InvalidationHandler;

/// Observable state of the push channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotifierState {
    pub status: ConnectionStatus,
    /// Whether the channel has reached `Ready` at least once.
    pub ever_ready: bool,
}

/// Everything the background loop needs, shared with it by `Arc`.
struct Channel {
    url: String,
    handshake: String,
    policy: ReconnectPolicy,
    bus: Arc<dyn EventPublisher>,
    status: watch::Sender<NotifierState>,
}

impl Channel {
    fn set_status(&self, status: ConnectionStatus) {
        self.status.send_modify(|state| {
            state.status = status;
            if status == ConnectionStatus::Ready {
                state.ever_ready = true;
            }
        });
        self.bus.publish(ClientEvent::Connection(status));
    }
}

/// WebSocket listener for server invalidations.
pub struct Notifier {
    channel: Arc<Channel>,
    shutdown_tx: Mutex<Option<mpsc::Sender<()>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Notifier {
    pub fn new(
        url: impl Into<String>,
        config: &NotifierConfig,
        bus: Arc<dyn EventPublisher>,
    ) -> Self {
        let (status, _) = watch::channel(NotifierState {
            status: ConnectionStatus::Connecting,
            ever_ready: false,
        });
        Self {
            channel: Arc::new(Channel {
                url: url.into(),
                handshake: config.handshake.clone(),
                policy: config.reconnect.clone(),
                bus,
                status,
            }),
            shutdown_tx: Mutex::new(None),
            task: Mutex::new(None),
        }
    }

    pub fn url(&self) -> &str {
        &self.channel.url
    }

    /// Spawn the connection loop. Calling it again while running is a no-op.
    pub fn start(&self, handler: Arc<dyn InvalidationHandler>) {
        let mut task = self.task.lock();
        if task.is_some() {
            debug!("Notifier already started");
            return;
        }

        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);
        *self.shutdown_tx.lock() = Some(shutdown_tx);

        let channel = Arc::clone(&self.channel);
        *task = Some(tokio::spawn(connection_loop(channel, handler, shutdown_rx)));
    }

    /// Resolve once the channel has been ready at least once.
    ///
    /// Fails if the channel closes for good before that happens.
    pub async fn ready(&self) -> ClientResult<()> {
        let mut rx = self.channel.status.subscribe();
        let state = *rx
            .wait_for(|s| s.ever_ready || s.status == ConnectionStatus::Closed)
            .await
            .map_err(|_| ClientError::ShuttingDown)?;
        if state.ever_ready {
            Ok(())
        } else {
            Err(ClientError::WebSocket(format!(
                "push channel to {} closed before it became ready",
                self.channel.url
            )))
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        self.channel.status.borrow().status
    }

    pub fn watch_status(&self) -> watch::Receiver<NotifierState> {
        self.channel.status.subscribe()
    }

    /// Stop the loop and wait for it to settle in `Closed`.
    pub async fn shutdown(&self) {
        let shutdown_tx = self.shutdown_tx.lock().take();
        if let Some(tx) = shutdown_tx {
            let _ = tx.send(()).await;
        }
        let task = self.task.lock().take();
        match task {
            Some(handle) => {
                let _ = handle.await;
            }
            None => self.channel.set_status(ConnectionStatus::Closed),
        }
    }
}

impl Drop for Notifier {
    fn drop(&mut self) {
        if let Some(handle) = self.task.get_mut().take() {
            handle.abort();
        }
    }
}

/// Connection loop with reconnection logic.
async fn connection_loop(
    channel: Arc<Channel>,
    handler: Arc<dyn InvalidationHandler>,
    mut shutdown_rx: mpsc::Receiver<()>,
) {
    let mut attempt = 0u32;
    channel.set_status(ConnectionStatus::Connecting);

    loop {
        let mut became_ready = false;
        let result = tokio::select! {
            result = run_connection(&channel, &handler, &mut became_ready) => result,
            _ = shutdown_rx.recv() => break,
        };

        match result {
            Ok(()) => info!(url = %channel.url, "Push channel closed by server"),
            Err(e) => warn!(url = %channel.url, error = %e, "Push channel failed"),
        }

        if became_ready {
            attempt = 0;
        }
        attempt += 1;

        if !channel.policy.should_retry(attempt) {
            if channel.policy.max_attempts > 0 {
                error!(
                    attempts = channel.policy.max_attempts,
                    "Push channel reconnection failed, giving up"
                );
            }
            break;
        }

        channel.set_status(ConnectionStatus::Reconnecting { attempt });
        let delay = channel.policy.delay_for(attempt);
        debug!(attempt, ?delay, "Reconnecting push channel");

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = shutdown_rx.recv() => break,
        }
    }

    channel.set_status(ConnectionStatus::Closed);
}

/// Run a single WebSocket connection until it drops.
async fn run_connection(
    channel: &Channel,
    handler: &Arc<dyn InvalidationHandler>,
    became_ready: &mut bool,
) -> ClientResult<()> {
    let (ws_stream, _) = connect_async(channel.url.as_str()).await?;
    let (mut write, mut read) = ws_stream.split();

    write
        .send(Message::Text(channel.handshake.clone().into()))
        .await?;
    *became_ready = true;
    channel.set_status(ConnectionStatus::Ready);
    info!(url = %channel.url, "Push channel ready");

    while let Some(msg) = read.next().await {
        match msg? {
            Message::Text(text) => {
                dispatch(text.as_str(), handler);
            }
            Message::Ping(data) => {
                let _ = write.send(Message::Pong(data)).await;
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    Ok(())
}

/// Route one text frame to the handler on its own task, so a slow refetch
/// never holds up the socket. Returns the task, or `None` if the frame was
/// ignored.
pub(crate) fn dispatch(
    text: &str,
    handler: &Arc<dyn InvalidationHandler>,
) -> Option<JoinHandle<()>> {
    let Some(target) = parse_push_message(text) else {
        debug!(message = %text, "Ignoring push message");
        return None;
    };

    let handler = Arc::clone(handler);
    Some(tokio::spawn(async move {
        match target {
            PushTarget::State => handler.on_state().await,
            PushTarget::Cache(name) => handler.on_cache(&name).await,
        }
    }))
}
