//! Bounded poll for the server's latest preview thumbnail.
//!
//! After a state change the server renders a new preview in the background.
//! The poll fetches `latest-thumbnail.png` at a fixed interval until the bytes
//! change or the attempt budget runs out.

use abr_bus::{ClientEvent, EventPublisher};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::domain::config::ThumbnailConfig;
use crate::domain::types::Thumbnail;
use crate::ports::outbound::{StateTransport, TimeSource, TransportRequest};

/// Encode PNG bytes as a `data:` URL.
pub fn png_data_url(bytes: &[u8]) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(bytes))
}

pub struct ThumbnailPoller {
    transport: Arc<dyn StateTransport>,
    bus: Arc<dyn EventPublisher>,
    clock: Arc<dyn TimeSource>,
    config: ThumbnailConfig,
    active: AtomicBool,
    latest: RwLock<Option<(Vec<u8>, Thumbnail)>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ThumbnailPoller {
    pub fn new(
        transport: Arc<dyn StateTransport>,
        bus: Arc<dyn EventPublisher>,
        clock: Arc<dyn TimeSource>,
        config: ThumbnailConfig,
    ) -> Self {
        Self {
            transport,
            bus,
            clock,
            config,
            active: AtomicBool::new(false),
            latest: RwLock::new(None),
            task: Mutex::new(None),
        }
    }

    /// Most recent thumbnail seen by a poll.
    pub fn latest(&self) -> Option<Thumbnail> {
        self.latest.read().as_ref().map(|(_, t)| t.clone())
    }

    pub fn is_polling(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Start a poll unless one is already running or polling is disabled.
    /// Returns whether a new poll was started.
    pub fn start(self: &Arc<Self>) -> bool {
        if self.config.max_attempts == 0 {
            return false;
        }
        if self
            .active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            trace!("Thumbnail poll already running");
            return false;
        }

        let poller = Arc::clone(self);
        let handle = tokio::spawn(async move {
            poller.run().await;
            poller.active.store(false, Ordering::Release);
        });
        *self.task.lock() = Some(handle);
        true
    }

    /// Abort a running poll.
    pub fn stop(&self) {
        if let Some(handle) = self.task.lock().take() {
            handle.abort();
        }
        self.active.store(false, Ordering::Release);
    }

    async fn run(&self) {
        for attempt in 1..=self.config.max_attempts {
            tokio::time::sleep(self.config.poll_interval).await;

            // Cache buster so intermediaries never hand back an old image.
            let request = TransportRequest::get(self.segments())
                .with_query("t", self.clock.now_millis().to_string());

            let bytes = match self.transport.send(request).await {
                Ok(response) if response.is_success() => response.body,
                Ok(response) => {
                    trace!(attempt, status = response.status, "Thumbnail not available yet");
                    continue;
                }
                Err(e) => {
                    warn!(attempt, error = %e, "Thumbnail fetch failed");
                    continue;
                }
            };

            if self.store_if_changed(bytes) {
                debug!(attempt, "Thumbnail updated");
                return;
            }
        }
        debug!(attempts = self.config.max_attempts, "Thumbnail unchanged, giving up");
    }

    fn segments(&self) -> Vec<String> {
        self.config
            .path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn store_if_changed(&self, bytes: Vec<u8>) -> bool {
        let mut latest = self.latest.write();
        if matches!(latest.as_ref(), Some((seen, _)) if *seen == bytes) {
            return false;
        }
        let size = bytes.len();
        let thumbnail = Thumbnail {
            data_url: png_data_url(&bytes),
            bytes: size,
        };
        *latest = Some((bytes, thumbnail));
        drop(latest);

        self.bus.publish(ClientEvent::ThumbnailUpdated { bytes: size });
        true
    }
}

impl Drop for ThumbnailPoller {
    fn drop(&mut self) {
        if let Some(handle) = self.task.get_mut().take() {
            handle.abort();
        }
    }
}
