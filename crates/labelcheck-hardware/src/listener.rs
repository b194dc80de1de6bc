//! Debounced keyboard-wedge listener.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  subscribe  ┌──────────────────────────────┐
//! │ KeyboardBus  │────────────►│ listener task                │
//! └──────────────┘             │  Char  -> WedgeBuffer::push  │──► DecodedBarcode (mpsc)
//!                              │  idle >= debounce -> clear   │
//!                              └──────────────────────────────┘
//! ```
//!
//! Every `Char` key restarts the idle timer; when the timer fires before the
//! next key, the accumulated keystrokes are dropped. A scanner burst therefore
//! survives as one token while a human pausing between keys never forms one.
//!
//! The listener subscribes at most once no matter how often it is mounted, so
//! a scan never produces duplicate decodes.

use std::time::Duration;

use labelcheck_core::constants::{EVENT_CHANNEL_CAPACITY, WEDGE_DEBOUNCE_MS};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::bus::KeyboardBus;
use crate::traits::KeyEvent;
use crate::wedge::{DecodedBarcode, WedgeBuffer};

struct Mount {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Keyboard-wedge decoder attached to a [`KeyboardBus`].
///
/// # Examples
///
/// ```
/// use labelcheck_hardware::{KeyboardBus, WedgeListener};
///
/// #[tokio::main]
/// async fn main() {
///     let bus = KeyboardBus::new();
///     let (mut listener, mut decoded) = WedgeListener::new();
///
///     listener.mount(&bus);
///     bus.type_str("1Z12345E0205271688");
///
///     let barcode = decoded.recv().await.unwrap();
///     assert_eq!(barcode.tracking_number.as_str(), "1Z12345E0205271688");
///
///     listener.unmount().await;
/// }
/// ```
pub struct WedgeListener {
    debounce: Duration,
    decoded_tx: mpsc::Sender<DecodedBarcode>,
    mounted: Option<Mount>,
}

impl WedgeListener {
    /// Create a listener with the default debounce window.
    ///
    /// Returns the listener and the receiving end for decoded barcodes.
    pub fn new() -> (Self, mpsc::Receiver<DecodedBarcode>) {
        Self::with_debounce(Duration::from_millis(WEDGE_DEBOUNCE_MS))
    }

    pub fn with_debounce(debounce: Duration) -> (Self, mpsc::Receiver<DecodedBarcode>) {
        let (decoded_tx, decoded_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let listener = Self {
            debounce,
            decoded_tx,
            mounted: None,
        };
        (listener, decoded_rx)
    }

    /// Start listening on `bus`.
    ///
    /// Returns `false` without subscribing again if already mounted.
    pub fn mount(&mut self, bus: &KeyboardBus) -> bool {
        if self.mounted.as_ref().is_some_and(|m| !m.task.is_finished()) {
            trace!("Wedge listener already mounted");
            return false;
        }

        let cancel = CancellationToken::new();
        let task = tokio::spawn(run(
            bus.subscribe(),
            self.debounce,
            self.decoded_tx.clone(),
            cancel.clone(),
        ));
        self.mounted = Some(Mount { cancel, task });

        debug!(debounce_ms = self.debounce.as_millis() as u64, "Wedge listener mounted");
        true
    }

    /// Stop listening and drop any partial keystrokes.
    ///
    /// Returns `false` if the listener was not mounted.
    pub async fn unmount(&mut self) -> bool {
        let Some(mount) = self.mounted.take() else {
            return false;
        };

        mount.cancel.cancel();
        if let Err(e) = mount.task.await {
            warn!(error = %e, "Wedge listener task ended abnormally");
        }

        debug!("Wedge listener unmounted");
        true
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }
}

impl Drop for WedgeListener {
    fn drop(&mut self) {
        if let Some(mount) = &self.mounted {
            mount.cancel.cancel();
        }
    }
}

impl std::fmt::Debug for WedgeListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WedgeListener")
            .field("debounce", &self.debounce)
            .field("mounted", &self.is_mounted())
            .finish()
    }
}

async fn run(
    mut keys: broadcast::Receiver<KeyEvent>,
    debounce: Duration,
    decoded_tx: mpsc::Sender<DecodedBarcode>,
    cancel: CancellationToken,
) {
    let mut buffer = WedgeBuffer::new();
    let idle = tokio::time::sleep(debounce);
    tokio::pin!(idle);
    let mut armed = false;

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => break,

            _ = &mut idle, if armed => {
                armed = false;
                if !buffer.is_empty() {
                    trace!(dropped = buffer.len(), "Wedge debounce elapsed");
                    buffer.clear();
                }
            }

            key = keys.recv() => match key {
                Ok(KeyEvent::Char(c)) => {
                    idle.as_mut().reset(Instant::now() + debounce);
                    armed = true;

                    if let Some(tracking_number) = buffer.push(c) {
                        debug!(tracking_number = %tracking_number, "Wedge barcode decoded");
                        let barcode = DecodedBarcode::from_wedge(tracking_number);
                        if decoded_tx.send(barcode).await.is_err() {
                            debug!("Decoded barcode receiver dropped");
                            break;
                        }
                    }
                }
                Ok(KeyEvent::Named(_)) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Wedge listener lagged, discarding partial input");
                    buffer.clear();
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}
