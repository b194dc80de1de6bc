//! Process-wide keyboard event fan-out.
//!
//! Every key source publishes into one [`KeyboardBus`]; every consumer
//! (the wedge listener, a future UI) holds its own subscription. A slow
//! subscriber lags and skips events instead of blocking the publisher.

use labelcheck_core::constants::KEYBOARD_BUS_CAPACITY;
use tokio::sync::broadcast;

use crate::traits::KeyEvent;

/// Broadcast channel carrying [`KeyEvent`]s.
///
/// Cloning the bus clones the publishing side; all clones feed the same
/// subscribers.
#[derive(Debug, Clone)]
pub struct KeyboardBus {
    tx: broadcast::Sender<KeyEvent>,
}

impl KeyboardBus {
    pub fn new() -> Self {
        Self::with_capacity(KEYBOARD_BUS_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish one key event.
    ///
    /// Returns the number of subscribers that will see it. Publishing with no
    /// subscriber is not an error, the key is simply dropped.
    pub fn press(&self, key: KeyEvent) -> usize {
        self.tx.send(key).unwrap_or(0)
    }

    /// Publish every character of `text` as a `Char` key.
    pub fn type_str(&self, text: &str) {
        for c in text.chars() {
            self.press(KeyEvent::Char(c));
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<KeyEvent> {
        self.tx.subscribe()
    }

    /// Number of live subscriptions.
    pub fn listener_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for KeyboardBus {
    fn default() -> Self {
        Self::new()
    }
}
