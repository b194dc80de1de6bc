//! Mock keyboard for testing and development.

use tokio::sync::mpsc;

use crate::{
    HardwareError, Result,
    traits::{KeyEvent, KeySource, NamedKey},
};

/// Simulated keyboard fed through an internal channel.
///
/// Tests type into it with a [`MockKeySourceHandle`], which behaves like a
/// scanner emulating keystrokes.
///
/// # Examples
///
/// ```
/// use labelcheck_hardware::mock::MockKeySource;
/// use labelcheck_hardware::traits::{KeyEvent, KeySource, NamedKey};
///
/// #[tokio::main]
/// async fn main() -> labelcheck_hardware::Result<()> {
///     let (mut keyboard, handle) = MockKeySource::new();
///
///     tokio::spawn(async move {
///         handle.type_line("1Z").await.unwrap();
///     });
///
///     assert_eq!(keyboard.next_key().await?, KeyEvent::Char('1'));
///     assert_eq!(keyboard.next_key().await?, KeyEvent::Char('Z'));
///     assert_eq!(keyboard.next_key().await?, KeyEvent::Named(NamedKey::Enter));
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockKeySource {
    key_rx: mpsc::Receiver<KeyEvent>,
    name: String,
}

impl MockKeySource {
    /// Create a mock keyboard with the default name.
    pub fn new() -> (Self, MockKeySourceHandle) {
        Self::with_name("Mock Keyboard".to_string())
    }

    pub fn with_name(name: String) -> (Self, MockKeySourceHandle) {
        let (key_tx, key_rx) = mpsc::channel(256);

        let source = Self {
            key_rx,
            name: name.clone(),
        };
        let handle = MockKeySourceHandle { key_tx, name };

        (source, handle)
    }
}

impl Default for MockKeySource {
    fn default() -> Self {
        Self::new().0
    }
}

impl KeySource for MockKeySource {
    async fn next_key(&mut self) -> Result<KeyEvent> {
        self.key_rx
            .recv()
            .await
            .ok_or_else(|| HardwareError::disconnected(self.name.clone()))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Handle for typing into a [`MockKeySource`]. Cheap to clone.
#[derive(Debug, Clone)]
pub struct MockKeySourceHandle {
    key_tx: mpsc::Sender<KeyEvent>,
    name: String,
}

impl MockKeySourceHandle {
    /// Send one key event.
    ///
    /// # Errors
    ///
    /// Returns an error if the keyboard has been dropped.
    pub async fn send_key(&self, key: KeyEvent) -> Result<()> {
        self.key_tx
            .send(key)
            .await
            .map_err(|_| HardwareError::disconnected(self.name.clone()))
    }

    /// Type every character of `text`.
    pub async fn type_str(&self, text: &str) -> Result<()> {
        for c in text.chars() {
            self.send_key(KeyEvent::Char(c)).await?;
        }
        Ok(())
    }

    /// Type `text` followed by Enter, the way most wedge scanners terminate a code.
    pub async fn type_line(&self, text: &str) -> Result<()> {
        self.type_str(text).await?;
        self.send_key(KeyEvent::Named(NamedKey::Enter)).await
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
