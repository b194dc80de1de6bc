//! Enum wrapper for key source dispatch.
//!
//! Native `async fn` in traits is not object-safe, so `Box<dyn KeySource>` is
//! not available. [`AnyKeySource`] provides concrete dispatch instead, which
//! also keeps the pump future `Send` for `tokio::spawn`.

use tokio::io::AsyncRead;

use crate::Result;
use crate::mock::MockKeySource;
use crate::reader::ReaderKeySource;
use crate::traits::{KeyEvent, KeySource};

/// Boxed byte stream accepted by [`AnyKeySource::Reader`].
pub type BoxedKeyStream = Box<dyn AsyncRead + Send + Unpin>;

/// Any supported key source.
///
/// # Examples
///
/// ```
/// use labelcheck_hardware::devices::AnyKeySource;
/// use labelcheck_hardware::mock::MockKeySource;
/// use labelcheck_hardware::traits::KeySource;
///
/// let (keyboard, _handle) = MockKeySource::new();
/// let source = AnyKeySource::Mock(keyboard);
/// assert_eq!(source.name(), "Mock Keyboard");
/// ```
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyKeySource {
    /// Programmatically driven keyboard.
    Mock(MockKeySource),

    /// UTF-8 byte stream (tty device, raw terminal).
    Reader(ReaderKeySource<BoxedKeyStream>),
}

impl AnyKeySource {
    /// Wrap any byte stream as a key source.
    pub fn reader(
        name: impl Into<String>,
        reader: impl AsyncRead + Send + Unpin + 'static,
    ) -> Self {
        Self::Reader(ReaderKeySource::new(name, Box::new(reader)))
    }
}

impl KeySource for AnyKeySource {
    async fn next_key(&mut self) -> Result<KeyEvent> {
        match self {
            Self::Mock(source) => source.next_key().await,
            Self::Reader(source) => source.next_key().await,
        }
    }

    fn name(&self) -> &str {
        match self {
            Self::Mock(source) => source.name(),
            Self::Reader(source) => source.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_any_key_source_mock() {
        let (keyboard, handle) = MockKeySource::new();
        let mut source = AnyKeySource::Mock(keyboard);

        handle.send_key(KeyEvent::Char('q')).await.unwrap();
        assert_eq!(source.next_key().await.unwrap(), KeyEvent::Char('q'));
        assert_eq!(source.name(), "Mock Keyboard");
    }

    #[tokio::test]
    async fn test_any_key_source_reader() {
        let mut source = AnyKeySource::reader("fixture", &b"A"[..]);

        assert_eq!(source.next_key().await.unwrap(), KeyEvent::Char('A'));
        assert_eq!(source.name(), "fixture");
        assert!(source.next_key().await.is_err());
    }
}
