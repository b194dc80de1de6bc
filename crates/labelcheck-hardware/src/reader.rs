//! Key source over a byte stream.
//!
//! A wedge scanner attached to a dedicated tty, or a terminal in raw mode,
//! delivers UTF-8 text. Each decoded character becomes one key event through
//! [`KeyEvent::from_stream_char`]. Multi-byte characters may be split across
//! reads, so an incomplete trailing sequence is held until the next read.

use std::collections::VecDeque;

use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, trace};

use crate::traits::{KeyEvent, KeySource};
use crate::{HardwareError, Result};

const READ_CHUNK_SIZE: usize = 256;

/// [`KeySource`] reading UTF-8 text from any [`AsyncRead`].
///
/// # Examples
///
/// ```
/// use labelcheck_hardware::reader::ReaderKeySource;
/// use labelcheck_hardware::traits::{KeyEvent, KeySource, NamedKey};
///
/// #[tokio::main]
/// async fn main() -> labelcheck_hardware::Result<()> {
///     let mut source = ReaderKeySource::new("fixture", &b"1Z\n"[..]);
///
///     assert_eq!(source.next_key().await?, KeyEvent::Char('1'));
///     assert_eq!(source.next_key().await?, KeyEvent::Char('Z'));
///     assert_eq!(source.next_key().await?, KeyEvent::Named(NamedKey::Enter));
///     assert!(source.next_key().await.is_err());
///
///     Ok(())
/// }
/// ```
pub struct ReaderKeySource<R> {
    reader: R,
    name: String,
    pending: VecDeque<KeyEvent>,
    partial: Vec<u8>,
    chunk: Box<[u8]>,
}

impl<R: AsyncRead + Unpin> ReaderKeySource<R> {
    pub fn new(name: impl Into<String>, reader: R) -> Self {
        Self {
            reader,
            name: name.into(),
            pending: VecDeque::new(),
            partial: Vec::new(),
            chunk: vec![0; READ_CHUNK_SIZE].into_boxed_slice(),
        }
    }

    /// Decode `bytes` appended to any held partial sequence.
    ///
    /// Invalid sequences become U+FFFD so they still break a token.
    fn decode(&mut self, bytes: &[u8]) {
        self.partial.extend_from_slice(bytes);

        loop {
            match std::str::from_utf8(&self.partial) {
                Ok(text) => {
                    self.pending
                        .extend(text.chars().map(KeyEvent::from_stream_char));
                    self.partial.clear();
                    return;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    if let Ok(text) = std::str::from_utf8(&self.partial[..valid]) {
                        self.pending
                            .extend(text.chars().map(KeyEvent::from_stream_char));
                    }

                    match e.error_len() {
                        Some(invalid) => {
                            debug!(source = %self.name, invalid, "Invalid UTF-8 in key stream");
                            self.pending.push_back(KeyEvent::Char(char::REPLACEMENT_CHARACTER));
                            self.partial.drain(..valid + invalid);
                        }
                        None => {
                            self.partial.drain(..valid);
                            trace!(held = self.partial.len(), "Holding partial UTF-8 sequence");
                            return;
                        }
                    }
                }
            }
        }
    }
}

impl<R: AsyncRead + Unpin> KeySource for ReaderKeySource<R> {
    async fn next_key(&mut self) -> Result<KeyEvent> {
        loop {
            if let Some(key) = self.pending.pop_front() {
                return Ok(key);
            }

            let n = self.reader.read(&mut self.chunk).await?;
            if n == 0 {
                return Err(HardwareError::disconnected(self.name.clone()));
            }

            let chunk = self.chunk[..n].to_vec();
            self.decode(&chunk);
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl<R> std::fmt::Debug for ReaderKeySource<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReaderKeySource")
            .field("name", &self.name)
            .field("pending", &self.pending.len())
            .field("partial", &self.partial.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::NamedKey;

    fn source() -> ReaderKeySource<&'static [u8]> {
        ReaderKeySource::new("test", &b""[..])
    }

    fn drain(source: &mut ReaderKeySource<&'static [u8]>) -> Vec<KeyEvent> {
        source.pending.drain(..).collect()
    }

    #[test]
    fn test_decode_ascii_with_line_ending() {
        let mut source = source();
        source.decode(b"ab\r\n");
        assert_eq!(
            drain(&mut source),
            vec![
                KeyEvent::Char('a'),
                KeyEvent::Char('b'),
                KeyEvent::Named(NamedKey::Enter),
                KeyEvent::Named(NamedKey::Enter),
            ]
        );
    }

    #[test]
    fn test_decode_split_multibyte() {
        let mut source = source();
        let bytes = "é".as_bytes();

        source.decode(&bytes[..1]);
        assert!(drain(&mut source).is_empty());

        source.decode(&bytes[1..]);
        assert_eq!(drain(&mut source), vec![KeyEvent::Char('é')]);
        assert!(source.partial.is_empty());
    }

    #[test]
    fn test_decode_invalid_byte() {
        let mut source = source();
        source.decode(&[b'a', 0xFF, b'b']);
        assert_eq!(
            drain(&mut source),
            vec![
                KeyEvent::Char('a'),
                KeyEvent::Char(char::REPLACEMENT_CHARACTER),
                KeyEvent::Char('b'),
            ]
        );
    }

    #[tokio::test]
    async fn test_end_of_stream_is_disconnect() {
        let mut source = ReaderKeySource::new("tty", &b"x"[..]);
        assert_eq!(source.next_key().await.unwrap(), KeyEvent::Char('x'));
        assert!(matches!(
            source.next_key().await,
            Err(HardwareError::Disconnected { device }) if device == "tty"
        ));
    }
}
