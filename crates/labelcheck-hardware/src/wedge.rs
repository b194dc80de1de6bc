//! Keyboard-wedge barcode recovery.
//!
//! Legacy scanners type a barcode as keystrokes with no start or end marker,
//! interleaved with whatever else is being typed. The only segmentation signal
//! is time: see [`WedgeListener`](crate::listener::WedgeListener) for the
//! debounce. This module holds the timing-free part: the grammar test and the
//! keystroke accumulator.
//!
//! # Grammar
//!
//! ```text
//! (?:\\000026)?(1Z[0-9A-Z]{16})$
//! ```
//!
//! The pattern is anchored at the end only, so it matches a suffix of the
//! accumulated keystrokes. Unrelated keys typed before a code are tolerated.

use std::sync::LazyLock;

use labelcheck_core::{ScannerId, TrackingNumber};
use labelcheck_core::constants::WEDGE_BUFFER_CAPACITY;
use regex::Regex;

static TRACKING_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\\000026)?(1Z[0-9A-Z]{16})$").expect("tracking number grammar is valid")
});

/// Test `input` for a tracking number ending at its last character.
///
/// Both the local wedge accumulator and keystroke text forwarded by a remote
/// scanner go through this test.
///
/// # Examples
///
/// ```
/// use labelcheck_hardware::wedge::match_tracking_number;
///
/// let tn = match_tracking_number("\\0000261Z12345E0205271688").unwrap();
/// assert_eq!(tn.as_str(), "1Z12345E0205271688");
///
/// assert!(match_tracking_number("noise1Z12345E0205271688").is_some());
/// assert!(match_tracking_number("1Z12345E0205271688x").is_none());
/// ```
pub fn match_tracking_number(input: &str) -> Option<TrackingNumber> {
    let captures = TRACKING_SUFFIX.captures(input)?;
    TrackingNumber::new(captures.get(1)?.as_str()).ok()
}

/// Where a decoded barcode came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BarcodeSource {
    /// Local keystrokes decoded by a [`WedgeListener`](crate::listener::WedgeListener).
    Wedge,

    /// `barcode` message pushed by the scanner hub.
    Transport,
}

/// A tracking number recovered from keystrokes or reported by a scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedBarcode {
    /// Scanner that produced the code, when known.
    pub scanner_id: Option<ScannerId>,
    pub tracking_number: TrackingNumber,
    pub source: BarcodeSource,
}

impl DecodedBarcode {
    pub fn from_wedge(tracking_number: TrackingNumber) -> Self {
        Self {
            scanner_id: None,
            tracking_number,
            source: BarcodeSource::Wedge,
        }
    }

    pub fn from_transport(scanner_id: ScannerId, tracking_number: TrackingNumber) -> Self {
        Self {
            scanner_id: Some(scanner_id),
            tracking_number,
            source: BarcodeSource::Transport,
        }
    }
}

/// Append-only keystroke accumulator.
///
/// Every pushed character triggers the grammar test; a match is returned
/// immediately and clears the buffer. Nothing here knows about time, the
/// owner clears the buffer when the debounce window lapses.
#[derive(Debug, Default, Clone)]
pub struct WedgeBuffer {
    keys: String,
    len: usize,
}

impl WedgeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one character and test the grammar.
    ///
    /// # Examples
    ///
    /// ```
    /// use labelcheck_hardware::wedge::WedgeBuffer;
    ///
    /// let mut buffer = WedgeBuffer::new();
    /// let mut decoded = None;
    /// for c in "1Z12345E0205271688".chars() {
    ///     decoded = buffer.push(c);
    /// }
    /// assert_eq!(decoded.unwrap().as_str(), "1Z12345E0205271688");
    /// assert!(buffer.is_empty());
    /// ```
    pub fn push(&mut self, c: char) -> Option<TrackingNumber> {
        self.keys.push(c);
        self.len += 1;

        if self.len > WEDGE_BUFFER_CAPACITY {
            self.keys.remove(0);
            self.len -= 1;
        }

        let decoded = match_tracking_number(&self.keys);
        if decoded.is_some() {
            self.clear();
        }
        decoded
    }

    pub fn clear(&mut self) {
        self.keys.clear();
        self.len = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of characters held.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn as_str(&self) -> &str {
        &self.keys
    }
}
