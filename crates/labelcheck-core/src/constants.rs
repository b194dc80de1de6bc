//! Core constants for the label check scanner integration.
//!
//! This module centralizes the timing, addressing and grammar constants shared
//! by the transport, the keyboard-wedge decoder and the scan orchestrator.
//!
//! # Tracking Number Grammar
//!
//! Wedge scanners type the tracking number as plain keystrokes, optionally
//! preceded by a symbology prefix:
//!
//! ```text
//! [\000026]1Z XXXXXXXXXXXXXXXX
//!  ^^^^^^^ ^^ ^^^^^^^^^^^^^^^^
//!  prefix  |  16 chars of [0-9A-Z]
//!          tracking prefix
//! ```
//!
//! # Usage
//!
//! ```
//! use labelcheck_core::constants::*;
//! use std::time::Duration;
//!
//! assert_eq!(TRACKING_NUMBER_LENGTH, 18);
//! let debounce = Duration::from_millis(WEDGE_DEBOUNCE_MS);
//! assert_eq!(debounce.as_millis(), 50);
//! ```

// ============================================================================
// Tracking Number Grammar
// ============================================================================

/// Leading characters of every accepted tracking number.
pub const TRACKING_NUMBER_PREFIX: &str = "1Z";

/// Number of `[0-9A-Z]` characters following [`TRACKING_NUMBER_PREFIX`].
pub const TRACKING_NUMBER_BODY_LENGTH: usize = 16;

/// Total tracking number length (prefix + body).
pub const TRACKING_NUMBER_LENGTH: usize =
    TRACKING_NUMBER_PREFIX.len() + TRACKING_NUMBER_BODY_LENGTH;

/// Symbology prefix some wedge scanners emit before the code.
///
/// This is the literal seven-character sequence: a backslash then `000026`.
/// It is tolerated in front of a code and stripped from the decoded value.
pub const WEDGE_PREFIX: &str = "\\000026";

// ============================================================================
// Timing
// ============================================================================

/// Idle gap that ends a keyboard-wedge burst (milliseconds).
///
/// A scanner types all characters of one code in a burst that is effectively
/// simultaneous. Any pause of at least this length is a token boundary and
/// clears the accumulated keystrokes.
///
/// # Value: 50ms
pub const WEDGE_DEBOUNCE_MS: u64 = 50;

/// Constant interval between reconnection attempts (milliseconds).
///
/// # Value: 3000ms (3 seconds)
pub const RECONNECT_INTERVAL_MS: u64 = 3000;

/// Reconnection attempt budget.
///
/// Large enough to be effectively unbounded for an unattended kiosk.
///
/// # Value: 100 000 attempts
pub const MAX_RECONNECT_ATTEMPTS: u32 = 100_000;

/// Timeout for a single websocket open handshake (milliseconds).
///
/// # Value: 5000ms
pub const CONNECT_TIMEOUT_MS: u64 = 5000;

// ============================================================================
// Endpoints
// ============================================================================

/// Default scanner hub websocket endpoint.
pub const DEFAULT_SCANNER_URL: &str = "ws://127.0.0.1:8089";

/// Default base URL of the label validation API.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api/latest";

/// Path of the label validation endpoint, relative to the API base URL.
pub const VALIDATE_PATH: &str = "shipping/label/validate";

/// Scanner armed with `image_mode` when no explicit scanner is configured.
pub const DEFAULT_ARM_SCANNER_ID: u32 = 1;

// ============================================================================
// Limits
// ============================================================================

/// Maximum accepted inbound frame size in bytes.
///
/// Image frames carry a full base64 JPEG, so the limit is generous.
///
/// # Value: 16 MiB
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Maximum keystrokes held by the wedge accumulator.
///
/// Older keystrokes are discarded first. Only the suffix of the buffer is
/// tested against the grammar, so this never hides a complete code.
///
/// # Value: 256 characters
pub const WEDGE_BUFFER_CAPACITY: usize = 256;

/// Capacity of the keyboard event fan-out.
pub const KEYBOARD_BUS_CAPACITY: usize = 1024;

/// Capacity of the transport and decoder event channels.
pub const EVENT_CHANNEL_CAPACITY: usize = 100;

// ============================================================================
// Operator Messages
// ============================================================================

/// Notification shown after a label validates.
pub const MSG_LABEL_VALID: &str = "Label is valid";

/// Notification shown after a label fails validation.
pub const MSG_LABEL_INVALID: &str = "Label does not match the expected address";

/// Notification shown when the operator requests a reprint.
pub const MSG_REPRINT: &str = "Reprint requested";
