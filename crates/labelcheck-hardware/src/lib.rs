//! Keyboard-wedge input for the label check station.
//!
//! Handheld scanners in keyboard-emulation mode are indistinguishable from a
//! keyboard. This crate turns raw key events back into tracking numbers.
//!
//! # Layout
//!
//! ```text
//! ┌─────────────┐  pump_keys  ┌─────────────┐  subscribe  ┌───────────────┐
//! │ AnyKeySource│────────────►│ KeyboardBus │────────────►│ WedgeListener │──► DecodedBarcode
//! └─────────────┘             └─────────────┘             └───────────────┘
//! ```
//!
//! - [`traits`]: [`KeyEvent`] and the [`KeySource`] trait (native `async fn`).
//! - [`devices`]: enum dispatch over concrete key sources.
//! - [`bus`]: broadcast fan-out of key events.
//! - [`wedge`]: grammar test and keystroke accumulator.
//! - [`listener`]: debounced, idempotently mounted decoder task.
//!
//! # Example
//!
//! ```
//! use labelcheck_hardware::{KeyboardBus, WedgeListener};
//!
//! #[tokio::main]
//! async fn main() {
//!     let bus = KeyboardBus::new();
//!     let (mut listener, mut decoded) = WedgeListener::new();
//!     listener.mount(&bus);
//!
//!     bus.type_str("\\0000261Z12345E0205271688");
//!
//!     let barcode = decoded.recv().await.unwrap();
//!     assert_eq!(barcode.tracking_number.as_str(), "1Z12345E0205271688");
//! }
//! ```

pub mod bus;
pub mod devices;
pub mod error;
pub mod listener;
pub mod mock;
pub mod pump;
pub mod reader;
pub mod traits;
pub mod wedge;

pub use bus::KeyboardBus;
pub use devices::AnyKeySource;
pub use error::{HardwareError, Result};
pub use listener::WedgeListener;
pub use pump::pump_keys;
pub use traits::{KeyEvent, KeySource, NamedKey};
pub use wedge::{BarcodeSource, DecodedBarcode, WedgeBuffer, match_tracking_number};
