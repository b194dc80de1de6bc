//! Wire protocol spoken with the scanner hub.
//!
//! The hub exchanges JSON text frames over a websocket. Inbound frames are
//! [`ScannerMessage`] values tagged by `messageType`; outbound frames are
//! [`ScannerCommand`] values.
//!
//! ```
//! use labelcheck_protocol::{ScannerCommand, ScannerMessage, encode_command, parse_frame};
//! use labelcheck_core::ScannerId;
//!
//! let msg = parse_frame(r#"{"messageType":"attached","scannerId":3,"status":true}"#).unwrap();
//! assert_eq!(msg.scanner_id(), Some(ScannerId::new(3)));
//!
//! let frame = encode_command(&ScannerCommand::image_capture(ScannerId::new(3))).unwrap();
//! assert_eq!(frame, r#"{"scannerId":3,"commandType":"image_capture"}"#);
//! ```

pub mod command;
pub mod frame;
pub mod message;

pub use command::{CommandType, ScannerCommand};
pub use frame::{encode_command, parse_frame};
pub use message::{MessageType, ScannerInfo, ScannerMessage};
