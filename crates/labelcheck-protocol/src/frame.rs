//! JSON frame codec.
//!
//! Frames are decoded in two steps so that failures can be classified: the
//! text is first parsed as a JSON object and its `messageType` tag checked
//! against [`MessageType`], then the object is decoded into the matching
//! [`ScannerMessage`] variant.

use labelcheck_core::constants::MAX_FRAME_SIZE;
use labelcheck_core::{Error, Result};
use serde_json::Value;

use crate::{MessageType, ScannerCommand, ScannerMessage};

/// Decode one inbound text frame.
///
/// # Errors
///
/// - `Error::FrameTooLarge` if the frame exceeds [`MAX_FRAME_SIZE`]
/// - `Error::InvalidJson` if the text is not JSON
/// - `Error::MissingMessageType` if there is no string `messageType`
/// - `Error::UnknownMessageType` for unrecognized tags
/// - `Error::InvalidMessageFormat` if the fields do not fit the tag
pub fn parse_frame(raw: &str) -> Result<ScannerMessage> {
    if raw.len() > MAX_FRAME_SIZE {
        return Err(Error::FrameTooLarge {
            size: raw.len(),
            max: MAX_FRAME_SIZE,
        });
    }

    let value: Value = serde_json::from_str(raw)?;

    let message_type: MessageType = value
        .get("messageType")
        .and_then(Value::as_str)
        .ok_or(Error::MissingMessageType)?
        .parse()?;

    serde_json::from_value(value)
        .map_err(|e| Error::InvalidMessageFormat(format!("{message_type}: {e}")))
}

/// Encode one outbound command frame.
pub fn encode_command(command: &ScannerCommand) -> Result<String> {
    Ok(serde_json::to_string(command)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use labelcheck_core::ScannerId;

    #[test]
    fn test_parse_barcode() {
        let msg = parse_frame(
            r#"{"messageType":"barcode","scannerId":1,"barcode":"1Z12345E0205271688","status":true}"#,
        )
        .unwrap();

        assert_eq!(
            msg,
            ScannerMessage::Barcode {
                scanner_id: ScannerId::new(1),
                barcode: "1Z12345E0205271688".to_string(),
                status: true,
            }
        );
    }

    #[test]
    fn test_parse_status_defaults_to_false() {
        let msg = parse_frame(r#"{"messageType":"detached","scannerId":2}"#).unwrap();
        assert_eq!(
            msg,
            ScannerMessage::Detached {
                scanner_id: ScannerId::new(2),
                status: false,
            }
        );
    }

    #[test]
    fn test_parse_rejects_oversized_frame() {
        let raw = " ".repeat(MAX_FRAME_SIZE + 1);
        assert!(matches!(
            parse_frame(&raw),
            Err(Error::FrameTooLarge { .. })
        ));
    }

    #[test]
    fn test_encode_command() {
        let frame = encode_command(&ScannerCommand::image_mode(Some(ScannerId::new(1)))).unwrap();
        assert_eq!(frame, r#"{"scannerId":1,"commandType":"image_mode"}"#);
    }
}
