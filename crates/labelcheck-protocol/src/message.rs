//! Inbound scanner hub messages.
//!
//! Every frame carries exactly one `messageType` tag and only the fields that
//! belong to it:
//!
//! | tag | fields |
//! |-----|--------|
//! | `response` | scannerId, status |
//! | `barcode` | scannerId, barcode, status |
//! | `image` | scannerId, image, status |
//! | `attached` / `detached` | scannerId, status |
//! | `scanner_list` | scanners |

use std::fmt;
use std::str::FromStr;

use labelcheck_core::{Error, ImagePayload, Result, ScannerId};
use serde::{Deserialize, Serialize};

/// Roster entry inside a `scanner_list` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannerInfo {
    pub scanner_id: ScannerId,
    #[serde(default)]
    pub status: String,
}

/// Message pushed by the scanner hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "messageType",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum ScannerMessage {
    /// Command acknowledgment.
    Response {
        scanner_id: ScannerId,
        #[serde(default)]
        status: bool,
    },

    /// The device decoded a barcode in hardware, or forwarded keystroke text.
    Barcode {
        scanner_id: ScannerId,
        barcode: String,
        #[serde(default)]
        status: bool,
    },

    /// The device captured an image.
    Image {
        scanner_id: ScannerId,
        image: ImagePayload,
        #[serde(default)]
        status: bool,
    },

    /// A scanner was plugged in.
    Attached {
        scanner_id: ScannerId,
        #[serde(default)]
        status: bool,
    },

    /// A scanner was removed.
    Detached {
        scanner_id: ScannerId,
        #[serde(default)]
        status: bool,
    },

    /// Snapshot of every scanner known to the hub.
    ScannerList {
        #[serde(default)]
        scanners: Vec<ScannerInfo>,
    },
}

impl ScannerMessage {
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::Response { .. } => MessageType::Response,
            Self::Barcode { .. } => MessageType::Barcode,
            Self::Image { .. } => MessageType::Image,
            Self::Attached { .. } => MessageType::Attached,
            Self::Detached { .. } => MessageType::Detached,
            Self::ScannerList { .. } => MessageType::ScannerList,
        }
    }

    /// Originating scanner, if the variant names one.
    pub fn scanner_id(&self) -> Option<ScannerId> {
        match self {
            Self::Response { scanner_id, .. }
            | Self::Barcode { scanner_id, .. }
            | Self::Image { scanner_id, .. }
            | Self::Attached { scanner_id, .. }
            | Self::Detached { scanner_id, .. } => Some(*scanner_id),
            Self::ScannerList { .. } => None,
        }
    }
}

/// Tag values accepted in the `messageType` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    Response,
    Barcode,
    Image,
    Attached,
    Detached,
    ScannerList,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Response => "response",
            Self::Barcode => "barcode",
            Self::Image => "image",
            Self::Attached => "attached",
            Self::Detached => "detached",
            Self::ScannerList => "scanner_list",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "response" => Ok(Self::Response),
            "barcode" => Ok(Self::Barcode),
            "image" => Ok(Self::Image),
            "attached" => Ok(Self::Attached),
            "detached" => Ok(Self::Detached),
            "scanner_list" => Ok(Self::ScannerList),
            other => Err(Error::UnknownMessageType(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(MessageType::Response)]
    #[case(MessageType::Barcode)]
    #[case(MessageType::Image)]
    #[case(MessageType::Attached)]
    #[case(MessageType::Detached)]
    #[case(MessageType::ScannerList)]
    fn test_message_type_tag_parses_back(#[case] kind: MessageType) {
        assert_eq!(kind.as_str().parse::<MessageType>().unwrap(), kind);
    }

    #[test]
    fn test_unknown_message_type() {
        assert!(matches!(
            "firmware".parse::<MessageType>(),
            Err(Error::UnknownMessageType(tag)) if tag == "firmware"
        ));
    }

    #[test]
    fn test_scanner_id_accessor() {
        let msg = ScannerMessage::Attached {
            scanner_id: ScannerId::new(4),
            status: true,
        };
        assert_eq!(msg.scanner_id(), Some(ScannerId::new(4)));
        assert_eq!(msg.message_type(), MessageType::Attached);

        let list = ScannerMessage::ScannerList { scanners: vec![] };
        assert_eq!(list.scanner_id(), None);
    }

    #[test]
    fn test_serialized_tag_matches_message_type() {
        let msg = ScannerMessage::Barcode {
            scanner_id: ScannerId::new(1),
            barcode: "1Z12345E0205271688".to_string(),
            status: true,
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["messageType"], "barcode");
        assert_eq!(value["scannerId"], 1);
    }
}
