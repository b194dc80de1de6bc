//! Outbound scanner commands.

use std::fmt;

use labelcheck_core::ScannerId;
use serde::{Deserialize, Serialize};

/// Kind of command sent to the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandType {
    /// Arm a scanner so its next trigger pushes an image.
    ImageMode,

    /// Request an immediate capture from a specific scanner.
    ImageCapture,
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ImageMode => write!(f, "image_mode"),
            Self::ImageCapture => write!(f, "image_capture"),
        }
    }
}

/// Fire-and-forget command frame.
///
/// A missing `scanner_id` addresses whichever scanner the hub considers current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannerCommand {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scanner_id: Option<ScannerId>,
    pub command_type: CommandType,
}

impl ScannerCommand {
    pub fn image_mode(scanner_id: Option<ScannerId>) -> Self {
        Self {
            scanner_id,
            command_type: CommandType::ImageMode,
        }
    }

    pub fn image_capture(scanner_id: ScannerId) -> Self {
        Self {
            scanner_id: Some(scanner_id),
            command_type: CommandType::ImageCapture,
        }
    }
}
