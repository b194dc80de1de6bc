use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Protocol errors
    #[error("Invalid message format: {0}")]
    InvalidMessageFormat(String),

    #[error("Invalid JSON frame: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Missing messageType tag")]
    MissingMessageType,

    #[error("Unknown messageType: {0}")]
    UnknownMessageType(String),

    #[error("Frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: usize, max: usize },

    // Domain value errors
    #[error("Invalid tracking number: {0}")]
    InvalidTrackingNumber(String),

    #[error("Invalid scanner id: {0}")]
    InvalidScannerId(String),

    #[error("Invalid image payload: {0}")]
    InvalidImage(String),

    // State machine errors
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },
}

pub type Result<T> = std::result::Result<T, Error>;
