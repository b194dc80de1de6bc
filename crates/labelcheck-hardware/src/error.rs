//! Error types for keyboard-wedge input.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur while reading key events.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Key source is closed or has been disconnected.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HardwareError {
    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disconnected_error() {
        let error = HardwareError::disconnected("stdin");
        assert!(matches!(error, HardwareError::Disconnected { .. }));
        assert_eq!(error.to_string(), "Device disconnected: stdin");
    }

    #[test]
    fn test_io_error_converts() {
        let error: HardwareError =
            std::io::Error::new(std::io::ErrorKind::BrokenPipe, "tty gone").into();
        assert_eq!(error.to_string(), "I/O error: tty gone");
    }
}
