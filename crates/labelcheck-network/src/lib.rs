//! Network layer for the label check station.
//!
//! # Components
//!
//! - **ScannerTransport**: persistent websocket channel to the scanner hub,
//!   with constant-interval reconnection and in-order event delivery
//! - **HttpValidationClient**: JSON client for the label validation service,
//!   behind the [`LabelValidator`] trait
//!
//! # Example
//!
//! ```no_run
//! use labelcheck_network::{ConnectionState, ScannerTransport, ScannerTransportConfig, TransportEvent};
//! use labelcheck_protocol::ScannerCommand;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let (transport, mut events) = ScannerTransport::spawn(ScannerTransportConfig::default())?;
//!
//! while let Some(event) = events.recv().await {
//!     if let TransportEvent::StateChanged(ConnectionState::Open) = event {
//!         transport.send(ScannerCommand::image_mode(None)).await?;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod transport;
mod validation;

pub use transport::{
    ConnectionState, ScannerTransport, ScannerTransportConfig, TransportError, TransportEvent,
    TransportEvents, TransportHandle,
};
pub use validation::{HttpValidationClient, LabelValidator, ValidationClientConfig, ValidationError};
