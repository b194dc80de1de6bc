//! Capture-validation workflow for a label inspection station.
//!
//! A station pairs a scanned tracking number with a photo of the shipping
//! label and asks the validation service whether the label matches the
//! expected address. This crate holds the workflow:
//!
//! - [`StateMachine`]: the `Idle → Validating → Idle | Invalid` cycle
//! - [`CaptureSession`]: barcode, image and result of the current cycle
//! - [`ScanOrchestrator`]: turns inputs into session updates and [`Action`]s
//! - [`Runtime`]: tokio event loop that executes those actions
//!
//! # Example
//!
//! ```
//! use labelcheck_core::ImagePayload;
//! use labelcheck_orchestrator::{
//!     Action, CaptureState, OrchestratorConfig, RecordingFeedback, ScanOrchestrator,
//! };
//!
//! let mut orchestrator =
//!     ScanOrchestrator::new(OrchestratorConfig::default(), RecordingFeedback::new());
//!
//! let action = orchestrator.handle_manual_capture(ImagePayload::new("/9j/4AAQ").unwrap());
//! assert!(matches!(action, Some(Action::Validate(_))));
//! assert_eq!(orchestrator.state(), CaptureState::Validating);
//! ```

pub mod feedback;
pub mod orchestrator;
pub mod roster;
pub mod runtime;
pub mod session;
pub mod state_machine;

pub use feedback::{Feedback, FeedbackEvent, RecordingFeedback};
pub use orchestrator::{Action, OrchestratorConfig, ScanOrchestrator, ValidationTicket};
pub use roster::{ScannerEntry, ScannerRoster};
pub use runtime::{CommandSink, OperatorAction, Runtime, RuntimeInputs, SessionView};
pub use session::CaptureSession;
pub use state_machine::{CaptureState, StateMachine, StateTransition};
