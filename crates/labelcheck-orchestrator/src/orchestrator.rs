//! Scan orchestrator.
//!
//! [`ScanOrchestrator`] owns the [`CaptureSession`] and is the only thing
//! allowed to mutate it. Every input (transport events, decoded barcodes,
//! operator actions, validation completions) enters through one of its
//! `handle_*` methods, which update the session synchronously and return at
//! most one [`Action`] for the caller to perform. The orchestrator never does
//! I/O itself; [`Runtime`](crate::Runtime) executes the actions.

use labelcheck_core::constants::{
    DEFAULT_ARM_SCANNER_ID, MSG_LABEL_INVALID, MSG_LABEL_VALID, MSG_REPRINT,
};
use labelcheck_core::{CycleId, ImagePayload, ScannerId, ValidationRequest, ValidationResult};
use labelcheck_hardware::{DecodedBarcode, match_tracking_number};
use labelcheck_network::{ConnectionState, TransportEvent, ValidationError};
use labelcheck_protocol::{ScannerCommand, ScannerMessage, parse_frame};
use tracing::{debug, info, warn};

use crate::feedback::Feedback;
use crate::roster::ScannerRoster;
use crate::session::CaptureSession;
use crate::state_machine::CaptureState;

/// Orchestrator behavior knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Send `image_mode` whenever the channel opens, a scanner attaches, or
    /// the session returns to idle.
    pub arm_on_connect: bool,

    /// Scanner armed on connect. `None` addresses the hub's current scanner.
    pub arm_scanner: Option<ScannerId>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            arm_on_connect: true,
            arm_scanner: Some(ScannerId::new(DEFAULT_ARM_SCANNER_ID)),
        }
    }
}

/// A validation the caller must run and report back with
/// [`ScanOrchestrator::handle_validation_complete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationTicket {
    pub cycle: CycleId,
    pub request: ValidationRequest,
}

/// Side effect requested by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Send a fire-and-forget command to the scanner hub.
    SendCommand(ScannerCommand),

    /// Issue a validation request.
    Validate(ValidationTicket),
}

/// Drives the capture-validation workflow.
#[derive(Debug)]
pub struct ScanOrchestrator<F> {
    config: OrchestratorConfig,
    session: CaptureSession,
    roster: ScannerRoster,
    connection: ConnectionState,
    feedback: F,
}

impl<F: Feedback> ScanOrchestrator<F> {
    pub fn new(config: OrchestratorConfig, feedback: F) -> Self {
        Self {
            config,
            session: CaptureSession::new(),
            roster: ScannerRoster::new(),
            connection: ConnectionState::Closed,
            feedback,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.session.state()
    }

    pub fn session(&self) -> &CaptureSession {
        &self.session
    }

    pub fn roster(&self) -> &ScannerRoster {
        &self.roster
    }

    /// Last connection state reported by the transport.
    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn feedback(&self) -> &F {
        &self.feedback
    }

    pub fn handle_transport_event(&mut self, event: TransportEvent) -> Option<Action> {
        match event {
            TransportEvent::StateChanged(state) => self.handle_connection_state(state),
            TransportEvent::Message(message) => self.handle_message(message),
            TransportEvent::Malformed { error, raw_len } => {
                self.report_malformed(&error, raw_len);
                None
            }
        }
    }

    /// Decode and handle a raw inbound frame.
    ///
    /// Frames that fail to decode are reported and dropped; the session is
    /// left untouched.
    pub fn handle_frame(&mut self, raw: &str) -> Option<Action> {
        match parse_frame(raw) {
            Ok(message) => self.handle_message(message),
            Err(error) => {
                self.report_malformed(&error, raw.len());
                None
            }
        }
    }

    pub fn handle_message(&mut self, message: ScannerMessage) -> Option<Action> {
        match message {
            ScannerMessage::Response { scanner_id, status } => {
                debug!(scanner_id = %scanner_id, status, "Command acknowledged");
                None
            }
            ScannerMessage::Barcode {
                scanner_id,
                barcode,
                ..
            } => match match_tracking_number(&barcode) {
                Some(tracking_number) => self.handle_decoded_barcode(
                    DecodedBarcode::from_transport(scanner_id, tracking_number),
                ),
                None => {
                    debug!(
                        scanner_id = %scanner_id,
                        len = barcode.len(),
                        "Barcode is not a tracking number"
                    );
                    None
                }
            },
            ScannerMessage::Image {
                scanner_id, image, ..
            } => self.begin_capture(image, Some(scanner_id)),
            ScannerMessage::Attached { scanner_id, .. } => {
                if self.roster.attach(scanner_id) {
                    info!(scanner_id = %scanner_id, "Scanner attached");
                }
                (self.config.arm_on_connect && self.connection == ConnectionState::Open)
                    .then(|| Action::SendCommand(ScannerCommand::image_mode(Some(scanner_id))))
            }
            ScannerMessage::Detached { scanner_id, .. } => {
                if self.roster.detach(scanner_id) {
                    info!(scanner_id = %scanner_id, "Scanner detached");
                }
                None
            }
            ScannerMessage::ScannerList { scanners } => {
                self.roster.replace(&scanners);
                debug!(count = self.roster.len(), "Scanner roster replaced");
                None
            }
        }
    }

    pub fn handle_connection_state(&mut self, state: ConnectionState) -> Option<Action> {
        let previous = std::mem::replace(&mut self.connection, state);
        if previous == state {
            return None;
        }
        info!(from = %previous, to = %state, "Scanner connection changed");

        if state == ConnectionState::Open && self.config.arm_on_connect {
            return Some(Action::SendCommand(ScannerCommand::image_mode(
                self.config.arm_scanner,
            )));
        }
        None
    }

    /// Bind a decoded barcode to the session.
    ///
    /// The state never changes. When idle and the barcode came from a known
    /// scanner, that scanner is asked to capture so the next image belongs to
    /// the same device.
    pub fn handle_decoded_barcode(&mut self, decoded: DecodedBarcode) -> Option<Action> {
        info!(
            tracking_number = %decoded.tracking_number,
            source = ?decoded.source,
            state = %self.state(),
            "Barcode decoded"
        );
        self.session
            .bind_barcode(decoded.tracking_number, decoded.scanner_id);

        match decoded.scanner_id {
            Some(scanner_id) if self.state().accepts_capture() => Some(Action::SendCommand(
                ScannerCommand::image_capture(scanner_id),
            )),
            _ => None,
        }
    }

    /// Start validation with an operator-supplied photo.
    pub fn handle_manual_capture(&mut self, image: ImagePayload) -> Option<Action> {
        self.begin_capture(image, None)
    }

    /// Apply the outcome of the validation issued for `cycle`.
    ///
    /// Completions for any other cycle are stale and ignored.
    pub fn handle_validation_complete(
        &mut self,
        cycle: CycleId,
        outcome: Result<ValidationResult, ValidationError>,
    ) -> Option<Action> {
        if self.state() != CaptureState::Validating || self.session.cycle() != Some(cycle) {
            debug!(cycle = %cycle, state = %self.state(), "Ignoring stale validation result");
            return None;
        }

        match outcome {
            Ok(result) => {
                let valid = result.valid;
                let transition = match self.session.complete(result) {
                    Ok(transition) => transition,
                    Err(error) => {
                        warn!(error = %error, "Could not apply validation result");
                        return None;
                    }
                };
                let elapsed_ms = transition.dwell.as_millis() as u64;

                if valid {
                    info!(cycle = %cycle, elapsed_ms, "Label valid");
                    self.feedback.play_success_cue();
                    self.feedback.notify_success(MSG_LABEL_VALID);
                    self.rearm()
                } else {
                    info!(cycle = %cycle, elapsed_ms, "Label invalid");
                    self.feedback.play_error_cue();
                    self.feedback.notify_error(MSG_LABEL_INVALID);
                    None
                }
            }
            Err(error) => {
                let elapsed = self.session.machine().time_in_current_state();
                let elapsed_ms = elapsed.as_millis() as u64;
                warn!(cycle = %cycle, elapsed_ms, error = %error, "Validation failed");
                if let Err(error) = self.session.fail() {
                    warn!(error = %error, "Could not leave validating state");
                    return None;
                }
                self.feedback.notify_error(&error.to_string());
                self.rearm()
            }
        }
    }

    /// Discard an invalid result and return to idle.
    pub fn retry(&mut self) -> Option<Action> {
        match self.session.dismiss() {
            Ok(_) => {
                info!("Retry requested");
                self.rearm()
            }
            Err(_) => {
                debug!(state = %self.state(), "Nothing to retry");
                None
            }
        }
    }

    /// Same reset as [`retry`](Self::retry), announced as a reprint.
    pub fn reprint(&mut self) -> Option<Action> {
        match self.session.dismiss() {
            Ok(_) => {
                info!(barcode = ?self.session.barcode(), "Reprint requested");
                self.feedback.notify_success(MSG_REPRINT);
                self.rearm()
            }
            Err(_) => {
                debug!(state = %self.state(), "Nothing to reprint");
                None
            }
        }
    }

    /// Arm a scanner for image capture, defaulting to the configured one.
    pub fn arm(&mut self, scanner_id: Option<ScannerId>) -> Option<Action> {
        Some(Action::SendCommand(ScannerCommand::image_mode(
            scanner_id.or(self.config.arm_scanner),
        )))
    }

    fn begin_capture(
        &mut self,
        image: ImagePayload,
        scanner_id: Option<ScannerId>,
    ) -> Option<Action> {
        if !self.state().accepts_capture() {
            debug!(
                scanner_id = ?scanner_id,
                state = %self.state(),
                "Ignoring image while not idle"
            );
            return None;
        }

        match self.session.begin_validation(image) {
            Ok((cycle, request)) => {
                info!(
                    cycle = %cycle,
                    scanner_id = ?scanner_id,
                    tracking_number = ?request.tracking_number,
                    image_len = request.image.len(),
                    "Validating label"
                );
                Some(Action::Validate(ValidationTicket { cycle, request }))
            }
            Err(error) => {
                warn!(error = %error, "Could not start validation");
                None
            }
        }
    }

    fn rearm(&self) -> Option<Action> {
        (self.config.arm_on_connect && self.connection == ConnectionState::Open)
            .then(|| Action::SendCommand(ScannerCommand::image_mode(self.config.arm_scanner)))
    }

    fn report_malformed(&self, error: &labelcheck_core::Error, raw_len: usize) {
        warn!(error = %error, raw_len, "Discarding scanner message");
        self.feedback
            .notify_error(&format!("Discarded scanner message: {error}"));
    }
}
