//! Event loop around the [`ScanOrchestrator`].
//!
//! ```text
//! transport events ──┐
//! decoded barcodes ──┼──▶ Runtime ──▶ ScanOrchestrator ──▶ Action
//! operator actions ──┤       ▲                               │
//! completions ───────┘       │            SendCommand ──▶ CommandSink
//!                            └──────────── Validate ──▶ spawned LabelValidator task
//! ```
//!
//! The loop is the only place the orchestrator is touched, so the session
//! never needs a lock. Validation requests run on their own tasks and report
//! back over a completion channel; at most one is outstanding because the
//! orchestrator refuses a second capture while validating.

#![allow(async_fn_in_trait)]

use std::sync::Arc;

use chrono::{DateTime, Utc};
use labelcheck_core::constants::EVENT_CHANNEL_CAPACITY;
use labelcheck_core::{CycleId, ImagePayload, ScannerId, TrackingNumber, ValidationResult};
use labelcheck_hardware::DecodedBarcode;
use labelcheck_network::{
    ConnectionState, LabelValidator, TransportError, TransportEvent, TransportHandle,
    ValidationError,
};
use labelcheck_protocol::ScannerCommand;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::feedback::Feedback;
use crate::orchestrator::{Action, ScanOrchestrator, ValidationTicket};
use crate::state_machine::CaptureState;

/// Something that delivers commands to the scanner hub.
pub trait CommandSink {
    async fn send(&self, command: ScannerCommand) -> Result<(), TransportError>;
}

impl CommandSink for TransportHandle {
    async fn send(&self, command: ScannerCommand) -> Result<(), TransportError> {
        TransportHandle::send(self, command).await
    }
}

impl<T: CommandSink + ?Sized> CommandSink for &T {
    async fn send(&self, command: ScannerCommand) -> Result<(), TransportError> {
        (**self).send(command).await
    }
}

/// Request from the operator console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorAction {
    /// Dismiss an invalid result.
    Retry,

    /// Dismiss an invalid result after reprinting the label.
    Reprint,

    /// Validate a photo taken outside the scanner.
    ManualCapture(ImagePayload),

    /// Arm a scanner for image capture; `None` uses the configured scanner.
    Arm(Option<ScannerId>),
}

/// Input channels consumed by [`Runtime::run`].
#[derive(Debug)]
pub struct RuntimeInputs {
    pub transport: mpsc::Receiver<TransportEvent>,
    pub decoded: mpsc::Receiver<DecodedBarcode>,
    pub operator: mpsc::Receiver<OperatorAction>,
}

/// What the operator should currently see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub state: CaptureState,
    pub connection: ConnectionState,
    pub barcode: Option<TrackingNumber>,
    pub scanner_id: Option<ScannerId>,
    pub result: Option<ValidationResult>,

    /// When the photo of the current cycle was taken.
    pub captured_at: Option<DateTime<Utc>>,

    /// Scanners the hub currently reports.
    pub scanners: Vec<ScannerId>,
}

impl SessionView {
    fn capture<F: Feedback>(orchestrator: &ScanOrchestrator<F>) -> Self {
        let session = orchestrator.session();
        Self {
            state: session.state(),
            connection: orchestrator.connection(),
            barcode: session.barcode().cloned(),
            scanner_id: session.scanner_id(),
            result: session.result().cloned(),
            captured_at: session.cycle_started_at(),
            scanners: orchestrator.roster().ids().collect(),
        }
    }
}

struct Completion {
    cycle: CycleId,
    outcome: Result<ValidationResult, ValidationError>,
}

/// Owns a [`ScanOrchestrator`] and runs it against live inputs.
pub struct Runtime<F, V> {
    orchestrator: ScanOrchestrator<F>,
    validator: Arc<V>,
    completion_tx: mpsc::Sender<Completion>,
    completion_rx: mpsc::Receiver<Completion>,
    view_tx: watch::Sender<SessionView>,
}

impl<F, V> Runtime<F, V>
where
    F: Feedback,
    V: LabelValidator + 'static,
{
    pub fn new(orchestrator: ScanOrchestrator<F>, validator: V) -> Self {
        Self::with_shared_validator(orchestrator, Arc::new(validator))
    }

    pub fn with_shared_validator(orchestrator: ScanOrchestrator<F>, validator: Arc<V>) -> Self {
        let (completion_tx, completion_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (view_tx, _) = watch::channel(SessionView::capture(&orchestrator));
        Self {
            orchestrator,
            validator,
            completion_tx,
            completion_rx,
            view_tx,
        }
    }

    /// Watch the session as the loop updates it.
    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view_tx.subscribe()
    }

    pub fn orchestrator(&self) -> &ScanOrchestrator<F> {
        &self.orchestrator
    }

    /// Run until `shutdown` fires or the operator channel closes.
    ///
    /// Transport or decoder channels closing only disables that input.
    /// Returns the orchestrator so its final state can be inspected.
    pub async fn run<S: CommandSink>(
        mut self,
        sink: S,
        inputs: RuntimeInputs,
        shutdown: CancellationToken,
    ) -> ScanOrchestrator<F> {
        let RuntimeInputs {
            mut transport,
            mut decoded,
            mut operator,
        } = inputs;
        let mut transport_live = true;
        let mut decoded_live = true;

        info!("Scan runtime started");

        loop {
            let action = tokio::select! {
                biased;

                _ = shutdown.cancelled() => break,

                Some(completion) = self.completion_rx.recv() => {
                    self.orchestrator
                        .handle_validation_complete(completion.cycle, completion.outcome)
                }

                event = transport.recv(), if transport_live => match event {
                    Some(event) => self.orchestrator.handle_transport_event(event),
                    None => {
                        debug!("Transport event stream ended");
                        transport_live = false;
                        None
                    }
                },

                barcode = decoded.recv(), if decoded_live => match barcode {
                    Some(barcode) => self.orchestrator.handle_decoded_barcode(barcode),
                    None => {
                        debug!("Barcode decoder stream ended");
                        decoded_live = false;
                        None
                    }
                },

                request = operator.recv() => match request {
                    Some(request) => self.handle_operator(request),
                    None => break,
                },
            };

            self.publish();

            if let Some(action) = action {
                self.dispatch(&sink, action).await;
            }
        }

        info!(state = %self.orchestrator.state(), "Scan runtime stopped");
        self.orchestrator
    }

    fn handle_operator(&mut self, request: OperatorAction) -> Option<Action> {
        debug!(?request, "Operator action");
        match request {
            OperatorAction::Retry => self.orchestrator.retry(),
            OperatorAction::Reprint => self.orchestrator.reprint(),
            OperatorAction::ManualCapture(image) => self.orchestrator.handle_manual_capture(image),
            OperatorAction::Arm(scanner_id) => self.orchestrator.arm(scanner_id),
        }
    }

    async fn dispatch<S: CommandSink>(&self, sink: &S, action: Action) {
        match action {
            Action::SendCommand(command) => {
                if let Err(error) = sink.send(command).await {
                    warn!(
                        command = %command.command_type,
                        scanner_id = ?command.scanner_id,
                        error = %error,
                        "Dropping scanner command"
                    );
                }
            }
            Action::Validate(ticket) => self.spawn_validation(ticket),
        }
    }

    fn spawn_validation(&self, ticket: ValidationTicket) {
        let ValidationTicket { cycle, request } = ticket;
        let validator = Arc::clone(&self.validator);
        let completion_tx = self.completion_tx.clone();

        tokio::spawn(async move {
            let outcome = validator.validate(request).await;
            // The runtime may already be gone.
            let _ = completion_tx.send(Completion { cycle, outcome }).await;
        });
    }

    fn publish(&self) {
        let next = SessionView::capture(&self.orchestrator);
        self.view_tx.send_if_modified(|view| {
            if *view == next {
                false
            } else {
                *view = next;
                true
            }
        });
    }
}
