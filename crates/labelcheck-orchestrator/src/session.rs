//! The live capture session.
//!
//! One session exists per station. Its fields are overwritten every cycle and
//! nothing is kept across cycles.

use chrono::{DateTime, Utc};
use labelcheck_core::{
    CycleId, ImagePayload, Result, ScannerId, TrackingNumber, ValidationRequest, ValidationResult,
};

use crate::state_machine::{CaptureState, StateMachine, StateTransition};

/// Capture-validation session owned by the orchestrator.
#[derive(Debug, Default)]
pub struct CaptureSession {
    machine: StateMachine,
    barcode: Option<TrackingNumber>,
    scanner_id: Option<ScannerId>,
    image: Option<ImagePayload>,
    result: Option<ValidationResult>,
    cycle: Option<CycleId>,
    cycle_started_at: Option<DateTime<Utc>>,
}

impl CaptureSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CaptureState {
        self.machine.current_state()
    }

    pub fn machine(&self) -> &StateMachine {
        &self.machine
    }

    /// Most recently decoded tracking number.
    pub fn barcode(&self) -> Option<&TrackingNumber> {
        self.barcode.as_ref()
    }

    /// Scanner that produced [`barcode`](Self::barcode), if known.
    pub fn scanner_id(&self) -> Option<ScannerId> {
        self.scanner_id
    }

    pub fn image(&self) -> Option<&ImagePayload> {
        self.image.as_ref()
    }

    pub fn result(&self) -> Option<&ValidationResult> {
        self.result.as_ref()
    }

    /// Identifier of the validation currently in flight or last completed.
    pub fn cycle(&self) -> Option<CycleId> {
        self.cycle
    }

    /// When the current cycle's validation was issued.
    pub fn cycle_started_at(&self) -> Option<DateTime<Utc>> {
        self.cycle_started_at
    }

    /// Record the pending barcode. Never changes state.
    pub fn bind_barcode(&mut self, barcode: TrackingNumber, scanner_id: Option<ScannerId>) {
        self.barcode = Some(barcode);
        self.scanner_id = scanner_id;
    }

    /// Enter `Validating` with `image` and the pending barcode.
    ///
    /// # Errors
    ///
    /// Fails without touching the session unless the state is `Idle`.
    pub fn begin_validation(
        &mut self,
        image: ImagePayload,
    ) -> Result<(CycleId, ValidationRequest)> {
        self.machine.transition_to(CaptureState::Validating)?;

        let cycle = CycleId::new();
        let request = ValidationRequest::new(self.barcode.clone(), image.clone());

        self.image = Some(image);
        self.result = None;
        self.cycle = Some(cycle);
        self.cycle_started_at = Some(Utc::now());

        Ok((cycle, request))
    }

    /// Apply a validation result.
    ///
    /// A valid label returns the session to `Idle` and clears the barcode,
    /// image and result. An invalid label moves to `Invalid` and keeps the
    /// triggering image and the result.
    pub fn complete(&mut self, result: ValidationResult) -> Result<StateTransition> {
        let target = if result.valid {
            CaptureState::Idle
        } else {
            CaptureState::Invalid
        };
        let transition = self.machine.transition_to(target)?;

        if result.valid {
            self.barcode = None;
            self.scanner_id = None;
            self.image = None;
            self.result = None;
            self.cycle_started_at = None;
        } else {
            self.result = Some(result);
        }

        Ok(transition)
    }

    /// The validation call failed: back to `Idle` without a result.
    ///
    /// The pending barcode is kept so the operator can capture again.
    pub fn fail(&mut self) -> Result<StateTransition> {
        let transition = self.machine.transition_to(CaptureState::Idle)?;
        self.image = None;
        self.result = None;
        self.cycle_started_at = None;
        Ok(transition)
    }

    /// Leave `Invalid`, discarding the stored image and result.
    pub fn dismiss(&mut self) -> Result<StateTransition> {
        if self.state() != CaptureState::Invalid {
            return Err(labelcheck_core::Error::InvalidStateTransition {
                from: self.state().to_string(),
                to: CaptureState::Idle.to_string(),
            });
        }
        let transition = self.machine.transition_to(CaptureState::Idle)?;
        self.image = None;
        self.result = None;
        self.cycle_started_at = None;
        Ok(transition)
    }
}
