//! Capture state machine.
//!
//! # States
//!
//! - `Idle`: waiting for a scan and an image
//! - `Validating`: one validation request is in flight
//! - `Invalid`: the last label failed validation, result kept for display
//!
//! # Valid Transitions
//!
//! - Idle → Validating (image pushed by a scanner, or manual capture)
//! - Validating → Idle (label valid, or the validation call failed)
//! - Validating → Invalid (label invalid)
//! - Invalid → Idle (retry or reprint)
//!
//! There is no Validating → Validating edge: a second image while a request
//! is in flight is refused by the machine itself.
//!
//! # Examples
//!
//! ```
//! use labelcheck_orchestrator::{CaptureState, StateMachine};
//!
//! let mut machine = StateMachine::new();
//! assert_eq!(machine.current_state(), CaptureState::Idle);
//!
//! let transition = machine.transition_to(CaptureState::Validating).unwrap();
//! assert_eq!(transition.from, CaptureState::Idle);
//! assert!(machine.transition_to(CaptureState::Validating).is_err());
//! ```

use std::fmt;
use std::time::{Duration, Instant};

use labelcheck_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Phase of the capture-validation workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureState {
    /// Waiting for a scan and an image.
    #[default]
    Idle,

    /// A validation request is in flight.
    Validating,

    /// The label failed validation; the image and result are retained.
    Invalid,
}

impl fmt::Display for CaptureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state_str = match self {
            CaptureState::Idle => "Idle",
            CaptureState::Validating => "Validating",
            CaptureState::Invalid => "Invalid",
        };
        write!(f, "{}", state_str)
    }
}

impl CaptureState {
    /// Check if transition to target state is valid from this state.
    ///
    /// # Examples
    ///
    /// ```
    /// use labelcheck_orchestrator::CaptureState;
    ///
    /// assert!(CaptureState::Idle.can_transition_to(&CaptureState::Validating));
    /// assert!(!CaptureState::Idle.can_transition_to(&CaptureState::Invalid));
    /// ```
    pub fn can_transition_to(&self, target: &CaptureState) -> bool {
        matches!(
            (self, target),
            (CaptureState::Idle, CaptureState::Validating)
                | (CaptureState::Validating, CaptureState::Idle | CaptureState::Invalid)
                | (CaptureState::Invalid, CaptureState::Idle)
        )
    }

    /// Whether a new capture may start from this state.
    pub fn accepts_capture(&self) -> bool {
        matches!(self, CaptureState::Idle)
    }
}

/// A completed state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTransition {
    pub from: CaptureState,
    pub to: CaptureState,

    /// How long the machine stayed in `from`.
    pub dwell: Duration,
}

/// State machine for the capture-validation workflow.
///
/// Enforces the transition table and times each state so callers can report
/// how long a validation took.
#[derive(Debug)]
pub struct StateMachine {
    current_state: CaptureState,
    state_entered_at: Instant,
}

impl StateMachine {
    /// Create a new state machine in the Idle state.
    pub fn new() -> Self {
        Self {
            current_state: CaptureState::Idle,
            state_entered_at: Instant::now(),
        }
    }

    pub fn current_state(&self) -> CaptureState {
        self.current_state
    }

    /// Get the time elapsed in the current state.
    pub fn time_in_current_state(&self) -> Duration {
        self.state_entered_at.elapsed()
    }

    /// Transition to a new state, validating the transition.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidStateTransition`] if the transition is not in
    /// the table. The machine is left unchanged.
    pub fn transition_to(&mut self, new_state: CaptureState) -> Result<StateTransition> {
        if !self.current_state.can_transition_to(&new_state) {
            return Err(Error::InvalidStateTransition {
                from: self.current_state.to_string(),
                to: new_state.to_string(),
            });
        }

        let transition = StateTransition {
            from: self.current_state,
            to: new_state,
            dwell: self.time_in_current_state(),
        };
        self.current_state = new_state;
        self.state_entered_at = Instant::now();

        Ok(transition)
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}
