//! Operator feedback surface.

use std::sync::{Arc, Mutex, PoisonError};

/// Where the orchestrator reports outcomes to the operator.
///
/// Calls are fire-and-forget: implementations must not block, and nothing
/// they do can alter the capture state.
pub trait Feedback {
    fn notify_success(&self, message: &str);
    fn notify_error(&self, message: &str);
    fn play_success_cue(&self);
    fn play_error_cue(&self);
}

impl<F: Feedback + ?Sized> Feedback for &F {
    fn notify_success(&self, message: &str) {
        (**self).notify_success(message);
    }

    fn notify_error(&self, message: &str) {
        (**self).notify_error(message);
    }

    fn play_success_cue(&self) {
        (**self).play_success_cue();
    }

    fn play_error_cue(&self) {
        (**self).play_error_cue();
    }
}

/// One call recorded by [`RecordingFeedback`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackEvent {
    Success(String),
    Error(String),
    SuccessCue,
    ErrorCue,
}

/// Feedback sink that records every call, for tests and headless runs.
///
/// Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingFeedback {
    events: Arc<Mutex<Vec<FeedbackEvent>>>,
}

impl RecordingFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded calls, oldest first.
    pub fn events(&self) -> Vec<FeedbackEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drain the recorded calls.
    pub fn take(&self) -> Vec<FeedbackEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn errors(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                FeedbackEvent::Error(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: FeedbackEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl Feedback for RecordingFeedback {
    fn notify_success(&self, message: &str) {
        self.record(FeedbackEvent::Success(message.to_string()));
    }

    fn notify_error(&self, message: &str) {
        self.record(FeedbackEvent::Error(message.to_string()));
    }

    fn play_success_cue(&self) {
        self.record(FeedbackEvent::SuccessCue);
    }

    fn play_error_cue(&self) {
        self.record(FeedbackEvent::ErrorCue);
    }
}
