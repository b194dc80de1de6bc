//! Terminal feedback: notification lines on stdout, the bell for cues.

use std::io::{self, Write};

use labelcheck_orchestrator::Feedback;

const BELL: &[u8] = b"\x07";

#[derive(Debug, Default)]
pub struct TerminalFeedback;

impl TerminalFeedback {
    pub fn new() -> Self {
        Self
    }

    fn ring(times: usize) {
        let mut stdout = io::stdout().lock();
        for _ in 0..times {
            let _ = stdout.write_all(BELL);
        }
        let _ = stdout.flush();
    }
}

impl Feedback for TerminalFeedback {
    fn notify_success(&self, message: &str) {
        println!("[ok] {message}");
    }

    fn notify_error(&self, message: &str) {
        println!("[error] {message}");
    }

    fn play_success_cue(&self) {
        Self::ring(1);
    }

    fn play_error_cue(&self) {
        Self::ring(2);
    }
}
