//! Key event types and the key source trait.
//!
//! A keyboard-wedge scanner is indistinguishable from a keyboard: it produces
//! the same key events a person typing would. [`KeyEvent`] models those events
//! the way a browser `KeyboardEvent.key` does, where a printable key is a
//! single character and everything else has a multi-character name.
//!
//! All traits use native `async fn` methods (Rust 1.90 + Edition 2024 RPITIT),
//! eliminating the need for the `async_trait` macro.

#![allow(async_fn_in_trait)]

use crate::error::Result;

/// Non-character key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum NamedKey {
    Enter,
    Tab,
    Backspace,
    Escape,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Shift,
    Control,
    Alt,
    Meta,

    /// Any other named key (`F1`, `CapsLock`, ...).
    Other(String),
}

impl NamedKey {
    fn from_name(name: &str) -> Self {
        match name {
            "Enter" => Self::Enter,
            "Tab" => Self::Tab,
            "Backspace" => Self::Backspace,
            "Escape" => Self::Escape,
            "ArrowUp" => Self::ArrowUp,
            "ArrowDown" => Self::ArrowDown,
            "ArrowLeft" => Self::ArrowLeft,
            "ArrowRight" => Self::ArrowRight,
            "Shift" => Self::Shift,
            "Control" => Self::Control,
            "Alt" => Self::Alt,
            "Meta" => Self::Meta,
            other => Self::Other(other.to_string()),
        }
    }
}

/// One key press.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyEvent {
    /// Single-character key. Only these reach the wedge accumulator.
    Char(char),

    /// Control, modifier or navigation key.
    Named(NamedKey),
}

impl KeyEvent {
    /// Classify a key name: exactly one character is a `Char`, anything
    /// longer (or empty) is a `Named` key.
    ///
    /// # Examples
    ///
    /// ```
    /// use labelcheck_hardware::traits::{KeyEvent, NamedKey};
    ///
    /// assert_eq!(KeyEvent::from_key("Z"), KeyEvent::Char('Z'));
    /// assert_eq!(KeyEvent::from_key("ArrowLeft"), KeyEvent::Named(NamedKey::ArrowLeft));
    /// ```
    pub fn from_key(key: &str) -> Self {
        let mut chars = key.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::Char(c),
            _ => Self::Named(NamedKey::from_name(key)),
        }
    }

    /// Map a character read from a byte stream (terminal, tty) to a key event.
    ///
    /// Line terminators become `Enter`, other control characters become named
    /// keys so they never pollute the accumulator.
    pub fn from_stream_char(c: char) -> Self {
        match c {
            '\n' | '\r' => Self::Named(NamedKey::Enter),
            '\t' => Self::Named(NamedKey::Tab),
            '\u{8}' | '\u{7f}' => Self::Named(NamedKey::Backspace),
            '\u{1b}' => Self::Named(NamedKey::Escape),
            c if c.is_control() => Self::Named(NamedKey::Other(format!("U+{:04X}", c as u32))),
            c => Self::Char(c),
        }
    }

    /// Get the character if this is a single-character key.
    pub fn as_char(&self) -> Option<char> {
        match self {
            Self::Char(c) => Some(*c),
            Self::Named(_) => None,
        }
    }
}

/// Source of key events (a terminal, a tty, a test double).
///
/// # Object Safety and Dynamic Dispatch
///
/// This trait is NOT object-safe because `async fn` methods return
/// `impl Future`. Use generic parameters, or the enum wrapper in
/// [`devices`](crate::devices) for concrete dispatch.
pub trait KeySource {
    /// Wait for the next key event.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::Disconnected`](crate::HardwareError::Disconnected)
    /// once the source is exhausted.
    async fn next_key(&mut self) -> Result<KeyEvent>;

    /// Human-readable source name for logs.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1", KeyEvent::Char('1'))]
    #[case("Z", KeyEvent::Char('Z'))]
    #[case(" ", KeyEvent::Char(' '))]
    #[case("é", KeyEvent::Char('é'))]
    #[case("Enter", KeyEvent::Named(NamedKey::Enter))]
    #[case("Shift", KeyEvent::Named(NamedKey::Shift))]
    #[case("F5", KeyEvent::Named(NamedKey::Other("F5".to_string())))]
    #[case("", KeyEvent::Named(NamedKey::Other(String::new())))]
    fn test_from_key(#[case] key: &str, #[case] expected: KeyEvent) {
        assert_eq!(KeyEvent::from_key(key), expected);
    }

    #[rstest]
    #[case('A', KeyEvent::Char('A'))]
    #[case('\\', KeyEvent::Char('\\'))]
    #[case('\n', KeyEvent::Named(NamedKey::Enter))]
    #[case('\r', KeyEvent::Named(NamedKey::Enter))]
    #[case('\t', KeyEvent::Named(NamedKey::Tab))]
    #[case('\u{7f}', KeyEvent::Named(NamedKey::Backspace))]
    #[case('\u{0}', KeyEvent::Named(NamedKey::Other("U+0000".to_string())))]
    fn test_from_stream_char(#[case] c: char, #[case] expected: KeyEvent) {
        assert_eq!(KeyEvent::from_stream_char(c), expected);
    }

    #[test]
    fn test_as_char() {
        assert_eq!(KeyEvent::Char('x').as_char(), Some('x'));
        assert_eq!(KeyEvent::Named(NamedKey::Tab).as_char(), None);
    }
}
