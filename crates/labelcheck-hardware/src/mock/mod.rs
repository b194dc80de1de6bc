//! Mock key sources for testing and development.
//!
//! These sources can be driven programmatically without a terminal or a
//! physical scanner.

pub mod keyboard;

pub use keyboard::{MockKeySource, MockKeySourceHandle};
