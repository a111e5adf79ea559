//! Key codes and chord capture for macropad actions.
//!
//! This crate defines:
//! - The static key code table used to label action slots (`keycodes`)
//! - Conversion of a live key press plus modifiers into action slots (`capture`)

pub mod capture;
pub mod keycodes;

pub use capture::{build_chord_actions, is_valid_capture_key, normalize, ChordCapture, KeyEvent};
