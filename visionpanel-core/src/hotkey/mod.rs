//! Global hotkey recording.
//!
//! This module provides:
//! - `HotkeyCapture` - the Idle/Capturing state machine
//! - `KeyInterceptor` - capability to grab keys ahead of normal handling
//! - pure key-name canonicalization used to build display strings
//!
//! A captured hotkey is identified by its display string alone.

mod capture;
mod keys;

pub use capture::{
    CaptureSession, CaptureState, HotkeyCapture, InterceptFlag, KeyInterceptor, KeyOutcome,
    CAPTURE_PROMPT, EMPTY_PLACEHOLDER,
};
pub use keys::{
    canonical_key_name, chord_from_event, display_chord, is_modifier_key, ChordKey, KeyDown,
    Modifiers,
};
