//! Hotkey capture state machine.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use super::keys::{chord_from_event, display_chord, is_modifier_key, ChordKey, KeyDown};

/// Field text while waiting for the first key.
pub const CAPTURE_PROMPT: &str = "Press the desired combination...";

/// Placeholder shown when no hotkey is set.
pub const EMPTY_PLACEHOLDER: &str = "Click to set hotkey";

/// Capability to grab keyboard input ahead of normal handling.
///
/// While installed, the front end routes every key press to the capture
/// machine and suppresses its default effect.
pub trait KeyInterceptor: Send {
    fn install(&mut self);
    fn remove(&mut self);
}

/// Interceptor backed by a shared flag the front end polls each frame.
#[derive(Debug, Clone, Default)]
pub struct InterceptFlag(Arc<AtomicBool>);

impl InterceptFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl KeyInterceptor for InterceptFlag {
    fn install(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }

    fn remove(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Capturing,
}

/// Transient state of one recording.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureSession {
    pub pressed: BTreeSet<ChordKey>,
    pub display: String,
}

/// What a key press did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Not capturing; the key belongs to normal handling.
    Ignored,
    /// Capture continues; the key was consumed.
    Updated,
    /// A non-modifier key completed the chord; the new hotkey is returned.
    Captured(String),
}

impl KeyOutcome {
    /// Whether the key's default handling must be suppressed.
    pub fn suppresses_default(&self) -> bool {
        !matches!(self, KeyOutcome::Ignored)
    }
}

/// Records a single key chord into a display string like `"Ctrl + Alt + X"`.
pub struct HotkeyCapture {
    state: CaptureState,
    session: CaptureSession,
    committed: String,
    interceptor: Box<dyn KeyInterceptor>,
}

impl HotkeyCapture {
    pub fn new(committed: impl Into<String>, interceptor: Box<dyn KeyInterceptor>) -> Self {
        Self {
            state: CaptureState::Idle,
            session: CaptureSession::default(),
            committed: committed.into(),
            interceptor,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_capturing(&self) -> bool {
        self.state == CaptureState::Capturing
    }

    /// The hotkey as it would be persisted.
    pub fn hotkey(&self) -> &str {
        &self.committed
    }

    pub fn session(&self) -> &CaptureSession {
        &self.session
    }

    /// Text the hotkey field shows right now.
    pub fn field_text(&self) -> &str {
        match self.state {
            CaptureState::Capturing if self.session.display.is_empty() => CAPTURE_PROMPT,
            CaptureState::Capturing => &self.session.display,
            CaptureState::Idle if self.committed.is_empty() => EMPTY_PLACEHOLDER,
            CaptureState::Idle => &self.committed,
        }
    }

    /// Programmatic set from a loaded configuration. A capture in progress
    /// keeps its session display.
    pub fn apply(&mut self, hotkey: impl Into<String>) {
        self.committed = hotkey.into();
        if self.is_capturing() {
            debug!(hotkey = %self.committed, "Hotkey loaded during capture");
        }
    }

    /// Activation gesture on the hotkey field: `Idle -> Capturing`.
    pub fn begin(&mut self) {
        if self.is_capturing() {
            return;
        }
        self.session = CaptureSession::default();
        self.state = CaptureState::Capturing;
        self.interceptor.install();
        debug!("Hotkey capture started");
    }

    /// Key press. A non-modifier key completes the chord on this same press.
    pub fn key_down(&mut self, event: &KeyDown) -> KeyOutcome {
        if !self.is_capturing() {
            return KeyOutcome::Ignored;
        }

        let chord = chord_from_event(event);
        if !chord.is_empty() {
            self.session.display = display_chord(&chord);
            self.session.pressed = chord;
        }

        if is_modifier_key(&event.key) {
            KeyOutcome::Updated
        } else {
            KeyOutcome::Captured(self.finish())
        }
    }

    /// Click anywhere other than the hotkey field. Returns the hotkey when
    /// this ended a capture.
    pub fn click_outside(&mut self) -> Option<String> {
        self.is_capturing().then(|| self.finish())
    }

    /// `Capturing -> Idle`. An empty session clears the hotkey.
    fn finish(&mut self) -> String {
        self.interceptor.remove();
        self.state = CaptureState::Idle;

        self.committed = std::mem::take(&mut self.session).display;
        info!(hotkey = %self.committed, "Hotkey capture finished");
        self.committed.clone()
    }
}

impl std::fmt::Debug for HotkeyCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HotkeyCapture")
            .field("state", &self.state)
            .field("session", &self.session)
            .field("committed", &self.committed)
            .finish_non_exhaustive()
    }
}
