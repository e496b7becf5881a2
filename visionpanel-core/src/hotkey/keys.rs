//! Key events and key-name canonicalization.

use std::collections::BTreeSet;

/// Modifier state carried by a key event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    /// Meta / Super / Command.
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
    };

    pub fn any(&self) -> bool {
        self.ctrl || self.alt || self.shift || self.meta
    }
}

/// A key press as reported by the front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDown {
    /// Platform key label, e.g. `"x"`, `"ArrowUp"`, `"Control"`, `"F5"`.
    pub key: String,
    pub modifiers: Modifiers,
}

impl KeyDown {
    pub fn new(key: impl Into<String>, modifiers: Modifiers) -> Self {
        Self {
            key: key.into(),
            modifiers,
        }
    }
}

/// One element of a captured chord.
///
/// Variant order is display order: modifiers first, then the main key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChordKey {
    Ctrl,
    Alt,
    Shift,
    Meta,
    Main(String),
}

impl ChordKey {
    pub fn label(&self) -> &str {
        match self {
            ChordKey::Ctrl => "Ctrl",
            ChordKey::Alt => "Alt",
            ChordKey::Shift => "Shift",
            ChordKey::Meta => "Meta",
            ChordKey::Main(name) => name,
        }
    }
}

/// Whether the key label names a modifier key itself.
pub fn is_modifier_key(key: &str) -> bool {
    matches!(
        key.to_ascii_uppercase().as_str(),
        "CONTROL" | "CTRL" | "ALT" | "SHIFT" | "META" | "SUPER" | "COMMAND" | "CMD" | "OS"
    )
}

/// Canonical display name of a non-modifier key.
///
/// Upper-cases the label and shortens arrow keys to a direction word
/// (`ArrowUp` -> `UP`). Modifiers and blank labels have no canonical name.
pub fn canonical_key_name(key: &str) -> Option<String> {
    if is_modifier_key(key) {
        return None;
    }
    let upper = key.to_uppercase().replace("ARROW", "");
    let trimmed = upper.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// The chord described by a single key event.
pub fn chord_from_event(event: &KeyDown) -> BTreeSet<ChordKey> {
    let mut chord = BTreeSet::new();
    if event.modifiers.ctrl {
        chord.insert(ChordKey::Ctrl);
    }
    if event.modifiers.alt {
        chord.insert(ChordKey::Alt);
    }
    if event.modifiers.shift {
        chord.insert(ChordKey::Shift);
    }
    if event.modifiers.meta {
        chord.insert(ChordKey::Meta);
    }
    if let Some(name) = canonical_key_name(&event.key) {
        chord.insert(ChordKey::Main(name));
    }
    chord
}

/// Render a chord as `"Ctrl + Alt + X"`.
pub fn display_chord(chord: &BTreeSet<ChordKey>) -> String {
    chord
        .iter()
        .map(ChordKey::label)
        .collect::<Vec<_>>()
        .join(" + ")
}
