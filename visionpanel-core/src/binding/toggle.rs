//! Named boolean switches.

use std::collections::BTreeMap;

use crate::configuration::ToggleName;

/// The toggles present on the rendering surface.
///
/// A declared toggle that is missing reads as `false`, so a snapshot is
/// always fully populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleSet {
    states: BTreeMap<ToggleName, bool>,
}

impl ToggleSet {
    /// Build from the toggles actually present, with their initial states.
    pub fn new(present: impl IntoIterator<Item = (ToggleName, bool)>) -> Self {
        Self {
            states: present.into_iter().collect(),
        }
    }

    /// Every declared toggle at its markup default.
    pub fn with_defaults() -> Self {
        Self::new(ToggleName::ALL.map(|name| (name, name.default_value())))
    }

    pub fn is_present(&self, name: ToggleName) -> bool {
        self.states.contains_key(&name)
    }

    pub fn get(&self, name: ToggleName) -> bool {
        self.states.get(&name).copied().unwrap_or(false)
    }

    /// User flip. Returns `true` when the state changed (a commit).
    #[must_use]
    pub fn set(&mut self, name: ToggleName, value: bool) -> bool {
        match self.states.get_mut(&name) {
            Some(state) if *state != value => {
                *state = value;
                true
            }
            Some(_) => false,
            None => {
                tracing::warn!(toggle = %name, "Toggle not present, ignoring change");
                false
            }
        }
    }

    /// Programmatic set from a loaded configuration. Absent toggles stay absent.
    pub fn apply(&mut self, name: ToggleName, value: bool) {
        if let Some(state) = self.states.get_mut(&name) {
            *state = value;
        }
    }

    /// Toggles in declaration order, present ones only.
    pub fn iter(&self) -> impl Iterator<Item = (ToggleName, bool)> + '_ {
        self.states.iter().map(|(name, state)| (*name, *state))
    }
}

impl Default for ToggleSet {
    fn default() -> Self {
        Self::with_defaults()
    }
}
