//! Two-way bindings between control widgets and configuration values.
//!
//! This module provides:
//! - `BoundRange` - slider + numeric text pair with clamping
//! - `RangeSet` - every declared range control, keyed by name
//! - `ToggleSet` - named boolean switches
//!
//! Mutating operations return the committed value (or a changed flag); the
//! caller decides what a commit triggers.

mod range;
mod toggle;

use std::collections::BTreeMap;

pub use range::{parse_leading_int, BoundRange};
pub use toggle::ToggleSet;

use crate::configuration::{DisplayBounds, RangeName};

/// All declared range controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeSet {
    controls: BTreeMap<RangeName, BoundRange>,
}

impl RangeSet {
    /// Every control at its markup default and markup bounds.
    pub fn with_defaults() -> Self {
        Self {
            controls: RangeName::ALL
                .into_iter()
                .map(|name| (name, BoundRange::new(name, name.spec())))
                .collect(),
        }
    }

    pub fn get(&self, name: RangeName) -> &BoundRange {
        &self.controls[&name]
    }

    pub fn get_mut(&mut self, name: RangeName) -> &mut BoundRange {
        self.controls
            .entry(name)
            .or_insert_with(|| BoundRange::new(name, name.spec()))
    }

    pub fn value(&self, name: RangeName) -> i64 {
        self.get(name).value()
    }

    /// Narrow the display-bound controls to the detected resolution.
    pub fn apply_display(&mut self, display: DisplayBounds) {
        for (name, control) in self.controls.iter_mut() {
            let spec = name.spec();
            if spec.display_axis.is_some() {
                control.set_bounds(spec.min, spec.max_for(display));
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &BoundRange> {
        self.controls.values()
    }
}

impl Default for RangeSet {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_set_covers_all_names() {
        let set = RangeSet::with_defaults();
        let names: Vec<_> = set.iter().map(|r| r.name()).collect();
        assert_eq!(names, RangeName::ALL.to_vec());
    }

    #[test]
    fn test_apply_display_only_touches_bound_controls() {
        let mut set = RangeSet::with_defaults();
        set.apply_display(DisplayBounds::new(800, 600));
        assert_eq!(set.get(RangeName::RangeWidth).bounds(), (1, 800));
        assert_eq!(set.get(RangeName::RangeHeight).bounds(), (1, 600));
        assert_eq!(set.get(RangeName::AimSpeed).bounds(), (1, 200));
    }
}
