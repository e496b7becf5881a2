//! Bound range control: a slider and a numeric text field sharing one value.

use crate::configuration::{RangeName, RangeSpec};

/// One slider/number pair.
///
/// `value` is what the slider shows and what gets persisted; `text` is the
/// numeric field. Both always agree once an edit is committed, and `value`
/// never leaves `[min, max]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundRange {
    name: RangeName,
    min: i64,
    max: i64,
    value: i64,
    text: String,
    /// Value held when the current text edit began.
    edit_origin: Option<i64>,
}

impl BoundRange {
    /// Create a control from its markup spec.
    pub fn new(name: RangeName, spec: RangeSpec) -> Self {
        let value = spec.default.clamp(spec.min, spec.max);
        Self {
            name,
            min: spec.min,
            max: spec.max,
            value,
            text: value.to_string(),
            edit_origin: None,
        }
    }

    pub fn name(&self) -> RangeName {
        self.name
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn bounds(&self) -> (i64, i64) {
        (self.min, self.max)
    }

    /// Whether the text field holds an uncommitted edit.
    pub fn is_editing(&self) -> bool {
        self.edit_origin.is_some()
    }

    /// Slider movement. Always a commit.
    #[must_use]
    pub fn slide(&mut self, value: i64) -> i64 {
        self.edit_origin = None;
        self.value = self.clamp(value);
        self.text = self.value.to_string();
        self.value
    }

    /// Text edit in progress. Moves the slider when the text is numeric but
    /// never commits.
    pub fn edit_text(&mut self, text: impl Into<String>) {
        if self.edit_origin.is_none() {
            self.edit_origin = Some(self.value);
        }
        self.text = text.into();
        if let Some(parsed) = parse_leading_int(&self.text) {
            self.value = self.clamp(parsed);
        }
    }

    /// End of a text edit (focus loss or Enter).
    ///
    /// Returns the committed value, or `None` when the text was empty or not a
    /// number, in which case both sides revert to the value from before the edit.
    #[must_use]
    pub fn commit_text(&mut self) -> Option<i64> {
        let origin = self.edit_origin.take().unwrap_or(self.value);
        match parse_leading_int(&self.text) {
            Some(parsed) => {
                self.value = self.clamp(parsed);
                self.text = self.value.to_string();
                Some(self.value)
            }
            None => {
                self.value = origin;
                self.text = origin.to_string();
                None
            }
        }
    }

    /// Programmatic set (e.g. from a loaded configuration). Not a commit.
    pub fn apply(&mut self, value: i64) {
        self.edit_origin = None;
        self.value = self.clamp(value);
        self.text = self.value.to_string();
    }

    /// Replace the bounds and pull the value back inside them.
    pub fn set_bounds(&mut self, min: i64, max: i64) {
        let max = max.max(min);
        self.min = min;
        self.max = max;
        self.value = self.value.clamp(min, max);
        match self.edit_origin.as_mut() {
            Some(origin) => *origin = (*origin).clamp(min, max),
            None => self.text = self.value.to_string(),
        }
    }

    fn clamp(&self, value: i64) -> i64 {
        value.clamp(self.min, self.max)
    }
}

/// Parse a leading integer: optional whitespace, optional sign, digits.
/// Trailing characters are ignored (`"12px"` is 12); no digits means `None`.
pub fn parse_leading_int(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }

    let magnitude = rest[..digits_len]
        .bytes()
        .try_fold(0i64, |acc, b| {
            acc.checked_mul(10)?.checked_add(i64::from(b - b'0'))
        })
        .unwrap_or(i64::MAX);

    Some(if negative { -magnitude } else { magnitude })
}
