//! Setting name parsing.
//!
//! A setting name is either plain (`display/width`) or feature-qualified
//! (`display/width.mobile.debug`). The text before the first `.` is the
//! *base name*; every segment after it is a feature qualifier.

/// Reserved setting name whose string value augments the custom feature set.
pub const CUSTOM_FEATURES_KEY: &str = "_custom_features";

/// Borrowed view of a setting name split at its first dot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SettingName<'a> {
    full: &'a str,
    dot: Option<usize>,
}

impl<'a> SettingName<'a> {
    pub fn parse(full: &'a str) -> Self {
        Self {
            full,
            dot: full.find('.'),
        }
    }

    pub fn full(&self) -> &'a str {
        self.full
    }

    /// The portion before the first dot (the whole name when undotted).
    pub fn base(&self) -> &'a str {
        match self.dot {
            Some(dot) => &self.full[..dot],
            None => self.full,
        }
    }

    /// Returns `true` if the name carries at least one feature qualifier.
    pub fn is_qualified(&self) -> bool {
        self.dot.is_some()
    }

    /// Feature qualifiers in left-to-right order, trimmed of whitespace.
    pub fn qualifiers(&self) -> impl Iterator<Item = &'a str> + 'a {
        let rest = match self.dot {
            Some(dot) => &self.full[dot + 1..],
            None => "",
        };
        let present = self.dot.is_some();
        rest.split('.')
            .filter(move |_| present)
            .map(str::trim)
    }
}
