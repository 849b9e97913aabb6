//! Text matching shared by the catalog and the remote record filters.
//!
//! Matching is substring-based and insensitive to case, surrounding
//! whitespace and Latin diacritics: `"equip"` matches `"Équipements"`.

use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Lowercase `text` and strip combining marks after canonical decomposition.
pub fn fold(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// A folded, non-empty query ready to be tested against record fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Needle(String);

impl Needle {
    /// Returns `None` for an empty or whitespace-only query.
    pub fn new(query: &str) -> Option<Self> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(fold(trimmed)))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn matches(&self, haystack: &str) -> bool {
        fold(haystack).contains(&self.0)
    }

    /// True when any of `fields` contains the needle.
    pub fn matches_any<'a>(&self, fields: impl IntoIterator<Item = &'a str>) -> bool {
        fields.into_iter().any(|f| self.matches(f))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
