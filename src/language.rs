//! Language filtering by declared language code.
//!
//! Codes are compared case-insensitively with `_` read as `-`. A bare
//! request such as `fi` admits any regional variant (`fi-FI`, `fi_FI`); a
//! regional request such as `en-US` admits only that exact tag. A post without
//! any declared language is never admitted while a filter is active.

use std::fmt;

/// Outcome of checking one post against the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageVerdict {
    /// No filter, or the declared language matches.
    Admit,
    /// The declared language differs.
    Reject,
    /// A filter is active but the post declares no language.
    Undetermined,
}

/// Optional restriction to one language.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageFilter {
    requested: Option<String>,
}

impl LanguageFilter {
    /// Creates a filter for `code`, or an admit-all filter for `None`.
    #[must_use]
    pub fn new(code: Option<&str>) -> Self {
        Self {
            requested: code.map(normalize_tag).filter(|c| !c.is_empty()),
        }
    }

    /// A filter that admits everything.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Whether a language was requested.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.requested.is_some()
    }

    /// Requested tag, lowercased with `_` normalised to `-`.
    #[must_use]
    pub fn requested(&self) -> Option<&str> {
        self.requested.as_deref()
    }

    /// Primary subtag of the request, used where only a language (not a
    /// region) can be asked for, like the WordPress `lang` parameter.
    #[must_use]
    pub fn requested_primary(&self) -> Option<String> {
        self.requested.as_deref().map(primary_subtag)
    }

    /// Classifies a declared language code.
    #[must_use]
    pub fn verdict(&self, code: Option<&str>) -> LanguageVerdict {
        let Some(requested) = &self.requested else {
            return LanguageVerdict::Admit;
        };
        let declared = code.map(normalize_tag).filter(|c| !c.is_empty());
        let declared = if requested.contains('-') {
            declared
        } else {
            declared.map(|tag| primary_subtag(&tag))
        };
        match declared {
            Some(declared) if &declared == requested => LanguageVerdict::Admit,
            Some(_) => LanguageVerdict::Reject,
            None => LanguageVerdict::Undetermined,
        }
    }

    /// Returns true only for [`LanguageVerdict::Admit`].
    #[must_use]
    pub fn admits(&self, code: Option<&str>) -> bool {
        self.verdict(code) == LanguageVerdict::Admit
    }
}

impl fmt::Display for LanguageFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.requested.as_deref().unwrap_or("any"))
    }
}

/// Lowercases a tag, reads `_` as `-` and trims surrounding whitespace.
///
/// ```
/// use harvester_core::language::normalize_tag;
///
/// assert_eq!(normalize_tag(" en_US "), "en-us");
/// ```
#[must_use]
pub fn normalize_tag(code: &str) -> String {
    code.trim().replace('_', "-").to_ascii_lowercase()
}

/// Lowercased primary subtag of a language tag or locale.
///
/// ```
/// use harvester_core::language::primary_subtag;
///
/// assert_eq!(primary_subtag("fi-FI"), "fi");
/// assert_eq!(primary_subtag(" en_US "), "en");
/// ```
#[must_use]
pub fn primary_subtag(code: &str) -> String {
    code.trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}
