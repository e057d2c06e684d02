//! Scheme-specific rewrites for targets that break the authority grammar.
//!
//! A backend may register one [`SecondaryPattern`]. When the primary
//! decomposition of a target with that scheme fails, the pattern gets a single
//! chance to rewrite the raw string into something the primary grammar
//! accepts.

use regex::{Captures, Regex};
use std::fmt;
use std::sync::LazyLock;

static LEADING_SCHEME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*([a-z0-9][a-z0-9+._-]*)://").expect("static scheme pattern")
});

#[derive(Clone, Copy)]
pub struct SecondaryPattern {
    scheme: &'static str,
    regex: &'static LazyLock<Regex>,
    rewrite: fn(&Captures<'_>) -> String,
}

impl SecondaryPattern {
    pub const fn new(
        scheme: &'static str,
        regex: &'static LazyLock<Regex>,
        rewrite: fn(&Captures<'_>) -> String,
    ) -> Self {
        Self {
            scheme,
            regex,
            rewrite,
        }
    }

    pub fn applies_to(&self, scheme: &str) -> bool {
        self.scheme.eq_ignore_ascii_case(scheme)
    }

    /// Rewrite `raw`, or `None` when the pattern does not match
    pub fn rewrite(&self, raw: &str) -> Option<String> {
        self.regex
            .captures(raw.trim())
            .map(|caps| (self.rewrite)(&caps))
    }
}

impl fmt::Debug for SecondaryPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecondaryPattern")
            .field("scheme", &self.scheme)
            .field("regex", &self.regex.as_str())
            .finish()
    }
}

/// Textual `scheme://` prefix of a raw target, lowercased
pub(crate) fn leading_scheme(raw: &str) -> Option<String> {
    LEADING_SCHEME_RE
        .captures(raw)
        .map(|caps| caps[1].to_lowercase())
}
