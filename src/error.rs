use serde::Serialize;
use std::fmt;

/// Classification of a per-target failure recorded in a delivery result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Target string could not be decomposed (no host, bad port)
    Parse,
    /// No registry entry for the scheme
    UnsupportedScheme,
    /// Required backend field missing or malformed
    Validation,
    /// Connection-level failure reaching the backend
    Transport,
    /// Backend answered with a non-success status
    Backend,
    /// Fan-out interrupted by cancellation
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Parse => "parse",
            ErrorKind::UnsupportedScheme => "unsupported_scheme",
            ErrorKind::Validation => "validation",
            ErrorKind::Transport => "transport",
            ErrorKind::Backend => "backend",
            ErrorKind::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
