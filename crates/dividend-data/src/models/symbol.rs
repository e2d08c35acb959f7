use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Reasons a ticker string is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SymbolError {
    #[error("symbol must be a non-empty string")]
    Empty,

    #[error("symbol '{symbol}' is longer than {max} characters")]
    TooLong { symbol: String, max: usize },

    #[error("symbol '{symbol}' contains invalid character '{ch}'")]
    InvalidCharacter { symbol: String, ch: char },
}

/// Canonical ticker symbol.
///
/// Canonical form is trimmed and uppercased. Letters, digits, `.` and `-`
/// are accepted so class shares (`BRK.B`, `BRK-B`) parse.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(Arc<str>);

impl Symbol {
    /// Maximum length of a canonical symbol.
    pub const MAX_LEN: usize = 10;

    /// Parse and canonicalize a raw ticker string.
    pub fn parse(raw: &str) -> Result<Self, SymbolError> {
        let canonical = Self::canonicalize(raw);

        if canonical.is_empty() {
            return Err(SymbolError::Empty);
        }
        if canonical.chars().count() > Self::MAX_LEN {
            return Err(SymbolError::TooLong {
                symbol: canonical,
                max: Self::MAX_LEN,
            });
        }
        if let Some(ch) = canonical
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '.' || *c == '-'))
        {
            return Err(SymbolError::InvalidCharacter {
                symbol: canonical,
                ch,
            });
        }

        Ok(Self(Arc::from(canonical)))
    }

    /// Trim and uppercase without validating.
    pub fn canonicalize(raw: &str) -> String {
        raw.trim().to_uppercase()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for Symbol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}
