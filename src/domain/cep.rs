//! Brazilian postal code (CEP) parsing.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Number of digits in a CEP.
pub const CEP_LEN: usize = 8;

/// Raised when a string is not a well-formed CEP.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid zipcode: {input:?}")]
pub struct InvalidCep {
    /// The rejected input, as received.
    pub input: String,
}

/// A validated CEP: exactly eight ASCII digits, separators removed.
///
/// Leading zeros are significant and kept as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cep(String);

impl Cep {
    /// Strip hyphens and surrounding whitespace, then require eight digits.
    pub fn parse(raw: &str) -> Result<Self, InvalidCep> {
        let normalized = normalize(raw);
        if normalized.len() == CEP_LEN && normalized.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(normalized))
        } else {
            Err(InvalidCep {
                input: raw.to_string(),
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Format check used by both handlers before any upstream call.
pub fn is_valid_format(raw: &str) -> bool {
    Cep::parse(raw).is_ok()
}

fn normalize(raw: &str) -> String {
    raw.replace('-', "").trim().to_string()
}

impl FromStr for Cep {
    type Err = InvalidCep;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Cep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Cep {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
