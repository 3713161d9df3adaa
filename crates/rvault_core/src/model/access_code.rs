//! Access code value type.
//!
//! The code only selects which vault to load. It is not a secret and no
//! stored content is encrypted with it.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Number of digits in an access code.
pub const ACCESS_CODE_LEN: usize = 3;

/// A validated access code: exactly `ACCESS_CODE_LEN` ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccessCode(String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeError {
    WrongLength(usize),
    NonDigit(char),
}

impl Display for CodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WrongLength(len) => write!(
                f,
                "access code must be exactly {ACCESS_CODE_LEN} digits, got {len}"
            ),
            Self::NonDigit(ch) => write!(f, "access code may only contain digits, got `{ch}`"),
        }
    }
}

impl Error for CodeError {}

impl AccessCode {
    /// Parses a code, rejecting anything other than exactly three digits.
    pub fn parse(raw: &str) -> Result<Self, CodeError> {
        if let Some(ch) = raw.chars().find(|ch| !ch.is_ascii_digit()) {
            return Err(CodeError::NonDigit(ch));
        }
        if raw.len() != ACCESS_CODE_LEN {
            return Err(CodeError::WrongLength(raw.chars().count()));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for AccessCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
