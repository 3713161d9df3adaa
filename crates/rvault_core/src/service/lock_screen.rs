//! Access code entry state for the lock screen.
//!
//! Digits are entered one at a time; input beyond the code length is
//! ignored until a backspace frees a slot.

use crate::model::access_code::{AccessCode, CodeError, ACCESS_CODE_LEN};
use std::time::Duration;

/// Pause between the last digit and the unlock, so the user sees it land.
pub const UNLOCK_DELAY: Duration = Duration::from_millis(300);

/// Digit-by-digit code entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeEntry {
    digits: String,
}

impl CodeEntry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one digit. Returns whether it was accepted.
    pub fn push_digit(&mut self, ch: char) -> bool {
        if !ch.is_ascii_digit() || self.is_complete() {
            return false;
        }
        self.digits.push(ch);
        true
    }

    /// Removes the last digit, if any.
    pub fn backspace(&mut self) -> bool {
        self.digits.pop().is_some()
    }

    pub fn clear(&mut self) {
        self.digits.clear();
    }

    pub fn digits(&self) -> &str {
        &self.digits
    }

    pub fn is_complete(&self) -> bool {
        self.digits.len() == ACCESS_CODE_LEN
    }

    /// Filled slots as digits, open slots as `_`.
    pub fn display(&self) -> String {
        let open = ACCESS_CODE_LEN - self.digits.len();
        format!("{}{}", self.digits, "_".repeat(open))
    }

    /// Turns the entered digits into an access code.
    ///
    /// # Errors
    /// `CodeError::WrongLength` while fewer than three digits are entered.
    pub fn submit(&self) -> Result<AccessCode, CodeError> {
        AccessCode::parse(&self.digits)
    }
}
