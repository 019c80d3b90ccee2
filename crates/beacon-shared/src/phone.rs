//! Phone-number identity.
//!
//! A normalized phone number is the global primary key for every record in
//! the store. Normalization is total and deterministic: strip whitespace,
//! keep digits, prepend `+`. Anything with fewer than 10 digits is rejected
//! before the store is ever touched.

use serde::{Deserialize, Serialize};

use crate::constants::MIN_PHONE_DIGITS;
use crate::error::ValidationError;

/// A normalized phone number: a leading `+` followed by at least 10 digits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Normalize raw user input into a [`PhoneNumber`].
    ///
    /// Already-normalized input passes through unchanged, so
    /// `normalize(normalize(x)) == normalize(x)`.
    pub fn normalize(input: &str) -> Result<Self, ValidationError> {
        let digits: String = input.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.len() < MIN_PHONE_DIGITS {
            return Err(ValidationError::InvalidPhoneNumber);
        }
        Ok(Self(format!("+{digits}")))
    }

    /// The normalized string form, e.g. `+14155550123`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for PhoneNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
