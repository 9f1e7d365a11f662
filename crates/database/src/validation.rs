//! Input validation for directory entities.

use std::fmt;

/// Validation error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Invalid phone number.
    InvalidPhone(String),
    /// Empty value where one is required.
    Empty(&'static str),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidPhone(msg) => write!(f, "Invalid phone number: {}", msg),
            ValidationError::Empty(field) => write!(f, "{} cannot be empty", field),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Minimum digits in a valid phone number.
pub const MIN_PHONE_DIGITS: usize = 10;

/// Maximum digits in a valid phone number.
pub const MAX_PHONE_DIGITS: usize = 14;

/// Digits kept when storing a phone number (the national number).
const NATIONAL_DIGITS: usize = 11;

/// Strip formatting from a phone number and keep the national number.
///
/// "+55 (11) 91234-5678" and "11 91234-5678" both become "11912345678".
pub fn clean_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() > NATIONAL_DIGITS {
        digits[digits.len() - NATIONAL_DIGITS..].to_string()
    } else {
        digits
    }
}

/// Validate a phone number before cleaning.
///
/// Accepts an optional leading "+" followed by 10 to 14 digits, with
/// common separators tolerated.
pub fn validate_phone(raw: &str) -> Result<(), ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty("phone"));
    }

    let digits = trimmed.chars().filter(|c| c.is_ascii_digit()).count();
    if !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits) {
        return Err(ValidationError::InvalidPhone(format!(
            "expected {} to {} digits, got {}",
            MIN_PHONE_DIGITS, MAX_PHONE_DIGITS, digits
        )));
    }

    Ok(())
}

/// Validate a display name.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::Empty("name"));
    }
    Ok(())
}
