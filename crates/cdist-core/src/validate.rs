//! Value validators for numeric options.

use thiserror::Error;

/// Why a value was rejected by [`parse_positive_int`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PositiveIntError {
    /// Not a base-10 integer literal.
    #[error("{0} is invalid int value")]
    InvalidNumberFormat(String),

    /// An integer literal, but zero or negative.
    #[error("{0} is invalid positive int value")]
    NotPositive(String),

    /// A positive integer literal too large for this platform.
    #[error("{0} is out of range positive int value")]
    OutOfRange(String),
}

/// Parse a strictly positive base-10 integer.
///
/// Surrounding whitespace is ignored and a single leading sign is allowed.
/// The literal is classified before its magnitude is checked, so a negative
/// literal of any length is [`PositiveIntError::NotPositive`]. Used for
/// `-j/--jobs` and `-p/--parallel`.
///
/// ```
/// use cdist_core::{parse_positive_int, PositiveIntError};
///
/// assert_eq!(parse_positive_int("5"), Ok(5));
/// assert_eq!(
///     parse_positive_int("0"),
///     Err(PositiveIntError::NotPositive("0".into()))
/// );
/// ```
pub fn parse_positive_int(text: &str) -> Result<usize, PositiveIntError> {
    let trimmed = text.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PositiveIntError::InvalidNumberFormat(text.to_string()));
    }
    if negative || digits.bytes().all(|b| b == b'0') {
        return Err(PositiveIntError::NotPositive(trimmed.to_string()));
    }

    digits
        .parse()
        .map_err(|_| PositiveIntError::OutOfRange(trimmed.to_string()))
}
