//! Error types for cdist command-line handling.
//!
//! Apart from I/O and wiring problems, every error here is a usage error:
//! the user fixes the invocation and tries again. Nothing is retried.
//! [`Error::GroupMismatch`] and [`Error::Layout`] mean the parser tree was
//! wired inconsistently.

use thiserror::Error;

use crate::beta::BetaRequired;
use crate::validate::PositiveIntError;

/// Errors that can occur while resolving a cdist invocation.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error while a handler wrote its output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A numeric option received an unusable value.
    #[error(transparent)]
    InvalidNumber(#[from] PositiveIntError),

    /// A beta command or argument was used without unlocking beta.
    #[error(transparent)]
    BetaRequired(#[from] BetaRequired),

    /// A command exposes a shared option group differently from its definition.
    #[error("option group '{group}' is not shared verbatim by '{command}': {detail}")]
    GroupMismatch {
        /// Command path, e.g. `inventory add-tag`.
        command: String,
        /// Group name.
        group: String,
        /// What differs.
        detail: String,
    },

    /// The parser tree does not match its declared layout.
    #[error("parser tree layout error: {0}")]
    Layout(String),

    /// The selected command has no implementation in this build.
    #[error("command '{0}' is not available in this build")]
    NotAvailable(String),
}

impl Error {
    /// Create a group mismatch error.
    pub fn group_mismatch(
        command: impl Into<String>,
        group: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self::GroupMismatch {
            command: command.into(),
            group: group.into(),
            detail: detail.into(),
        }
    }

    /// Create a layout error.
    pub fn layout(msg: impl Into<String>) -> Self {
        Self::Layout(msg.into())
    }

    /// Create a not-available error.
    pub fn not_available(command: impl Into<String>) -> Self {
        Self::NotAvailable(command.into())
    }
}

/// Result type alias using cdist's Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_beta_required_display_passes_through() {
        let err = Error::from(BetaRequired::command("install"));
        assert_eq!(err.to_string(), BetaRequired::command("install").to_string());
    }

    #[test]
    fn test_invalid_number_from() {
        let err = Error::from(PositiveIntError::NotPositive("0".into()));
        assert!(matches!(
            err,
            Error::InvalidNumber(PositiveIntError::NotPositive(ref v)) if v == "0"
        ));
        assert_eq!(err.to_string(), "0 is invalid positive int value");
    }

    #[test]
    fn test_group_mismatch_display() {
        let err = Error::group_mismatch("inventory list", "logging", "missing --quiet");
        assert_eq!(
            err.to_string(),
            "option group 'logging' is not shared verbatim by 'inventory list': missing --quiet"
        );
    }

    #[test]
    fn test_io_display() {
        let err = Error::from(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"));
        assert_eq!(err.to_string(), "I/O error: closed");
    }

    #[test]
    fn test_not_available_display() {
        let err = Error::not_available("shell");
        assert_eq!(err.to_string(), "command 'shell' is not available in this build");
    }
}
