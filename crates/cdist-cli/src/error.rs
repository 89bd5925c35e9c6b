//! CLI error types.
//!
//! Parse failures keep their `clap::Error` so the binary can print clap's
//! formatted message and use clap's exit code (0 for `--help`/`--version`).

use cdist_core::BetaRequired;
use thiserror::Error;

/// Errors returned by the cdist command line.
#[derive(Error, Debug)]
pub enum CliError {
    /// The command line could not be parsed, or help/version was requested.
    #[error(transparent)]
    Clap(#[from] clap::Error),

    /// Validation, gating, or dispatch failed.
    #[error(transparent)]
    Core(#[from] cdist_core::Error),
}

impl From<BetaRequired> for CliError {
    fn from(err: BetaRequired) -> Self {
        Self::Core(err.into())
    }
}

impl CliError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Clap(e) => e.exit_code(),
            Self::Core(_) => 1,
        }
    }
}

/// Result type alias using the CLI error type.
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn test_beta_required_converts() {
        let err = CliError::from(BetaRequired::command("install"));
        assert!(matches!(
            err,
            CliError::Core(cdist_core::Error::BetaRequired(_))
        ));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_clap_exit_code() {
        let err = CliError::from(clap::Error::new(ErrorKind::DisplayHelp));
        assert_eq!(err.exit_code(), 0);

        let err = CliError::from(clap::Error::new(ErrorKind::InvalidValue));
        assert_eq!(err.exit_code(), 2);
    }
}
