//! Parser-independent policy for the cdist command line.
//!
//! This crate holds everything about the command line that does not depend
//! on a particular argument parser. It has no internal cdist dependencies.
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`verbosity`]: Mapping of `-q`/`-v` flags to a [`LogLevel`]
//! - [`validate`]: Value validators shared by numeric options
//! - [`beta`]: Registry of beta commands/arguments and the gate that enforces it

#![doc = include_str!("../README.md")]

pub mod beta;
pub mod error;
pub mod validate;
pub mod verbosity;

// Re-export key types at crate root for convenience
pub use beta::{BetaNamespace, BetaRegistry, BetaRequired};
pub use error::{Error, Result};
pub use validate::{parse_positive_int, PositiveIntError};
pub use verbosity::{resolve_log_level, LogLevel};

/// Version reported by `cdist -V` and in the top-level description.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
