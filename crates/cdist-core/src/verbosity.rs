//! Verbosity policy.
//!
//! `-v` is counted: every repetition moves one step towards more detail,
//! starting from [`LogLevel::Warning`]. Anything past `-vvvv` stays at
//! [`LogLevel::Trace`]. `-q` is independent of the count and silences
//! everything, errors included.

use std::fmt;

// ============================================================================
// Constants
// ============================================================================

/// Effective verbosity forced by `-q/--quiet`.
///
/// Lower than any level reachable through `-v`, which can only count up from 0.
pub const VERBOSITY_OFF: i32 = -2;

/// Smallest count with its own level (`ERROR`).
pub const VERBOSITY_MIN: i32 = -1;

/// Count from which every level is `TRACE`.
pub const VERBOSITY_MAX: i32 = 4;

// ============================================================================
// LogLevel
// ============================================================================

/// Process-wide log level, ordered from silent to most detailed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    /// No output at all.
    Off,
    /// Errors only.
    Error,
    /// Errors and warnings; the default.
    Warning,
    /// Adds informational messages.
    Info,
    /// Adds progress detail for cdist's own operations.
    Verbose,
    /// Adds debugging output.
    Debug,
    /// Everything.
    Trace,
}

impl LogLevel {
    /// Level for an effective verbosity count.
    ///
    /// Counts at or below [`VERBOSITY_OFF`] are `Off`; counts at or above
    /// [`VERBOSITY_MAX`] are `Trace`.
    pub fn from_count(count: i32) -> Self {
        match count.min(VERBOSITY_MAX) {
            i32::MIN..=VERBOSITY_OFF => Self::Off,
            VERBOSITY_MIN => Self::Error,
            0 => Self::Warning,
            1 => Self::Info,
            2 => Self::Verbose,
            3 => Self::Debug,
            _ => Self::Trace,
        }
    }

    /// Upper-case name as shown in help text and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
            Self::Info => "INFO",
            Self::Verbose => "VERBOSE",
            Self::Debug => "DEBUG",
            Self::Trace => "TRACE",
        }
    }

    /// Equivalent `log` facade filter.
    ///
    /// `log` has no level between info and debug, so `Verbose` becomes `Debug`.
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            Self::Off => log::LevelFilter::Off,
            Self::Error => log::LevelFilter::Error,
            Self::Warning => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Verbose | Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }

    /// `tracing-subscriber` filter directive for this level.
    ///
    /// `Verbose` raises only cdist's own targets to debug.
    pub fn filter_directive(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Error => "error",
            Self::Warning => "warn",
            Self::Info => "info",
            Self::Verbose => "info,cdist=debug,cdist_core=debug,cdist_cli=debug",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the log level from the quiet switch and the verbosity count.
pub fn resolve_log_level(quiet: bool, verbose_count: i32) -> LogLevel {
    let effective = if quiet { VERBOSITY_OFF } else { verbose_count };
    LogLevel::from_count(effective)
}

// ============================================================================
// Tests
// ============================================================================
