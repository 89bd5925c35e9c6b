//! Build-time defaults for the cdist command line.
//!
//! Several options take their default from the environment. The values are
//! captured once into [`EnvDefaults`] before the parser tree is built. The
//! builder attaches string defaults to the options they belong to; the
//! inventory directory is resolved after parsing, once the command and
//! sub-command levels are merged.
//!
//! # Resolution Order
//!
//! 1. Explicit flag on the command line
//! 2. Environment variable captured in [`EnvDefaults`]
//! 3. Computed default (CPU count for `-j`/`-p` without a value,
//!    `~/.cdist/inventory` for `-I`)
//!
//! Path-valued variables (`CDIST_INVENTORY_DIR`, `HOME`) are kept as
//! [`PathBuf`] so non-UTF-8 paths survive unchanged.

use std::ffi::OsString;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

// ============================================================================
// Environment variable names
// ============================================================================

/// Presence unlocks beta functionality by default.
pub const ENV_BETA: &str = "CDIST_BETA";

/// Default for `-I/--inventory`.
pub const ENV_INVENTORY_DIR: &str = "CDIST_INVENTORY_DIR";

/// Default for `-C/--cache-path-pattern`.
pub const ENV_CACHE_PATH_PATTERN: &str = "CDIST_CACHE_PATH_PATTERN";

/// Default for `--remote-copy`.
pub const ENV_REMOTE_COPY: &str = "CDIST_REMOTE_COPY";

/// Default for `--remote-exec`.
pub const ENV_REMOTE_EXEC: &str = "CDIST_REMOTE_EXEC";

/// Home directory, used for the per-user inventory.
pub const ENV_HOME: &str = "HOME";

/// Per-user inventory location, relative to the home directory.
pub const USER_INVENTORY_SUBDIR: &str = ".cdist/inventory";

// ============================================================================
// EnvDefaults
// ============================================================================

/// Defaults captured from the environment and the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvDefaults {
    /// `CDIST_BETA` is set.
    pub beta: bool,

    /// Value of `CDIST_INVENTORY_DIR`.
    pub inventory_dir: Option<PathBuf>,

    /// Value of `CDIST_CACHE_PATH_PATTERN`.
    pub cache_path_pattern: Option<String>,

    /// Value of `CDIST_REMOTE_COPY`.
    pub remote_copy: Option<String>,

    /// Value of `CDIST_REMOTE_EXEC`.
    pub remote_exec: Option<String>,

    /// Home directory.
    pub home: Option<PathBuf>,

    /// Number of logical CPUs; used when `-j` or `-p` is given without a value.
    pub cpu_count: usize,
}

impl Default for EnvDefaults {
    fn default() -> Self {
        Self {
            beta: false,
            inventory_dir: None,
            cache_path_pattern: None,
            remote_copy: None,
            remote_exec: None,
            home: None,
            cpu_count: detect_cpu_count(),
        }
    }
}

impl EnvDefaults {
    /// Capture defaults from the process environment.
    ///
    /// Falls back to the platform home directory when `HOME` is unset.
    pub fn from_env() -> Self {
        let mut defaults = Self::from_lookup(|key: &str| std::env::var_os(key));
        if defaults.home.is_none() {
            defaults.home = dirs::home_dir();
        }
        defaults
    }

    /// Capture defaults through an arbitrary variable lookup.
    ///
    /// String-valued options (`-C`, `--remote-copy`, `--remote-exec`) are
    /// parsed as UTF-8 text, so their values are converted lossily.
    pub fn from_lookup<F, V>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<V>,
        V: Into<OsString>,
    {
        let var = |key: &str| -> Option<OsString> { lookup(key).map(Into::into) };
        let text = |key: &str| var(key).map(|v| v.to_string_lossy().into_owned());
        let path = |key: &str| var(key).filter(|v| !v.is_empty()).map(PathBuf::from);

        Self {
            beta: var(ENV_BETA).is_some(),
            inventory_dir: path(ENV_INVENTORY_DIR),
            cache_path_pattern: text(ENV_CACHE_PATH_PATTERN),
            remote_copy: text(ENV_REMOTE_COPY),
            remote_exec: text(ENV_REMOTE_EXEC),
            home: path(ENV_HOME),
            cpu_count: detect_cpu_count(),
        }
    }

    /// Override the CPU count used for `-j`/`-p` without a value.
    pub fn with_cpu_count(mut self, cpu_count: usize) -> Self {
        self.cpu_count = cpu_count.max(1);
        self
    }

    /// Resolve the inventory directory.
    ///
    /// Explicit `-I` wins, then `CDIST_INVENTORY_DIR`, then
    /// `~/.cdist/inventory`. `None` leaves the choice of the distribution
    /// inventory to the inventory implementation.
    pub fn resolve_inventory_dir(&self, explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }

        if let Some(dir) = &self.inventory_dir {
            return Some(dir.clone());
        }

        self.home.as_ref().map(|h| h.join(USER_INVENTORY_SUBDIR))
    }
}

/// Number of logical CPUs, at least 1.
pub fn detect_cpu_count() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

// ============================================================================
// Tests
// ============================================================================
