//! Beta registry and gate.
//!
//! Some commands, and some arguments of otherwise stable commands, are
//! beta. They are refused unless the invocation was unlocked with
//! `-b/--beta` or the `CDIST_BETA` environment variable. Unlocking is
//! all-or-nothing for the whole invocation.
//!
//! The registry is a plain value: build it with [`BetaRegistry::default`],
//! let extensions add entries during setup, then share it read-only while
//! command lines are checked.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

// ============================================================================
// Error
// ============================================================================

/// A beta command or argument was used while beta is locked.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "{} is beta, but beta is not enabled. If you want to use it please enable \
     beta functionality by using the -b/--beta command line flag or setting \
     the CDIST_BETA env var.",
    beta_subject(.command, .argument)
)]
pub struct BetaRequired {
    /// Top-level command name.
    pub command: String,
    /// Destination key of the offending argument, if the command itself is stable.
    pub argument: Option<String>,
}

impl BetaRequired {
    /// The command itself is beta.
    pub fn command(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            argument: None,
        }
    }

    /// An argument of `command` is beta.
    pub fn argument(command: impl Into<String>, argument: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            argument: Some(argument.into()),
        }
    }
}

fn beta_subject(command: &str, argument: &Option<String>) -> String {
    match argument {
        Some(arg) => format!("'{arg}' argument of '{command}' command"),
        None => format!("'{command}' command"),
    }
}

// ============================================================================
// Namespace view
// ============================================================================

/// What the gate needs to know about a parsed command line.
pub trait BetaNamespace {
    /// Name of the selected top-level command.
    fn command_name(&self) -> &str;

    /// Whether beta was unlocked for this invocation.
    fn beta_unlocked(&self) -> bool;

    /// Whether the option stored under `key` is present with a truthy value.
    ///
    /// Keys the selected command does not define are not truthy.
    fn is_truthy(&self, key: &str) -> bool;
}

// ============================================================================
// Registry
// ============================================================================

/// Commands and per-command arguments that require beta.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BetaRegistry {
    commands: BTreeSet<String>,
    arguments: BTreeMap<String, BTreeSet<String>>,
}

impl Default for BetaRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register_command("install");
        registry.register_command("inventory");
        for arg in ["jobs", "tag", "all_tagged_hosts"] {
            registry.register_argument("config", arg);
        }
        registry
    }
}

impl BetaRegistry {
    /// A registry with no beta entries.
    pub fn empty() -> Self {
        Self {
            commands: BTreeSet::new(),
            arguments: BTreeMap::new(),
        }
    }

    /// Mark a whole command as beta. Registering twice is a no-op.
    pub fn register_command(&mut self, command: impl Into<String>) -> &mut Self {
        let command = command.into();
        tracing::debug!(command = %command, "registering beta command");
        self.commands.insert(command);
        self
    }

    /// Mark one argument of a command as beta. Registering twice is a no-op.
    pub fn register_argument(
        &mut self,
        command: impl Into<String>,
        argument: impl Into<String>,
    ) -> &mut Self {
        let command = command.into();
        let argument = argument.into();
        tracing::debug!(command = %command, argument = %argument, "registering beta argument");
        self.arguments.entry(command).or_default().insert(argument);
        self
    }

    /// Whether the whole command is beta.
    pub fn is_beta_command(&self, command: &str) -> bool {
        self.commands.contains(command)
    }

    /// Beta arguments registered for `command`, in lexicographic order.
    pub fn beta_arguments(&self, command: &str) -> impl Iterator<Item = &str> {
        self.arguments
            .get(command)
            .into_iter()
            .flat_map(|args| args.iter().map(String::as_str))
    }

    /// Refuse the namespace if it uses beta functionality while locked.
    ///
    /// A beta command is reported on its own; otherwise the first truthy
    /// beta argument, in lexicographic key order, is reported.
    pub fn check<N: BetaNamespace + ?Sized>(&self, namespace: &N) -> Result<(), BetaRequired> {
        if namespace.beta_unlocked() {
            return Ok(());
        }

        let command = namespace.command_name();
        if self.is_beta_command(command) {
            return Err(BetaRequired::command(command));
        }

        match self.beta_arguments(command).find(|arg| namespace.is_truthy(arg)) {
            Some(arg) => Err(BetaRequired::argument(command, arg)),
            None => Ok(()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
