//! Command line of the cdist configuration management tool.
//!
//! This crate builds the cdist command tree on top of `clap`, attaches
//! environment defaults, gates beta functionality, and dispatches parsed
//! commands to a [`CommandHandlers`] implementation.
//!
//! # Key Abstractions
//!
//! - [`ParserTree`]: the built command tree plus its structural description
//! - [`CdistCli`]: parse, gate, initialise logging, dispatch
//! - [`CommandHandlers`]: entry points an engine implements
//! - [`EnvDefaults`]: environment values captured before the tree is built

#![doc = include_str!("../README.md")]

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod tree;

// Re-export key types at crate root for convenience
pub use app::{CdistCli, CommandHandlers};
pub use cli::{Cli, Commands, InventorySubcommand, LoggingArgs};
pub use config::EnvDefaults;
pub use error::{CliError, Result};
pub use handlers::BuiltinHandlers;
pub use tree::{
    CommandNode, DispatchTarget, Invocation, OptionGroup, OptionSpec, ParserTree,
    build_parser_tree, verify_tree,
};
