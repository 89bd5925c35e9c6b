//! CdistCli application runner.
//!
//! Ties the parser tree, the beta gate, logging and the command handlers
//! together. Engines plug in through [`CommandHandlers`].

use std::ffi::OsString;

use cdist_core::{BetaRegistry, LogLevel};
use tracing_subscriber::EnvFilter;

use crate::cli::{BannerArgs, Commands, ConfigCommandArgs, InventoryCommand, ShellArgs};
use crate::error::{CliError, Result};
use crate::tree::{DispatchTarget, Invocation, ParserTree};

// ============================================================================
// CommandHandlers
// ============================================================================

/// Entry points the parsed commands are dispatched to.
///
/// Every inventory sub-command arrives at [`CommandHandlers::inventory`];
/// the selected sub-command is in [`InventoryCommand::command`].
pub trait CommandHandlers {
    /// `cdist banner`.
    fn banner(&self, args: &BannerArgs) -> cdist_core::Result<()>;

    /// `cdist config`.
    fn config(&self, args: &ConfigCommandArgs) -> cdist_core::Result<()>;

    /// `cdist install`.
    fn install(&self, args: &ConfigCommandArgs) -> cdist_core::Result<()>;

    /// `cdist inventory` and its sub-commands.
    fn inventory(&self, args: &InventoryCommand) -> cdist_core::Result<()>;

    /// `cdist shell`.
    fn shell(&self, args: &ShellArgs) -> cdist_core::Result<()>;
}

// ============================================================================
// CdistCli
// ============================================================================

/// The cdist command line, parameterized over its handlers.
pub struct CdistCli<H: CommandHandlers> {
    tree: ParserTree,
    registry: BetaRegistry,
    handlers: H,
}

impl<H: CommandHandlers> CdistCli<H> {
    /// Create an application with the default beta registry.
    pub fn new(tree: ParserTree, handlers: H) -> Self {
        Self::with_registry(tree, BetaRegistry::default(), handlers)
    }

    /// Create an application with a custom beta registry.
    pub fn with_registry(tree: ParserTree, registry: BetaRegistry, handlers: H) -> Self {
        Self {
            tree,
            registry,
            handlers,
        }
    }

    /// The parser tree.
    pub fn tree(&self) -> &ParserTree {
        &self.tree
    }

    /// The beta registry.
    pub fn registry(&self) -> &BetaRegistry {
        &self.registry
    }

    /// Mutable access to the beta registry, for registering more entries.
    pub fn registry_mut(&mut self) -> &mut BetaRegistry {
        &mut self.registry
    }

    /// The command handlers.
    pub fn handlers(&self) -> &H {
        &self.handlers
    }

    /// Parse `args` and apply the beta gate.
    pub fn resolve<I, T>(&self, args: I) -> Result<Invocation>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let invocation = self.tree.parse_from(args)?;
        self.registry.check(&invocation)?;
        Ok(invocation)
    }

    /// Initialise tracing-based logging.
    ///
    /// Uses `RUST_LOG` env var if set, otherwise the filter for `level`.
    pub fn init_logging(level: LogLevel) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(level.filter_directive())
        };

        // Ignore error if a subscriber is already set (e.g. in tests).
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }

    /// Run the command line given in `args`.
    pub fn run<I, T>(&self, args: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let invocation = self.resolve(args)?;
        Self::init_logging(invocation.log_level());
        self.dispatch(&invocation)
    }

    /// Call the handler bound to the invocation's target.
    pub fn dispatch(&self, invocation: &Invocation) -> Result<()> {
        let target = invocation.target();
        tracing::debug!(
            command = %invocation.path().join(" "),
            entry = target.name(),
            level = %invocation.log_level(),
            "dispatching"
        );

        let result = match (target, &invocation.cli().command) {
            (DispatchTarget::Banner, Commands::Banner(args)) => self.handlers.banner(args),
            (DispatchTarget::Config, Commands::Config(args)) => self.handlers.config(args),
            (DispatchTarget::Install, Commands::Install(args)) => self.handlers.install(args),
            (DispatchTarget::Inventory, Commands::Inventory(args)) => {
                self.handlers.inventory(args)
            }
            (DispatchTarget::Shell, Commands::Shell(args)) => self.handlers.shell(args),
            (target, command) => Err(cdist_core::Error::layout(format!(
                "'{}' is bound to '{}'",
                command.name(),
                target.name()
            ))),
        };
        result.map_err(CliError::from)
    }
}

// ============================================================================
// Tests
// ============================================================================
