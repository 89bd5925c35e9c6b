//! CLI argument parsing and command definitions.
//!
//! Shared option groups are `clap::Args` structs flattened into every
//! command that includes them, so a group is spelled exactly once. Each
//! top-level command is a variant of [`Commands`] and exposes only the
//! options it accepts.
//!
//! Defaults that depend on the environment or the host (`CDIST_*`
//! variables, CPU count) are not set here; [`crate::tree::ParserTree`]
//! attaches them when it builds the command.

use std::path::{Path, PathBuf};

use cdist_core::beta::BetaNamespace;
use cdist_core::{parse_positive_int, resolve_log_level, LogLevel};
use clap::{ArgAction, Args, Parser, Subcommand};

/// Appended to the help of every command.
pub const EPILOG: &str = "Get cdist at http://www.nico.schottelius.org/software/cdist/";

// ============================================================================
// Shared option groups
// ============================================================================

/// Logging options, included by every command.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggingArgs {
    /// Quiet mode: disables logging, including WARNING and ERROR.
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,

    /// Increase the verbosity level. Every instance of -v increments the
    /// verbosity level by one. Its default value is 0 which includes ERROR
    /// and WARNING levels. The levels, in order from the lowest to the
    /// highest, are: ERROR (-1), WARNING (0), INFO (1), VERBOSE (2),
    /// DEBUG (3), TRACE (4 or higher).
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
}

impl LoggingArgs {
    /// Combine two occurrences of the group (root and command level).
    pub fn merge(&self, other: &LoggingArgs) -> LoggingArgs {
        LoggingArgs {
            quiet: self.quiet || other.quiet,
            verbose: self.verbose.saturating_add(other.verbose),
        }
    }

    /// Log level selected by these flags.
    pub fn log_level(&self) -> LogLevel {
        resolve_log_level(self.quiet, i32::from(self.verbose))
    }

    fn is_truthy(&self, key: &str) -> bool {
        match key {
            "quiet" => self.quiet,
            "verbose" => self.verbose > 0,
            _ => false,
        }
    }
}

/// Beta unlock switch.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct BetaArgs {
    /// Enable beta functionality. Can also be enabled using CDIST_BETA env var.
    #[arg(short = 'b', long = "beta")]
    pub beta: bool,
}

/// Custom inventory location.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryArgs {
    /// Use specified custom inventory directory. Inventory directory is set
    /// up by the following rules: if this argument is set then specified
    /// directory is used, if CDIST_INVENTORY_DIR env var is set then its
    /// value is used, if HOME env var is set then ~/.cdist/inventory is used,
    /// otherwise distribution inventory directory is used.
    #[arg(short = 'I', long = "inventory", value_name = "INVENTORY_DIR")]
    pub inventory_dir: Option<PathBuf>,
}

/// Options controlling how configuration runs.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigMainArgs {
    /// Specify custom cache path pattern. It can also be set by
    /// CDIST_CACHE_PATH_PATTERN environment variable. If it is not set then
    /// default hostdir is used.
    #[arg(short = 'C', long = "cache-path-pattern")]
    pub cache_path_pattern: Option<String>,

    /// Add configuration directory (can be repeated, last one wins).
    #[arg(short = 'c', long = "conf-dir", action = ArgAction::Append)]
    pub conf_dir: Vec<PathBuf>,

    /// Path to a cdist manifest or '-' to read from stdin.
    #[arg(short = 'i', long = "initial-manifest", value_name = "MANIFEST")]
    pub manifest: Option<String>,

    /// Operate in parallel in specified maximum number of jobs. Global
    /// explorers, object prepare and object run are supported. Without
    /// argument CPU count is used by default. Currently in beta.
    #[arg(
        short = 'j',
        long = "jobs",
        num_args = 0..=1,
        value_parser = parse_positive_int
    )]
    pub jobs: Option<usize>,

    /// Do not execute code.
    #[arg(short = 'n', long = "dry-run")]
    pub dry_run: bool,

    /// Directory to save cdist output in.
    #[arg(short = 'o', long = "out-dir", value_name = "OUT_PATH")]
    pub out_path: Option<PathBuf>,

    /// Directory to save cdist output in on the target host.
    #[arg(short = 'r', long = "remote-out-dir", value_name = "REMOTE_OUT_PATH")]
    pub remote_out_path: Option<String>,

    /// Command to use for remote copy (should behave like scp).
    #[arg(long = "remote-copy")]
    pub remote_copy: Option<String>,

    /// Command to use for remote execution (should behave like ssh).
    #[arg(long = "remote-exec")]
    pub remote_exec: Option<String>,
}

impl ConfigMainArgs {
    fn is_truthy(&self, key: &str) -> bool {
        match key {
            "cache_path_pattern" => non_empty(&self.cache_path_pattern),
            "conf_dir" => !self.conf_dir.is_empty(),
            "manifest" => non_empty(&self.manifest),
            "jobs" => self.jobs.is_some_and(|n| n > 0),
            "dry_run" => self.dry_run,
            "out_path" => self.out_path.is_some(),
            "remote_out_path" => non_empty(&self.remote_out_path),
            "remote_copy" => non_empty(&self.remote_copy),
            "remote_exec" => non_empty(&self.remote_exec),
            _ => false,
        }
    }
}

/// Host selection options of `config` and `install`.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigArgs {
    /// Use all hosts present in tags db.
    #[arg(short = 'A', long = "all-tagged")]
    pub all_tagged_hosts: bool,

    /// List hosts that have all specified tags, if -t/--tag is specified.
    #[arg(short = 'a', long = "all")]
    pub has_all_tags: bool,

    /// Host(s) to operate on.
    #[arg(value_name = "HOST")]
    pub host: Vec<String>,

    /// Read specified file for a list of additional hosts to operate on or
    /// if '-' is given, read stdin (one host per line). If no host or host
    /// file is specified then, by default, read hosts from stdin.
    #[arg(short = 'f', long = "file", value_name = "HOSTFILE")]
    pub hostfile: Option<String>,

    /// Operate on multiple hosts in parallel for specified maximum hosts at
    /// a time. Without argument CPU count is used by default.
    #[arg(
        short = 'p',
        long = "parallel",
        value_name = "HOST_MAX",
        num_args = 0..=1,
        value_parser = parse_positive_int,
        overrides_with = "sequential"
    )]
    pub parallel: Option<usize>,

    /// Operate on multiple hosts sequentially (default).
    #[arg(short = 's', long = "sequential", overrides_with = "parallel")]
    pub sequential: bool,

    /// Host is specified by tag, not hostname/address; list all hosts that
    /// contain any of specified tags.
    #[arg(short = 't', long = "tag")]
    pub tag: bool,
}

impl ConfigArgs {
    /// Maximum number of hosts configured at a time.
    ///
    /// `Some(0)` when `-s/--sequential` was the last of `-p`/`-s` given,
    /// `None` when neither was given.
    pub fn parallel_hosts(&self) -> Option<usize> {
        if self.sequential {
            Some(0)
        } else {
            self.parallel
        }
    }

    fn is_truthy(&self, key: &str) -> bool {
        match key {
            "all_tagged_hosts" => self.all_tagged_hosts,
            "has_all_tags" => self.has_all_tags,
            "host" => !self.host.is_empty(),
            "hostfile" => non_empty(&self.hostfile),
            "parallel" => self.parallel_hosts().is_some_and(|n| n > 0),
            "tag" => self.tag,
            _ => false,
        }
    }
}

// ============================================================================
// Top-level CLI
// ============================================================================

/// Top-level CLI arguments for cdist.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "cdist",
    version = cdist_core::VERSION,
    about = concat!("cdist ", env!("CARGO_PKG_VERSION")),
    after_help = EPILOG,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Root logging options.
    #[command(flatten)]
    pub logging: LoggingArgs,

    /// Command to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Show cdist banner.
    #[command(after_help = EPILOG)]
    Banner(BannerArgs),

    /// Configure hosts.
    #[command(after_help = EPILOG)]
    Config(ConfigCommandArgs),

    /// Install command.
    #[command(after_help = EPILOG)]
    Install(ConfigCommandArgs),

    /// Manage the host inventory.
    #[command(after_help = EPILOG)]
    Inventory(InventoryCommand),

    /// Run a shell with the cdist environment.
    #[command(after_help = EPILOG)]
    Shell(ShellArgs),
}

/// Arguments for `banner`.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct BannerArgs {
    #[command(flatten)]
    pub logging: LoggingArgs,
}

/// Arguments shared by `config` and `install`.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigCommandArgs {
    #[command(flatten)]
    pub logging: LoggingArgs,

    #[command(flatten)]
    pub beta: BetaArgs,

    #[command(flatten)]
    pub main: ConfigMainArgs,

    #[command(flatten)]
    pub inventory: InventoryArgs,

    #[command(flatten)]
    pub hosts: ConfigArgs,
}

impl ConfigCommandArgs {
    fn is_truthy(&self, key: &str) -> bool {
        match key {
            "beta" => self.beta.beta,
            "inventory_dir" => self.inventory.inventory_dir.is_some(),
            _ => {
                self.logging.is_truthy(key)
                    || self.main.is_truthy(key)
                    || self.hosts.is_truthy(key)
            }
        }
    }
}

/// Arguments for `shell`.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct ShellArgs {
    #[command(flatten)]
    pub logging: LoggingArgs,

    /// Select shell to use, defaults to current shell. Used shell should be
    /// POSIX compatible shell.
    #[arg(short = 's', long = "shell")]
    pub shell: Option<String>,
}

// ============================================================================
// Inventory
// ============================================================================

/// Options every inventory command and sub-command includes.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryCommonArgs {
    #[command(flatten)]
    pub logging: LoggingArgs,

    #[command(flatten)]
    pub beta: BetaArgs,

    #[command(flatten)]
    pub inventory: InventoryArgs,
}

/// Arguments for `inventory`.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryCommand {
    #[command(flatten)]
    pub common: InventoryCommonArgs,

    /// Inventory command to execute.
    #[command(subcommand)]
    pub command: Option<InventorySubcommand>,
}

impl InventoryCommand {
    /// Common options of the sub-command, if one was selected.
    pub fn sub_common(&self) -> Option<&InventoryCommonArgs> {
        self.command.as_ref().map(InventorySubcommand::common)
    }

    /// Inventory directory from the sub-command, else from `inventory` itself.
    pub fn inventory_dir(&self) -> Option<&PathBuf> {
        self.sub_common()
            .and_then(|c| c.inventory.inventory_dir.as_ref())
            .or(self.common.inventory.inventory_dir.as_ref())
    }

    /// Store `dir` at both the `inventory` and the sub-command level.
    pub fn set_inventory_dir(&mut self, dir: Option<PathBuf>) {
        if let Some(sub) = self.command.as_mut() {
            sub.common_mut().inventory.inventory_dir = dir.clone();
        }
        self.common.inventory.inventory_dir = dir;
    }

    fn is_truthy(&self, key: &str) -> bool {
        match key {
            "subcommand" => self.command.is_some(),
            "beta" => self.common.beta.beta || self.sub_common().is_some_and(|c| c.beta.beta),
            "inventory_dir" => self.inventory_dir().is_some(),
            _ => {
                self.common.logging.is_truthy(key)
                    || self.command.as_ref().is_some_and(|sub| sub.is_truthy(key))
            }
        }
    }
}

/// Inventory sub-commands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum InventorySubcommand {
    /// Add host(s) to inventory.
    #[command(after_help = EPILOG)]
    AddHost(AddHostArgs),

    /// Add tag(s) to host(s).
    #[command(after_help = EPILOG)]
    AddTag(TagArgs),

    /// Delete host(s) from inventory.
    #[command(after_help = EPILOG)]
    DelHost(DelHostArgs),

    /// Delete tag(s) from host(s).
    #[command(after_help = EPILOG)]
    DelTag(DelTagArgs),

    /// List host(s) and their tags.
    #[command(after_help = EPILOG)]
    List(ListArgs),
}

impl InventorySubcommand {
    /// Sub-command name as typed on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddHost(_) => "add-host",
            Self::AddTag(_) => "add-tag",
            Self::DelHost(_) => "del-host",
            Self::DelTag(_) => "del-tag",
            Self::List(_) => "list",
        }
    }

    /// Common inventory options of this sub-command.
    pub fn common(&self) -> &InventoryCommonArgs {
        match self {
            Self::AddHost(a) => &a.common,
            Self::AddTag(a) => &a.common,
            Self::DelHost(a) => &a.common,
            Self::DelTag(a) => &a.tags.common,
            Self::List(a) => &a.common,
        }
    }

    fn common_mut(&mut self) -> &mut InventoryCommonArgs {
        match self {
            Self::AddHost(a) => &mut a.common,
            Self::AddTag(a) => &mut a.common,
            Self::DelHost(a) => &mut a.common,
            Self::DelTag(a) => &mut a.tags.common,
            Self::List(a) => &mut a.common,
        }
    }

    fn is_truthy(&self, key: &str) -> bool {
        if self.common().logging.is_truthy(key) {
            return true;
        }
        match self {
            Self::AddHost(a) => a.hosts().is_truthy(key),
            Self::AddTag(a) => a.is_truthy(key),
            Self::DelHost(a) => (key == "all" && a.all) || a.hosts().is_truthy(key),
            Self::DelTag(a) => (key == "all" && a.all) || a.tags.is_truthy(key),
            Self::List(a) => a.is_truthy(key),
        }
    }
}

/// Hosts chosen by an inventory sub-command's positional list and `-f/--file`.
///
/// Each sub-command declares its own pair because the help text differs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostSelection<'a> {
    /// Hosts given on the command line.
    pub host: &'a [String],
    /// Host file, `-` for stdin.
    pub hostfile: Option<&'a str>,
}

impl HostSelection<'_> {
    fn is_truthy(&self, key: &str) -> bool {
        match key {
            "host" => !self.host.is_empty(),
            "hostfile" => self.hostfile.is_some_and(|f| !f.is_empty()),
            _ => false,
        }
    }
}

/// Arguments for `inventory add-host`.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct AddHostArgs {
    #[command(flatten)]
    pub common: InventoryCommonArgs,

    /// Host(s) to add.
    #[arg(value_name = "HOST")]
    pub host: Vec<String>,

    /// Read additional hosts to add from specified file or from stdin if
    /// '-' (each host on separate line). If no host or host file is
    /// specified then, by default, read from stdin.
    #[arg(short = 'f', long = "file", value_name = "HOSTFILE")]
    pub hostfile: Option<String>,
}

impl AddHostArgs {
    /// Selected hosts.
    pub fn hosts(&self) -> HostSelection<'_> {
        HostSelection {
            host: &self.host,
            hostfile: self.hostfile.as_deref(),
        }
    }
}

/// Arguments for `inventory add-tag`, and the tag part of `del-tag`.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct TagArgs {
    #[command(flatten)]
    pub common: InventoryCommonArgs,

    /// List of host(s) for which tags are added or deleted.
    #[arg(value_name = "HOST")]
    pub host: Vec<String>,

    /// Read additional hosts from specified file or from stdin if '-' (each
    /// host on separate line). If no host or host file is specified then, by
    /// default, read from stdin. If no tags/tagfile nor hosts/hostfile are
    /// specified then tags are read from stdin and apply to all hosts.
    #[arg(short = 'f', long = "file", value_name = "HOSTFILE")]
    pub hostfile: Option<String>,

    /// Read additional tags from specified file or from stdin if '-' (each
    /// tag on separate line). If no tag or tag file is specified then, by
    /// default, read from stdin.
    #[arg(short = 'T', long = "tag-file", value_name = "TAGFILE")]
    pub tagfile: Option<String>,

    /// Tag list for specified host(s), comma separated values.
    #[arg(short = 't', long = "taglist", value_delimiter = ',')]
    pub taglist: Vec<String>,
}

impl TagArgs {
    /// Selected hosts.
    pub fn hosts(&self) -> HostSelection<'_> {
        HostSelection {
            host: &self.host,
            hostfile: self.hostfile.as_deref(),
        }
    }

    fn is_truthy(&self, key: &str) -> bool {
        match key {
            "tagfile" => non_empty(&self.tagfile),
            "taglist" => !self.taglist.is_empty(),
            _ => self.hosts().is_truthy(key),
        }
    }
}

/// Arguments for `inventory del-host`.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct DelHostArgs {
    #[command(flatten)]
    pub common: InventoryCommonArgs,

    /// Host(s) to delete.
    #[arg(value_name = "HOST")]
    pub host: Vec<String>,

    /// Delete all hosts.
    #[arg(short = 'a', long = "all")]
    pub all: bool,

    /// Read additional hosts to delete from specified file or from stdin if
    /// '-' (each host on separate line). If no host or host file is
    /// specified then, by default, read from stdin.
    #[arg(short = 'f', long = "file", value_name = "HOSTFILE")]
    pub hostfile: Option<String>,
}

impl DelHostArgs {
    /// Selected hosts.
    pub fn hosts(&self) -> HostSelection<'_> {
        HostSelection {
            host: &self.host,
            hostfile: self.hostfile.as_deref(),
        }
    }
}

/// Arguments for `inventory del-tag`.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct DelTagArgs {
    #[command(flatten)]
    pub tags: TagArgs,

    /// Delete all tags for specified host(s).
    #[arg(short = 'a', long = "all")]
    pub all: bool,
}

/// Arguments for `inventory list`.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct ListArgs {
    #[command(flatten)]
    pub common: InventoryCommonArgs,

    /// Host(s) to list.
    #[arg(value_name = "HOST")]
    pub host: Vec<String>,

    /// List hosts that have all specified tags, if -t/--tag is specified.
    #[arg(short = 'a', long = "all")]
    pub has_all_tags: bool,

    /// Read additional hosts to list from specified file or from stdin if
    /// '-' (each host on separate line). If no host or host file is
    /// specified then, by default, list all.
    #[arg(short = 'f', long = "file", value_name = "HOSTFILE")]
    pub hostfile: Option<String>,

    /// Suppress tags listing.
    #[arg(short = 'H', long = "host-only")]
    pub list_only_host: bool,

    /// Host is specified by tag, not hostname/address; list all hosts that
    /// contain any of specified tags.
    #[arg(short = 't', long = "tag")]
    pub tag: bool,
}

impl ListArgs {
    /// Selected hosts.
    pub fn hosts(&self) -> HostSelection<'_> {
        HostSelection {
            host: &self.host,
            hostfile: self.hostfile.as_deref(),
        }
    }

    fn is_truthy(&self, key: &str) -> bool {
        match key {
            "has_all_tags" => self.has_all_tags,
            "list_only_host" => self.list_only_host,
            "tag" => self.tag,
            _ => self.hosts().is_truthy(key),
        }
    }
}

// ============================================================================
// Namespace accessors
// ============================================================================

impl Commands {
    /// Top-level command name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Banner(_) => "banner",
            Self::Config(_) => "config",
            Self::Install(_) => "install",
            Self::Inventory(_) => "inventory",
            Self::Shell(_) => "shell",
        }
    }

    /// Command path from the root, e.g. `["inventory", "list"]`.
    pub fn path(&self) -> Vec<&'static str> {
        let mut path = vec![self.name()];
        if let Self::Inventory(inv) = self {
            if let Some(sub) = &inv.command {
                path.push(sub.name());
            }
        }
        path
    }

    /// Inventory directory of commands that include the inventory group.
    pub fn inventory_dir(&self) -> Option<&Path> {
        match self {
            Self::Config(a) | Self::Install(a) => a.inventory.inventory_dir.as_deref(),
            Self::Inventory(a) => a.inventory_dir().map(PathBuf::as_path),
            Self::Banner(_) | Self::Shell(_) => None,
        }
    }

    /// Logging options given at command level (and inventory sub-command level).
    pub fn logging(&self) -> LoggingArgs {
        match self {
            Self::Banner(a) => a.logging.clone(),
            Self::Config(a) | Self::Install(a) => a.logging.clone(),
            Self::Inventory(a) => match a.sub_common() {
                Some(sub) => a.common.logging.merge(&sub.logging),
                None => a.common.logging.clone(),
            },
            Self::Shell(a) => a.logging.clone(),
        }
    }
}

impl Cli {
    /// Logging options from the root and the selected command combined.
    ///
    /// `-q` anywhere silences output; `-v` counts add up.
    pub fn effective_logging(&self) -> LoggingArgs {
        self.logging.merge(&self.command.logging())
    }

    /// Log level for this invocation.
    pub fn log_level(&self) -> LogLevel {
        self.effective_logging().log_level()
    }
}

impl BetaNamespace for Cli {
    fn command_name(&self) -> &str {
        self.command.name()
    }

    fn beta_unlocked(&self) -> bool {
        self.is_truthy("beta")
    }

    fn is_truthy(&self, key: &str) -> bool {
        if self.logging.is_truthy(key) {
            return true;
        }
        match &self.command {
            Commands::Banner(a) => a.logging.is_truthy(key),
            Commands::Config(a) | Commands::Install(a) => a.is_truthy(key),
            Commands::Inventory(a) => a.is_truthy(key),
            Commands::Shell(a) => match key {
                "shell" => non_empty(&a.shell),
                _ => a.logging.is_truthy(key),
            },
        }
    }
}

fn non_empty(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

// ============================================================================
// Tests
// ============================================================================
