//! Parser tree construction.
//!
//! [`ParserTree::build`] turns the clap definition in [`crate::cli`] into the
//! command used for parsing, with environment and host defaults attached,
//! and a [`CommandNode`] description of every command: its option groups,
//! its options, and its dispatch target.
//!
//! The builder checks that every command including a shared option group
//! exposes the group's options with identical flag spellings and
//! destination keys, and that every leaf command has a dispatch target.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use cdist_core::beta::BetaNamespace;
use cdist_core::{Error, LogLevel, Result};
use clap::{Arg, Args, Command, CommandFactory, FromArgMatches};

use crate::cli::{
    BetaArgs, Cli, Commands, ConfigArgs, ConfigMainArgs, InventoryArgs, LoggingArgs,
};
use crate::config::EnvDefaults;
use crate::error::CliError;

// ============================================================================
// Option groups
// ============================================================================

/// A reusable bundle of options shared verbatim by several commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OptionGroup {
    /// `-q/--quiet`, `-v/--verbose`.
    Logging,
    /// `-b/--beta`.
    Beta,
    /// `-I/--inventory`.
    Inventory,
    /// Options controlling how configuration runs.
    ConfigMain,
    /// Host selection for `config`/`install`.
    ConfigArgs,
}

impl OptionGroup {
    /// Every group.
    pub const ALL: [OptionGroup; 5] = [
        Self::Logging,
        Self::Beta,
        Self::Inventory,
        Self::ConfigMain,
        Self::ConfigArgs,
    ];

    /// Group name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Logging => "logging",
            Self::Beta => "beta",
            Self::Inventory => "inventory",
            Self::ConfigMain => "config-main",
            Self::ConfigArgs => "config-args",
        }
    }

    /// Options defined by this group, in declaration order.
    pub fn options(self) -> Vec<OptionSpec> {
        let cmd = Command::new(self.name());
        let cmd = match self {
            Self::Logging => LoggingArgs::augment_args(cmd),
            Self::Beta => BetaArgs::augment_args(cmd),
            Self::Inventory => InventoryArgs::augment_args(cmd),
            Self::ConfigMain => ConfigMainArgs::augment_args(cmd),
            Self::ConfigArgs => ConfigArgs::augment_args(cmd),
        };
        option_specs(&cmd)
    }
}

impl fmt::Display for OptionGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Spelling of one option: destination key and flags.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OptionSpec {
    /// Destination key.
    pub id: String,
    /// Short flag, e.g. `q`.
    pub short: Option<char>,
    /// Long flag without dashes, e.g. `quiet`.
    pub long: Option<String>,
}

impl OptionSpec {
    fn from_arg(arg: &Arg) -> Self {
        Self {
            id: arg.get_id().as_str().to_string(),
            short: arg.get_short(),
            long: arg.get_long().map(str::to_string),
        }
    }

    /// Whether this is a positional argument.
    pub fn is_positional(&self) -> bool {
        self.short.is_none() && self.long.is_none()
    }
}

impl fmt::Display for OptionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.short, &self.long) {
            (Some(s), Some(l)) => write!(f, "-{s}/--{l}"),
            (Some(s), None) => write!(f, "-{s}"),
            (None, Some(l)) => write!(f, "--{l}"),
            (None, None) => write!(f, "{}", self.id),
        }
    }
}

fn option_specs(cmd: &Command) -> Vec<OptionSpec> {
    cmd.get_arguments()
        .filter(|a| !matches!(a.get_id().as_str(), "help" | "version"))
        .map(OptionSpec::from_arg)
        .collect()
}

// ============================================================================
// Dispatch targets
// ============================================================================

/// Entry point a command is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchTarget {
    /// Print the banner.
    Banner,
    /// Configure hosts.
    Config,
    /// Install hosts.
    Install,
    /// Inventory management, including all inventory sub-commands.
    Inventory,
    /// Interactive shell.
    Shell,
}

impl DispatchTarget {
    /// Entry point name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Banner => "banner",
            Self::Config => "config",
            Self::Install => "install",
            Self::Inventory => "inventory",
            Self::Shell => "shell",
        }
    }
}

// ============================================================================
// Layout
// ============================================================================

struct NodeLayout {
    path: &'static [&'static str],
    groups: &'static [OptionGroup],
    dispatch: Option<DispatchTarget>,
}

const LOGGING: &[OptionGroup] = &[OptionGroup::Logging];

const CONFIG_GROUPS: &[OptionGroup] = &[
    OptionGroup::Logging,
    OptionGroup::Beta,
    OptionGroup::ConfigMain,
    OptionGroup::Inventory,
    OptionGroup::ConfigArgs,
];

const INVENTORY_GROUPS: &[OptionGroup] = &[
    OptionGroup::Logging,
    OptionGroup::Beta,
    OptionGroup::Inventory,
];

const LAYOUT: &[NodeLayout] = &[
    NodeLayout {
        path: &[],
        groups: LOGGING,
        dispatch: None,
    },
    NodeLayout {
        path: &["banner"],
        groups: LOGGING,
        dispatch: Some(DispatchTarget::Banner),
    },
    NodeLayout {
        path: &["config"],
        groups: CONFIG_GROUPS,
        dispatch: Some(DispatchTarget::Config),
    },
    NodeLayout {
        path: &["install"],
        groups: CONFIG_GROUPS,
        dispatch: Some(DispatchTarget::Install),
    },
    NodeLayout {
        path: &["inventory"],
        groups: INVENTORY_GROUPS,
        dispatch: Some(DispatchTarget::Inventory),
    },
    NodeLayout {
        path: &["inventory", "add-host"],
        groups: INVENTORY_GROUPS,
        dispatch: Some(DispatchTarget::Inventory),
    },
    NodeLayout {
        path: &["inventory", "add-tag"],
        groups: INVENTORY_GROUPS,
        dispatch: Some(DispatchTarget::Inventory),
    },
    NodeLayout {
        path: &["inventory", "del-host"],
        groups: INVENTORY_GROUPS,
        dispatch: Some(DispatchTarget::Inventory),
    },
    NodeLayout {
        path: &["inventory", "del-tag"],
        groups: INVENTORY_GROUPS,
        dispatch: Some(DispatchTarget::Inventory),
    },
    NodeLayout {
        path: &["inventory", "list"],
        groups: INVENTORY_GROUPS,
        dispatch: Some(DispatchTarget::Inventory),
    },
    NodeLayout {
        path: &["shell"],
        groups: LOGGING,
        dispatch: Some(DispatchTarget::Shell),
    },
];

fn layout_for(path: &[String]) -> Option<&'static NodeLayout> {
    LAYOUT.iter().find(|l| {
        l.path.len() == path.len() && l.path.iter().zip(path).all(|(a, b)| *a == b.as_str())
    })
}

// ============================================================================
// CommandNode
// ============================================================================

/// Description of one command in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandNode {
    /// Command name; empty for the root.
    pub name: String,
    /// Names from the root down to this command.
    pub path: Vec<String>,
    /// Shared option groups this command includes, in order.
    pub groups: Vec<OptionGroup>,
    /// Every option of this command, group options included.
    pub options: Vec<OptionSpec>,
    /// Entry point, if any.
    pub dispatch: Option<DispatchTarget>,
    /// Sub-commands.
    pub children: Vec<CommandNode>,
}

impl CommandNode {
    /// Whether the command has no sub-commands.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Direct sub-command by name.
    pub fn child(&self, name: &str) -> Option<&CommandNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Destination keys of this command's options.
    pub fn option_ids(&self) -> impl Iterator<Item = &str> {
        self.options.iter().map(|o| o.id.as_str())
    }

    /// This node and all its descendants, depth first.
    pub fn walk(&self) -> Vec<&CommandNode> {
        let mut nodes = vec![self];
        for child in &self.children {
            nodes.extend(child.walk());
        }
        nodes
    }

    fn display_path(&self) -> String {
        if self.path.is_empty() {
            "cdist".to_string()
        } else {
            self.path.join(" ")
        }
    }
}

fn describe(cmd: &Command, path: &mut Vec<String>) -> Result<CommandNode> {
    let layout = layout_for(path)
        .ok_or_else(|| Error::layout(format!("unexpected command '{}'", path.join(" "))))?;

    let mut children = Vec::new();
    for sub in cmd.get_subcommands().filter(|s| s.get_name() != "help") {
        path.push(sub.get_name().to_string());
        children.push(describe(sub, path)?);
        path.pop();
    }

    Ok(CommandNode {
        name: path.last().cloned().unwrap_or_default(),
        path: path.clone(),
        groups: layout.groups.to_vec(),
        options: option_specs(cmd),
        dispatch: layout.dispatch,
        children,
    })
}

// ============================================================================
// ParserTree
// ============================================================================

/// The assembled cdist command tree.
///
/// Immutable once built. Build it once at startup and share it by reference.
#[derive(Debug, Clone)]
pub struct ParserTree {
    command: Command,
    root: CommandNode,
    defaults: EnvDefaults,
}

/// Build the parser tree with defaults taken from the process environment.
pub fn build_parser_tree() -> Result<ParserTree> {
    ParserTree::build(&EnvDefaults::from_env())
}

impl ParserTree {
    /// Build the tree, attaching `defaults` to the options they belong to.
    pub fn build(defaults: &EnvDefaults) -> Result<Self> {
        let command = apply_recursive(Cli::command(), &|cmd| apply_defaults(cmd, defaults));
        let root = describe(&command, &mut Vec::new())?;
        verify_tree(&root)?;
        let tree = Self {
            command,
            root,
            defaults: defaults.clone(),
        };
        tracing::debug!(commands = tree.root.walk().len(), "built parser tree");
        Ok(tree)
    }

    /// Root command description.
    pub fn root(&self) -> &CommandNode {
        &self.root
    }

    /// The clap command used for parsing.
    pub fn command(&self) -> &Command {
        &self.command
    }

    /// Defaults the tree was built with.
    pub fn defaults(&self) -> &EnvDefaults {
        &self.defaults
    }

    /// Command description at `path` (empty path is the root).
    pub fn find(&self, path: &[&str]) -> Option<&CommandNode> {
        path.iter()
            .try_fold(&self.root, |node, name| node.child(name))
    }

    /// Dispatch target of the command at `path`.
    pub fn dispatch_target(&self, path: &[&str]) -> Option<DispatchTarget> {
        self.find(path).and_then(|node| node.dispatch)
    }

    /// Parse a command line into an [`Invocation`].
    ///
    /// The first item is the program name, as with `std::env::args_os()`.
    /// The inventory directory of commands including the inventory group is
    /// resolved here, after the command and sub-command levels are merged.
    pub fn parse_from<I, T>(&self, args: I) -> std::result::Result<Invocation, CliError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = self.command.clone().try_get_matches_from(args)?;
        let mut cli = Cli::from_arg_matches(&matches)?;
        resolve_inventory_dir(&mut cli.command, &self.defaults);
        let path = cli.command.path();
        let target = self.dispatch_target(&path).ok_or_else(|| {
            Error::layout(format!("no dispatch target for '{}'", path.join(" ")))
        })?;
        Ok(Invocation { cli, target })
    }
}

/// Check a command tree against the layout.
///
/// Every group a node includes must appear among its options with the same
/// flags and destination key, sibling names must be unique, every leaf needs
/// a dispatch target, and every command of the layout must be present.
pub fn verify_tree(root: &CommandNode) -> Result<()> {
    let group_options: Vec<(OptionGroup, Vec<OptionSpec>)> = OptionGroup::ALL
        .iter()
        .map(|g| (*g, g.options()))
        .collect();

    for node in root.walk() {
        for group in &node.groups {
            let expected = group_options
                .iter()
                .find(|(g, _)| g == group)
                .map(|(_, opts)| opts.as_slice())
                .unwrap_or_default();
            for spec in expected {
                if !node.options.contains(spec) {
                    return Err(Error::group_mismatch(
                        node.display_path(),
                        group.name(),
                        format!("expected {spec} stored as '{}'", spec.id),
                    ));
                }
            }
        }

        for (i, child) in node.children.iter().enumerate() {
            if node.children[..i].iter().any(|c| c.name == child.name) {
                return Err(Error::layout(format!(
                    "duplicate command '{}'",
                    child.display_path()
                )));
            }
        }

        if node.is_leaf() && node.dispatch.is_none() {
            return Err(Error::layout(format!(
                "leaf command '{}' has no dispatch target",
                node.display_path()
            )));
        }
    }

    for layout in LAYOUT {
        let found = layout
            .path
            .iter()
            .try_fold(root, |node, name| node.child(name));
        if found.is_none() {
            return Err(Error::layout(format!(
                "missing command '{}'",
                layout.path.join(" ")
            )));
        }
    }

    Ok(())
}

// ============================================================================
// Defaults
// ============================================================================

fn apply_recursive(cmd: Command, f: &dyn Fn(Command) -> Command) -> Command {
    let names: Vec<String> = cmd
        .get_subcommands()
        .map(|s| s.get_name().to_string())
        .collect();
    names.into_iter().fold(f(cmd), |cmd, name| {
        cmd.mut_subcommand(name, |sub| apply_recursive(sub, f))
    })
}

fn with_arg(cmd: Command, id: &str, f: impl FnOnce(Arg) -> Arg) -> Command {
    if cmd.get_arguments().any(|a| a.get_id().as_str() == id) {
        cmd.mut_arg(id, f)
    } else {
        cmd
    }
}

fn apply_defaults(cmd: Command, defaults: &EnvDefaults) -> Command {
    let cpus = defaults.cpu_count.to_string();
    let mut cmd = cmd.after_help(crate::cli::EPILOG);
    cmd = with_arg(cmd, "jobs", |a| a.default_missing_value(cpus.clone()));
    cmd = with_arg(cmd, "parallel", |a| a.default_missing_value(cpus.clone()));

    if defaults.beta {
        cmd = with_arg(cmd, "beta", |a| a.default_value("true"));
    }

    let env_values = [
        ("cache_path_pattern", &defaults.cache_path_pattern),
        ("remote_copy", &defaults.remote_copy),
        ("remote_exec", &defaults.remote_exec),
    ];
    for (id, value) in env_values {
        if let Some(value) = value {
            cmd = with_arg(cmd, id, |a| a.default_value(value.clone()));
        }
    }
    cmd
}

fn resolve_inventory_dir(command: &mut Commands, defaults: &EnvDefaults) {
    match command {
        Commands::Config(args) | Commands::Install(args) => {
            let dir = defaults.resolve_inventory_dir(args.inventory.inventory_dir.as_deref());
            args.inventory.inventory_dir = dir;
        }
        Commands::Inventory(args) => {
            let dir = defaults.resolve_inventory_dir(args.inventory_dir().map(PathBuf::as_path));
            args.set_inventory_dir(dir);
        }
        Commands::Banner(_) | Commands::Shell(_) => {}
    }
}

// ============================================================================
// Invocation
// ============================================================================

/// A parsed command line bound to its dispatch target.
#[derive(Debug, Clone)]
pub struct Invocation {
    cli: Cli,
    target: DispatchTarget,
}

impl Invocation {
    /// Parsed arguments.
    pub fn cli(&self) -> &Cli {
        &self.cli
    }

    /// Entry point the command is bound to.
    pub fn target(&self) -> DispatchTarget {
        self.target
    }

    /// Command path, e.g. `["inventory", "list"]`.
    pub fn path(&self) -> Vec<&'static str> {
        self.cli.command.path()
    }

    /// Log level for this invocation.
    pub fn log_level(&self) -> LogLevel {
        self.cli.log_level()
    }

    /// Resolved inventory directory.
    ///
    /// `None` for commands without the inventory group, or when neither a
    /// flag, `CDIST_INVENTORY_DIR` nor a home directory is available.
    pub fn inventory_dir(&self) -> Option<&Path> {
        self.cli.command.inventory_dir()
    }
}

impl BetaNamespace for Invocation {
    fn command_name(&self) -> &str {
        self.cli.command_name()
    }

    fn beta_unlocked(&self) -> bool {
        self.cli.beta_unlocked()
    }

    fn is_truthy(&self, key: &str) -> bool {
        self.cli.is_truthy(key)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::cli::InventorySubcommand;
    use proptest::prelude::*;

    fn tree() -> ParserTree {
        ParserTree::build(&EnvDefaults::default().with_cpu_count(6)).unwrap()
    }

    fn tree_with_env(pairs: &[(&str, &str)]) -> ParserTree {
        let pairs: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let defaults = EnvDefaults::from_lookup(|key| {
            pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
        })
        .with_cpu_count(6);
        ParserTree::build(&defaults).unwrap()
    }

    fn config_of(inv: &Invocation) -> &crate::cli::ConfigCommandArgs {
        match &inv.cli().command {
            Commands::Config(a) | Commands::Install(a) => a,
            other => panic!("Expected config or install, got {other:?}"),
        }
    }

    #[test]
    fn test_build_is_idempotent() {
        let a = tree();
        let b = tree();
        assert_eq!(a.root(), b.root());
    }

    #[test]
    fn test_build_from_process_env() {
        let tree = build_parser_tree().unwrap();
        assert!(tree.find(&["config"]).is_some());
    }

    #[test]
    fn test_top_level_commands() {
        let tree = tree();
        let names: Vec<&str> = tree.root().children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["banner", "config", "install", "inventory", "shell"]);
    }

    #[test]
    fn test_inventory_subcommands() {
        let tree = tree();
        let inventory = tree.find(&["inventory"]).unwrap();
        let names: Vec<&str> = inventory.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["add-host", "add-tag", "del-host", "del-tag", "list"]);
    }

    #[test]
    fn test_every_leaf_has_dispatch_target() {
        let tree = tree();
        for node in tree.root().walk() {
            if node.is_leaf() {
                assert!(node.dispatch.is_some(), "{:?} has no target", node.path);
            }
        }
    }

    #[test]
    fn test_dispatch_targets() {
        let tree = tree();
        assert_eq!(tree.dispatch_target(&["banner"]), Some(DispatchTarget::Banner));
        assert_eq!(tree.dispatch_target(&["install"]), Some(DispatchTarget::Install));
        assert_eq!(
            tree.dispatch_target(&["inventory", "del-tag"]),
            Some(DispatchTarget::Inventory)
        );
        assert_eq!(tree.dispatch_target(&[]), None);
        assert_eq!(tree.dispatch_target(&["nope"]), None);
    }

    #[test]
    fn test_groups_are_shared_verbatim() {
        let tree = tree();
        for node in tree.root().walk() {
            for group in &node.groups {
                for spec in group.options() {
                    assert!(
                        node.options.contains(&spec),
                        "{:?} lacks {spec} from {group}",
                        node.path
                    );
                }
            }
        }
    }

    #[test]
    fn test_install_matches_config() {
        let tree = tree();
        let config = tree.find(&["config"]).unwrap();
        let install = tree.find(&["install"]).unwrap();
        assert_eq!(config.options, install.options);
        assert_eq!(config.groups, install.groups);
    }

    #[test]
    fn test_group_contents() {
        let ids: Vec<String> = OptionGroup::ConfigMain
            .options()
            .into_iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(
            ids,
            vec![
                "cache_path_pattern",
                "conf_dir",
                "manifest",
                "jobs",
                "dry_run",
                "out_path",
                "remote_out_path",
                "remote_copy",
                "remote_exec",
            ]
        );

        let logging: Vec<String> = OptionGroup::Logging
            .options()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(logging, vec!["-q/--quiet", "-v/--verbose"]);
    }

    #[test]
    fn test_option_spec_display() {
        let positional = OptionSpec {
            id: "host".into(),
            short: None,
            long: None,
        };
        assert!(positional.is_positional());
        assert_eq!(positional.to_string(), "host");

        let long_only = OptionSpec {
            id: "remote_exec".into(),
            short: None,
            long: Some("remote-exec".into()),
        };
        assert_eq!(long_only.to_string(), "--remote-exec");
    }

    #[test]
    fn test_list_own_options() {
        let tree = tree();
        let list = tree.find(&["inventory", "list"]).unwrap();
        let ids: Vec<&str> = list.option_ids().collect();
        for id in ["host", "has_all_tags", "hostfile", "list_only_host", "tag"] {
            assert!(ids.contains(&id), "list lacks {id}");
        }
    }

    // ------------------------------------------------------------------------
    // Parsing through the tree
    // ------------------------------------------------------------------------

    #[test]
    fn test_parse_binds_target() {
        let inv = tree().parse_from(["cdist", "inventory", "list"]).unwrap();
        assert_eq!(inv.target(), DispatchTarget::Inventory);
        assert_eq!(inv.path(), vec!["inventory", "list"]);
        assert!(matches!(
            inv.cli().command,
            Commands::Inventory(crate::cli::InventoryCommand {
                command: Some(InventorySubcommand::List(_)),
                ..
            })
        ));
    }

    #[test]
    fn test_jobs_without_value_uses_cpu_count() {
        let inv = tree().parse_from(["cdist", "config", "-j"]).unwrap();
        assert_eq!(config_of(&inv).main.jobs, Some(6));
    }

    #[test]
    fn test_parallel_without_value_uses_cpu_count() {
        let inv = tree().parse_from(["cdist", "config", "-p"]).unwrap();
        assert_eq!(config_of(&inv).hosts.parallel_hosts(), Some(6));
    }

    #[test]
    fn test_jobs_explicit_value() {
        let inv = tree().parse_from(["cdist", "config", "--jobs=3"]).unwrap();
        assert_eq!(config_of(&inv).main.jobs, Some(3));
    }

    #[test]
    fn test_jobs_absent() {
        let inv = tree().parse_from(["cdist", "config", "h1"]).unwrap();
        assert_eq!(config_of(&inv).main.jobs, None);
        assert!(!inv.is_truthy("jobs"));
    }

    #[test]
    fn test_invalid_jobs_is_usage_error() {
        let err = tree().parse_from(["cdist", "config", "-j", "0"]).unwrap_err();
        assert!(matches!(err, CliError::Clap(_)));
        assert!(err.to_string().contains("invalid positive int value"));

        let err = tree().parse_from(["cdist", "config", "-j", "abc"]).unwrap_err();
        assert!(err.to_string().contains("abc is invalid int value"));
    }

    #[test]
    fn test_env_beta_unlocks_by_default() {
        let tree = tree_with_env(&[("CDIST_BETA", "1")]);
        let inv = tree.parse_from(["cdist", "config", "-j", "2"]).unwrap();
        assert!(inv.beta_unlocked());

        let inv = tree.parse_from(["cdist", "inventory", "list"]).unwrap();
        assert!(inv.beta_unlocked());
    }

    #[test]
    fn test_no_env_beta_locked() {
        let inv = tree().parse_from(["cdist", "config"]).unwrap();
        assert!(!inv.beta_unlocked());
    }

    #[test]
    fn test_env_values_are_defaults() {
        let tree = tree_with_env(&[
            ("CDIST_REMOTE_EXEC", "ssh -o User=root"),
            ("CDIST_REMOTE_COPY", "scp -o User=root"),
            ("CDIST_CACHE_PATH_PATTERN", "%N"),
            ("CDIST_INVENTORY_DIR", "/srv/inv"),
        ]);
        let inv = tree.parse_from(["cdist", "install", "h1"]).unwrap();
        let args = config_of(&inv);
        assert_eq!(args.main.remote_exec.as_deref(), Some("ssh -o User=root"));
        assert_eq!(args.main.remote_copy.as_deref(), Some("scp -o User=root"));
        assert_eq!(args.main.cache_path_pattern.as_deref(), Some("%N"));
        assert_eq!(args.inventory.inventory_dir, Some(PathBuf::from("/srv/inv")));
        assert_eq!(inv.inventory_dir(), Some(Path::new("/srv/inv")));
    }

    #[test]
    fn test_explicit_flag_beats_env() {
        let tree = tree_with_env(&[("CDIST_REMOTE_EXEC", "ssh")]);
        let inv = tree
            .parse_from(["cdist", "config", "--remote-exec", "rsh", "h1"])
            .unwrap();
        assert_eq!(config_of(&inv).main.remote_exec.as_deref(), Some("rsh"));
    }

    fn inventory_of(inv: &Invocation) -> &crate::cli::InventoryCommand {
        match &inv.cli().command {
            Commands::Inventory(a) => a,
            other => panic!("Expected inventory, got {other:?}"),
        }
    }

    #[test]
    fn test_explicit_inventory_beats_env() {
        let tree = tree_with_env(&[("CDIST_INVENTORY_DIR", "/env")]);
        let inv = tree
            .parse_from(["cdist", "inventory", "-b", "-I", "/explicit", "list"])
            .unwrap();
        assert_eq!(inv.inventory_dir(), Some(Path::new("/explicit")));
        assert_eq!(
            inventory_of(&inv).inventory_dir(),
            Some(&PathBuf::from("/explicit"))
        );

        let inv = tree
            .parse_from(["cdist", "inventory", "-b", "list", "-I", "/inner"])
            .unwrap();
        assert_eq!(inv.inventory_dir(), Some(Path::new("/inner")));

        let inv = tree
            .parse_from(["cdist", "config", "-I", "/x", "h1"])
            .unwrap();
        assert_eq!(inv.inventory_dir(), Some(Path::new("/x")));
    }

    #[test]
    fn test_inventory_env_then_home() {
        let tree = tree_with_env(&[("CDIST_INVENTORY_DIR", "/env"), ("HOME", "/home/u")]);
        let inv = tree.parse_from(["cdist", "inventory", "-b", "list"]).unwrap();
        assert_eq!(inv.inventory_dir(), Some(Path::new("/env")));

        let tree = tree_with_env(&[("HOME", "/home/u")]);
        let inv = tree.parse_from(["cdist", "install", "-b", "h1"]).unwrap();
        assert_eq!(
            inv.inventory_dir(),
            Some(Path::new("/home/u/.cdist/inventory"))
        );

        let inv = tree.parse_from(["cdist", "banner"]).unwrap();
        assert!(inv.inventory_dir().is_none());
    }

    #[test]
    fn test_inventory_flag_has_no_env_default() {
        let tree = tree_with_env(&[("CDIST_INVENTORY_DIR", "/env")]);
        let inventory = tree
            .command()
            .find_subcommand("inventory")
            .unwrap();
        let arg = inventory
            .get_arguments()
            .find(|a| a.get_id().as_str() == "inventory_dir")
            .unwrap();
        assert!(arg.get_default_values().is_empty());
    }

    // ------------------------------------------------------------------------
    // verify_tree tests
    // ------------------------------------------------------------------------

    fn node_mut<'a>(root: &'a mut CommandNode, path: &[&str]) -> &'a mut CommandNode {
        path.iter().fold(root, |node, name| {
            node.children
                .iter_mut()
                .find(|c| c.name == *name)
                .unwrap()
        })
    }

    #[test]
    fn test_verify_accepts_built_tree() {
        verify_tree(tree().root()).unwrap();
    }

    #[test]
    fn test_verify_rejects_missing_group_option() {
        let mut root = tree().root().clone();
        let list = node_mut(&mut root, &["inventory", "list"]);
        list.options.retain(|o| o.id != "quiet");

        match verify_tree(&root).unwrap_err() {
            Error::GroupMismatch { command, group, detail } => {
                assert_eq!(command, "inventory list");
                assert_eq!(group, "logging");
                assert!(detail.contains("-q/--quiet"));
            }
            other => panic!("Expected GroupMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_verify_rejects_respelled_group_option() {
        let mut root = tree().root().clone();
        let config = node_mut(&mut root, &["config"]);
        for option in &mut config.options {
            if option.id == "jobs" {
                option.long = Some("job-count".into());
            }
        }

        assert!(matches!(
            verify_tree(&root),
            Err(Error::GroupMismatch { ref group, .. }) if group == "config-main"
        ));
    }

    #[test]
    fn test_verify_rejects_duplicate_sibling() {
        let mut root = tree().root().clone();
        let banner = root.child("banner").unwrap().clone();
        root.children.push(banner);

        match verify_tree(&root).unwrap_err() {
            Error::Layout(msg) => assert!(msg.contains("duplicate command 'banner'")),
            other => panic!("Expected Layout, got {other:?}"),
        }
    }

    #[test]
    fn test_verify_rejects_leaf_without_target() {
        let mut root = tree().root().clone();
        node_mut(&mut root, &["inventory", "del-tag"]).dispatch = None;

        match verify_tree(&root).unwrap_err() {
            Error::Layout(msg) => {
                assert!(msg.contains("leaf command 'inventory del-tag' has no dispatch target"));
            }
            other => panic!("Expected Layout, got {other:?}"),
        }
    }

    #[test]
    fn test_verify_rejects_missing_command() {
        let mut root = tree().root().clone();
        root.children.retain(|c| c.name != "shell");

        match verify_tree(&root).unwrap_err() {
            Error::Layout(msg) => assert!(msg.contains("missing command 'shell'")),
            other => panic!("Expected Layout, got {other:?}"),
        }
    }

    #[test]
    fn test_help_is_clap_error_with_zero_exit() {
        let err = tree().parse_from(["cdist", "--help"]).unwrap_err();
        assert_eq!(err.exit_code(), 0);
    }

    #[test]
    fn test_version_is_clap_error_with_zero_exit() {
        let err = tree().parse_from(["cdist", "-V"]).unwrap_err();
        assert_eq!(err.exit_code(), 0);
    }

    #[test]
    fn test_epilog_on_every_command() {
        let tree = tree();
        let mut cmd = tree.command().clone();
        let help = cmd.render_help().to_string();
        assert!(help.contains(crate::cli::EPILOG));
        let sub = cmd
            .find_subcommand_mut("inventory")
            .and_then(|c| c.find_subcommand_mut("add-host"))
            .unwrap();
        assert!(sub.render_help().to_string().contains(crate::cli::EPILOG));
    }

    proptest! {
        #[test]
        fn prop_positive_jobs_parse(n in 1usize..100_000) {
            let value = n.to_string();
            let inv = tree().parse_from(["cdist", "config", "-j", value.as_str()]).unwrap();
            prop_assert_eq!(config_of(&inv).main.jobs, Some(n));
        }

        #[test]
        fn prop_non_positive_parallel_rejected(n in i64::MIN..=0) {
            let value = format!("--parallel={n}");
            prop_assert!(tree().parse_from(["cdist", "config", value.as_str()]).is_err());
        }
    }
}
