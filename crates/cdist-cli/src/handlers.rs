//! Handlers shipped with the `cdist` binary.
//!
//! This front-end implements `banner` itself. The configuration engine,
//! the inventory store and the shell live outside this workspace; their
//! targets report [`cdist_core::Error::NotAvailable`] until an engine
//! provides its own [`CommandHandlers`].

use std::io::{self, Write};

use cdist_core::{Error, Result};

use crate::app::CommandHandlers;
use crate::cli::{BannerArgs, ConfigCommandArgs, InventoryCommand, ShellArgs};

const BANNER: &str = r#"
              .___.__          __
  ____   __| _/|__| _______/  |_
_/ ___\ / __ | |  |/  ___/\   __\
\  \___/ /_/ | |  |\___ \  |  |
 \___  >____ | |__/____  > |__|
     \/     \/         \/
"#;

/// Write the cdist banner followed by the version line.
pub fn write_banner(out: &mut impl Write) -> io::Result<()> {
    out.write_all(BANNER.as_bytes())?;
    writeln!(out)?;
    writeln!(out, "cdist {}", cdist_core::VERSION)?;
    out.flush()
}

/// Handlers for the `cdist` binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinHandlers;

impl CommandHandlers for BuiltinHandlers {
    fn banner(&self, _args: &BannerArgs) -> Result<()> {
        write_banner(&mut io::stdout().lock())?;
        Ok(())
    }

    fn config(&self, _args: &ConfigCommandArgs) -> Result<()> {
        Err(Error::not_available("config"))
    }

    fn install(&self, _args: &ConfigCommandArgs) -> Result<()> {
        Err(Error::not_available("install"))
    }

    fn inventory(&self, args: &InventoryCommand) -> Result<()> {
        let command = match &args.command {
            Some(sub) => format!("inventory {}", sub.name()),
            None => "inventory".to_string(),
        };
        Err(Error::not_available(command))
    }

    fn shell(&self, _args: &ShellArgs) -> Result<()> {
        Err(Error::not_available("shell"))
    }
}
