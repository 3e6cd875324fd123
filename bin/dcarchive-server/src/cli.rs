//! Command-line interface.

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "dcarchive-server", version, about = "Discord desktop build archive")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Serve the read API (the default).
    Serve,
    /// Run one discovery pass and archive every confirmed build.
    Populate {
        /// Probe and print the records as JSON without touching the database.
        #[arg(long)]
        dry_run: bool,
    },
    /// Create the database and apply pending migrations.
    Setup,
    /// Delete every archived build and module.
    Nuke {
        /// Required; there is no undo.
        #[arg(long)]
        yes: bool,
    },
    /// Print the effective discovery configuration as TOML.
    DiscoveryConfig,
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve)
    }
}
