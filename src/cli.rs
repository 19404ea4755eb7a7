use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "gtasks-sync", version)]
#[command(about = "Synchronize Google Tasks into a local block graph")]
pub struct Cli {
    /// Defaults to `sync`
    #[command(subcommand)]
    pub cmd: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run one full sync
    Sync,
    /// Show what a sync would change without writing anything
    DryRun,
    /// Exchange the stored refresh token for a new access token
    Refresh,
    /// Write a default configuration file
    InitConfig {
        /// Where to write it; the user config directory when omitted
        path: Option<PathBuf>,
    },
}

impl Cli {
    pub fn command_or_default(&self) -> &Command {
        self.cmd.as_ref().unwrap_or(&Command::Sync)
    }
}
