use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "serial-registry")]
#[command(about = "Hologram serial registry: bulk import, lookup and consistency checks")]
pub struct Cli {
    /// Path to a TOML settings file; built-in defaults apply without one.
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Rebuild the registry from CSV exports of the two sheets, then run
    /// the consistency check.
    Import {
        /// Range sheet: Row, Reference Number, Description, Start Serial,
        /// End Serial, Date.
        ranges: PathBuf,
        /// Invalid sheet: one serial per line.
        invalids: PathBuf,
    },

    /// Validate a single serial against a registry loaded from CSV exports.
    Check {
        serial: String,
        #[arg(long)]
        ranges: Option<PathBuf>,
        #[arg(long)]
        invalids: Option<PathBuf>,
    },

    /// Handle one inbound message the way the webhook would: validate,
    /// audit, and reply through the configured SMS gateway.
    Message {
        sender: String,
        text: String,
        #[arg(long)]
        ranges: Option<PathBuf>,
        #[arg(long)]
        invalids: Option<PathBuf>,
    },

    /// Report malformed ranges and collisions in a range sheet.
    Dbcheck { ranges: PathBuf },
}
