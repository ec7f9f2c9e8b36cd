//! Command-line interface for sequence_server.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Sequence relay - pairs two players by room code over WebSocket
#[derive(Parser, Debug)]
#[command(name = "sequence_server")]
#[command(about = "WebSocket relay for two-player Sequence games", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Run the relay server
    Serve {
        /// Path to a TOML config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides config and PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print and validate the board layout
    Layout,
}
