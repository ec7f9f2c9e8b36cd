//! Sequence relay - CLI entry point

#![warn(missing_docs)]

use anyhow::Result;
use clap::Parser;
use sequence_core::{Board, BoardLayout};
use sequence_server::{Cli, Command, Relay, ServerConfig, serve};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,sequence_server=debug,sequence_core=debug")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { config, host, port } => run_server(config, host, port).await,
        Command::Layout => print_layout(),
    }
}

/// Run the relay server
#[instrument]
async fn run_server(config: Option<PathBuf>, host: Option<String>, port: Option<u16>) -> Result<()> {
    let config = ServerConfig::load(config.as_deref())?.with_overrides(host, port);
    info!(addr = %config.bind_addr(), "Starting Sequence relay");

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    let relay = Arc::new(Relay::new(config));
    serve(listener, relay).await?;
    Ok(())
}

/// Print the canonical board and check its invariants
#[instrument]
fn print_layout() -> Result<()> {
    let layout = BoardLayout::canonical();
    layout.validate()?;
    println!("{}", Board::from_layout(&layout).display());
    println!();
    println!("Layout valid: 4 free corners, every card twice");
    Ok(())
}
