//! Sequence relay server
//!
//! Pairs two WebSocket connections by a short room code and relays game
//! state between them. The relay seeds each match (shuffled deck, dealt
//! hands) with `sequence_core` but leaves rule enforcement to the clients.
//!
//! # Architecture
//!
//! - **Protocol**: tagged JSON messages exchanged with clients
//! - **Room**: registry of live rooms and their latest state
//! - **Relay**: per-connection dispatch of client messages
//! - **Server**: axum routes and the socket pump
//! - **Config**: TOML file, `PORT` variable and CLI overrides

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod cli;
mod config;
mod protocol;
mod relay;
mod room;
mod server;

// Crate-level exports - CLI
pub use cli::{Cli, Command};

// Crate-level exports - Configuration
pub use config::{ConfigError, ServerConfig};

// Crate-level exports - Wire protocol
pub use protocol::{ClientMessage, ServerMessage};

// Crate-level exports - Rooms and relay
pub use relay::{Connection, Relay, RelayError};
pub use room::{ConnectionId, Joined, Peer, Room, RoomRegistry, RoomSummary};

// Crate-level exports - HTTP server
pub use server::{router, serve};
