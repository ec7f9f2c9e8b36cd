//! Wire messages between clients and the relay.
//!
//! Every frame is a JSON object with a `"type"` discriminator and camelCase
//! fields. Game state travels as a full [`GameSession`].

use crate::relay::RelayError;
use sequence_core::{GameSession, Seat};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Messages a client sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Open a new room and take the host seat.
    Create {
        /// Host display name.
        #[serde(default)]
        player_name: Option<String>,
        /// Threshold chosen by the host.
        #[serde(default)]
        sequences_to_win: Option<u32>,
        /// Seat that moves first.
        #[serde(default)]
        first_player: Option<Seat>,
    },
    /// Take the guest seat of an existing room.
    Join {
        /// Room code.
        game_id: String,
        /// Guest display name.
        #[serde(default)]
        player_name: Option<String>,
    },
    /// Publish the state after a local move.
    Move {
        /// Room code, when the connection has not joined one.
        #[serde(default)]
        game_id: Option<String>,
        /// The full state after the move.
        game_state: Box<GameSession>,
    },
}

impl ClientMessage {
    /// Parses one text frame.
    #[instrument(skip(text), fields(len = text.len()))]
    pub fn parse(text: &str) -> Result<Self, RelayError> {
        serde_json::from_str(text).map_err(|e| RelayError::Malformed(e.to_string()))
    }
}

/// Messages the relay sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// Room opened; sent to the host.
    Created {
        /// Room code to share with the guest.
        game_id: String,
        /// Initial state.
        game_state: Box<GameSession>,
    },
    /// Sent to a guest that just joined.
    GameState {
        /// Current state with the guest hand dealt.
        game_state: Box<GameSession>,
    },
    /// Sent to the host when the guest joins.
    PlayerJoined {
        /// Current state with the guest hand dealt.
        game_state: Box<GameSession>,
    },
    /// The other player moved.
    Move {
        /// State after their move.
        game_state: Box<GameSession>,
    },
    /// The other player left.
    PlayerDisconnected,
    /// A request failed.
    Error {
        /// Human-readable reason.
        message: String,
    },
}

impl ServerMessage {
    /// Encodes the message as a JSON text frame.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// An error reply.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}
