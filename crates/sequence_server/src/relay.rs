//! Message dispatch for one connection.
//!
//! The relay carries no game rules. It seeds new matches and seats the
//! guest through `sequence_core`, then stores and forwards whatever state
//! the peers publish.

use crate::config::ServerConfig;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::room::{ConnectionId, Peer, RoomRegistry};
use derive_more::{Display, Error};
use sequence_core::{GameSession, Seat};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

/// Default host name when the client sends none.
const DEFAULT_HOST_NAME: &str = "Player 1";

/// Default guest name when the client sends none.
const DEFAULT_GUEST_NAME: &str = "Player 2";

/// A request the relay could not serve. The display text goes back to the
/// client in an `error` message.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum RelayError {
    /// No room has this code.
    #[display("Game not found")]
    GameNotFound,
    /// Both seats are taken.
    #[display("Game already has two players")]
    RoomFull,
    /// The connection tried to join the room it already sits in.
    #[display("Already in this game")]
    AlreadyInGame,
    /// A move arrived from a connection without a seat.
    #[display("Not in a game")]
    NotInGame,
    /// Every room code of the configured length is taken.
    #[display("No room codes available")]
    NoCodesAvailable,
    /// The frame was not a valid client message.
    #[display("Invalid message: {}", _0)]
    Malformed(#[error(not(source))] String),
}

/// Per-socket state.
#[derive(Debug)]
pub struct Connection {
    peer: Peer,
    room: Option<(String, Seat)>,
}

impl Connection {
    /// Connection id.
    pub fn id(&self) -> ConnectionId {
        self.peer.id()
    }

    /// Room code and seat, once created or joined.
    pub fn room(&self) -> Option<(&str, Seat)> {
        self.room.as_ref().map(|(code, seat)| (code.as_str(), *seat))
    }

    fn reply(&self, message: ServerMessage) {
        self.peer.send(message);
    }
}

/// Dispatches client messages against the room registry.
#[derive(Debug)]
pub struct Relay {
    registry: RoomRegistry,
    config: ServerConfig,
    next_id: AtomicU64,
}

impl Relay {
    /// Creates a relay with an empty registry.
    #[instrument(skip(config))]
    pub fn new(config: ServerConfig) -> Self {
        Self {
            registry: RoomRegistry::new(*config.room_code_length()),
            config,
            next_id: AtomicU64::new(1),
        }
    }

    /// The room registry.
    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    /// The active configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Registers a new socket whose outbound frames go to `tx`.
    #[instrument(skip(self, tx))]
    pub fn connect(&self, tx: mpsc::Sender<ServerMessage>) -> Connection {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(connection = id, "Client connected");
        Connection {
            peer: Peer::new(id, tx),
            room: None,
        }
    }

    /// Handles one text frame. Failures are answered with an `error`
    /// message; the connection stays open.
    #[instrument(skip(self, conn, text), fields(connection = conn.id()))]
    pub fn handle_text(&self, conn: &mut Connection, text: &str) {
        let result = ClientMessage::parse(text).and_then(|message| self.handle(conn, message));
        if let Err(e) = result {
            debug!(error = %e, "Request failed");
            conn.reply(ServerMessage::error(e.to_string()));
        }
    }

    /// Dispatches one parsed message.
    #[instrument(skip(self, conn, message), fields(connection = conn.id()))]
    pub fn handle(&self, conn: &mut Connection, message: ClientMessage) -> Result<(), RelayError> {
        match message {
            ClientMessage::Create {
                player_name,
                sequences_to_win,
                first_player,
            } => self.create(conn, player_name, sequences_to_win, first_player),
            ClientMessage::Join {
                game_id,
                player_name,
            } => self.join(conn, game_id, player_name),
            ClientMessage::Move {
                game_id,
                game_state,
            } => self.relay_move(conn, game_id, *game_state),
        }
    }

    fn create(
        &self,
        conn: &mut Connection,
        player_name: Option<String>,
        sequences_to_win: Option<u32>,
        first_player: Option<Seat>,
    ) -> Result<(), RelayError> {
        self.leave_current(conn);
        let name = non_empty(player_name).unwrap_or_else(|| DEFAULT_HOST_NAME.to_string());
        let options = self.config.match_options(sequences_to_win, first_player);
        let state = self.registry.create(conn.peer.clone(), &name, options)?;

        let code = state.game_id().unwrap_or_default().to_string();
        info!(%code, host = %name, "Game created");
        conn.room = Some((code.clone(), Seat::Host));
        conn.reply(ServerMessage::Created {
            game_id: code,
            game_state: Box::new(state),
        });
        Ok(())
    }

    fn join(
        &self,
        conn: &mut Connection,
        game_id: String,
        player_name: Option<String>,
    ) -> Result<(), RelayError> {
        let code = game_id.trim().to_uppercase();
        if conn.room().is_some_and(|(current, _)| current == code) {
            return Err(RelayError::AlreadyInGame);
        }
        let name = non_empty(player_name).unwrap_or_else(|| DEFAULT_GUEST_NAME.to_string());
        let joined = self.registry.join(
            &code,
            conn.peer.clone(),
            &name,
            *self.config.hand_size(),
        )?;

        self.leave_current(conn);
        conn.room = Some((code.clone(), Seat::Guest));
        info!(%code, guest = %name, "Player joined");

        conn.reply(ServerMessage::GameState {
            game_state: Box::new(joined.state.clone()),
        });
        match joined.host {
            Some(host) => host.send(ServerMessage::PlayerJoined {
                game_state: Box::new(joined.state),
            }),
            None => warn!(%code, "Host gone before guest joined"),
        }
        Ok(())
    }

    fn relay_move(
        &self,
        conn: &mut Connection,
        game_id: Option<String>,
        state: GameSession,
    ) -> Result<(), RelayError> {
        let (code, seat) = match &conn.room {
            Some((code, seat)) => (code.clone(), *seat),
            None => {
                return Err(match game_id {
                    Some(id) if self.registry.state(&id).is_none() => RelayError::GameNotFound,
                    _ => RelayError::NotInGame,
                });
            }
        };

        let (state, other) = self.registry.record_move(&code, seat, state)?;
        match other {
            Some(peer) => {
                debug!(%code, from = %seat, "Forwarding move");
                peer.send(ServerMessage::Move {
                    game_state: Box::new(state),
                });
            }
            None => debug!(%code, from = %seat, "Other player not connected, move stored"),
        }
        Ok(())
    }

    /// Releases the connection's seat, notifying the other peer.
    #[instrument(skip(self, conn), fields(connection = conn.id()))]
    pub fn disconnect(&self, conn: &mut Connection) {
        debug!("Client disconnected");
        self.leave_current(conn);
    }

    fn leave_current(&self, conn: &mut Connection) {
        if let Some((code, seat)) = conn.room.take() {
            if let Some(other) = self.registry.leave(&code, seat, conn.id()) {
                info!(%code, left = %seat, "Notifying other player");
                other.send(ServerMessage::PlayerDisconnected);
            }
        }
    }
}

fn non_empty(name: Option<String>) -> Option<String> {
    name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(relay: &Relay) -> (Connection, mpsc::Receiver<ServerMessage>) {
        let (tx, rx) = mpsc::channel(16);
        (relay.connect(tx), rx)
    }

    fn created_code(rx: &mut mpsc::Receiver<ServerMessage>) -> String {
        match rx.try_recv() {
            Ok(ServerMessage::Created { game_id, .. }) => game_id,
            other => panic!("expected created, got {:?}", other),
        }
    }

    #[test]
    fn test_create_replies_with_code() {
        let relay = Relay::new(ServerConfig::default());
        let (mut host, mut rx) = client(&relay);
        relay.handle_text(&mut host, r#"{"type":"create","playerName":"ann"}"#);
        let code = created_code(&mut rx);
        assert_eq!(host.room(), Some((code.as_str(), Seat::Host)));
        let state = relay.registry().state(&code).unwrap();
        assert_eq!(state.player(Seat::Host).name(), "ann");
    }

    #[test]
    fn test_join_notifies_both_sides() {
        let relay = Relay::new(ServerConfig::default());
        let (mut host, mut host_rx) = client(&relay);
        relay.handle_text(&mut host, r#"{"type":"create"}"#);
        let code = created_code(&mut host_rx);

        let (mut guest, mut guest_rx) = client(&relay);
        relay.handle_text(
            &mut guest,
            &format!(r#"{{"type":"join","gameId":"{}"}}"#, code.to_lowercase()),
        );

        match guest_rx.try_recv() {
            Ok(ServerMessage::GameState { game_state }) => {
                assert_eq!(game_state.player(Seat::Guest).name(), "Player 2");
                assert_eq!(game_state.player(Seat::Guest).hand().len(), 7);
            }
            other => panic!("expected gameState, got {:?}", other),
        }
        assert!(matches!(
            host_rx.try_recv(),
            Ok(ServerMessage::PlayerJoined { .. })
        ));
    }

    #[test]
    fn test_join_unknown_game() {
        let relay = Relay::new(ServerConfig::default());
        let (mut guest, mut rx) = client(&relay);
        relay.handle_text(&mut guest, r#"{"type":"join","gameId":"ZZZZZZ"}"#);
        assert_eq!(rx.try_recv().ok(), Some(ServerMessage::error("Game not found")));
        assert_eq!(guest.room(), None);
    }

    #[test]
    fn test_host_joining_own_room_keeps_it() {
        let relay = Relay::new(ServerConfig::default());
        let (mut host, mut rx) = client(&relay);
        relay.handle_text(&mut host, r#"{"type":"create"}"#);
        let code = created_code(&mut rx);

        relay.handle_text(&mut host, &format!(r#"{{"type":"join","gameId":"{}"}}"#, code));
        assert_eq!(rx.try_recv().ok(), Some(ServerMessage::error("Already in this game")));
        assert_eq!(host.room(), Some((code.as_str(), Seat::Host)));
        let state = relay.registry().state(&code).unwrap();
        assert!(state.player(Seat::Guest).hand().is_empty());
        assert_eq!(relay.registry().summaries()[0].players, 1);
    }

    #[test]
    fn test_garbage_gets_error_reply() {
        let relay = Relay::new(ServerConfig::default());
        let (mut conn, mut rx) = client(&relay);
        relay.handle_text(&mut conn, "{{{");
        match rx.try_recv() {
            Ok(ServerMessage::Error { message }) => assert!(message.starts_with("Invalid message")),
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[test]
    fn test_move_without_room() {
        let relay = Relay::new(ServerConfig::default());
        let (mut conn, mut rx) = client(&relay);
        relay.handle_text(&mut conn, r#"{"type":"move","gameState":{}}"#);
        assert_eq!(rx.try_recv().ok(), Some(ServerMessage::error("Not in a game")));
    }
}
