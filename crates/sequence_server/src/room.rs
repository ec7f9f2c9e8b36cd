//! Rooms: two peers paired by a code, plus the latest relayed state.

use crate::protocol::ServerMessage;
use crate::relay::RelayError;
use derive_new::new;
use rand::Rng;
use sequence_core::{GameSession, MatchOptions, Seat};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, instrument, warn};

/// Characters used in room codes.
const CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Random draws tried before giving up on finding an unused code.
const MAX_CODE_ATTEMPTS: usize = 64;

/// Unique id of one socket connection.
pub type ConnectionId = u64;

/// One end of a socket, as the registry sees it.
#[derive(Debug, Clone, new)]
pub struct Peer {
    id: ConnectionId,
    tx: mpsc::Sender<ServerMessage>,
}

impl Peer {
    /// Connection id.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queues a message for the peer's writer task. Never blocks.
    pub fn send(&self, message: ServerMessage) {
        match self.tx.try_send(message) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!(connection = self.id, "Outbound queue full, dropping message")
            }
            Err(TrySendError::Closed(_)) => {
                debug!(connection = self.id, "Peer already closed")
            }
        }
    }
}

/// A paired game.
#[derive(Debug)]
pub struct Room {
    code: String,
    host: Option<Peer>,
    guest: Option<Peer>,
    state: GameSession,
    last_activity: Instant,
}

impl Room {
    fn peer(&self, seat: Seat) -> Option<&Peer> {
        match seat {
            Seat::Host => self.host.as_ref(),
            Seat::Guest => self.guest.as_ref(),
        }
    }

    fn player_count(&self) -> usize {
        usize::from(self.host.is_some()) + usize::from(self.guest.is_some())
    }

    fn touch(&mut self) {
        self.last_activity = Instant::now();
    }
}

/// Public view of a room for the `/rooms` listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    /// Room code.
    pub code: String,
    /// Connected peers (0 to 2).
    pub players: usize,
    /// Seconds since the last message.
    pub idle_secs: u64,
}

/// Result of a successful join.
#[derive(Debug)]
pub struct Joined {
    /// State with the guest seated.
    pub state: GameSession,
    /// Host to notify, if still connected.
    pub host: Option<Peer>,
}

/// All live rooms, keyed by code.
#[derive(Debug, Clone)]
pub struct RoomRegistry {
    rooms: Arc<Mutex<HashMap<String, Room>>>,
    code_length: usize,
}

impl RoomRegistry {
    /// Creates an empty registry that generates codes of `code_length`.
    #[instrument]
    pub fn new(code_length: usize) -> Self {
        info!("Creating room registry");
        Self {
            rooms: Arc::new(Mutex::new(HashMap::new())),
            code_length,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Room>> {
        self.rooms.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn generate_code<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        (0..self.code_length)
            .map(|_| char::from(CODE_CHARSET[rng.gen_range(0..CODE_CHARSET.len())]))
            .collect()
    }

    /// Opens a room for `host`, starting a fresh match.
    ///
    /// Codes are regenerated on collision, a bounded number of times.
    #[instrument(skip(self, host), fields(connection = host.id))]
    pub fn create(
        &self,
        host: Peer,
        host_name: &str,
        options: MatchOptions,
    ) -> Result<GameSession, RelayError> {
        let mut rng = rand::thread_rng();
        let mut rooms = self.lock();

        let code = (0..MAX_CODE_ATTEMPTS)
            .map(|_| self.generate_code(&mut rng))
            .find(|code| !rooms.contains_key(code))
            .ok_or_else(|| {
                warn!(rooms = rooms.len(), "No unused room code found");
                RelayError::NoCodesAvailable
            })?;

        let state = GameSession::start(code.clone(), host_name, options, &mut rng);
        rooms.insert(
            code.clone(),
            Room {
                code: code.clone(),
                host: Some(host),
                guest: None,
                state: state.clone(),
                last_activity: Instant::now(),
            },
        );
        info!(%code, rooms = rooms.len(), "Room created");
        Ok(state)
    }

    /// Seats `guest` in room `code` and deals their hand.
    #[instrument(skip(self, guest), fields(connection = guest.id))]
    pub fn join(
        &self,
        code: &str,
        guest: Peer,
        guest_name: &str,
        hand_size: usize,
    ) -> Result<Joined, RelayError> {
        let mut rooms = self.lock();
        let room = rooms.get_mut(code).ok_or_else(|| {
            debug!(code, "Join for unknown room");
            RelayError::GameNotFound
        })?;
        if room.guest.is_some() {
            warn!(code, "Room already full");
            return Err(RelayError::RoomFull);
        }

        room.state.seat_guest(guest_name, hand_size);
        room.guest = Some(guest);
        room.touch();
        info!(code, guest = guest_name, "Guest joined");
        Ok(Joined {
            state: room.state.clone(),
            host: room.host.clone(),
        })
    }

    /// Stores the state relayed by `from` and returns the other peer.
    #[instrument(skip(self, state))]
    pub fn record_move(
        &self,
        code: &str,
        from: Seat,
        mut state: GameSession,
    ) -> Result<(GameSession, Option<Peer>), RelayError> {
        let mut rooms = self.lock();
        let room = rooms.get_mut(code).ok_or(RelayError::GameNotFound)?;

        state.reconcile();
        state.set_game_id(room.code.clone());
        room.state = state.clone();
        room.touch();
        debug!(
            code,
            current = %state.current_player(),
            winner = ?state.winner(),
            "State relayed"
        );
        Ok((state, room.peer(from.other()).cloned()))
    }

    /// Detaches connection `id` from its seat in room `code`.
    ///
    /// Returns the other peer, who should be told. The room is dropped
    /// when the host leaves or nobody is left.
    #[instrument(skip(self))]
    pub fn leave(&self, code: &str, seat: Seat, id: ConnectionId) -> Option<Peer> {
        let mut rooms = self.lock();
        let room = rooms.get_mut(code)?;

        let slot = match seat {
            Seat::Host => &mut room.host,
            Seat::Guest => &mut room.guest,
        };
        if slot.as_ref().is_some_and(|p| p.id == id) {
            *slot = None;
        }
        let other = room.peer(seat.other()).cloned();

        if seat == Seat::Host || room.player_count() == 0 {
            rooms.remove(code);
            info!(code, rooms = rooms.len(), "Room removed");
        }
        other
    }

    /// Drops rooms idle for longer than `max_idle`. Returns how many.
    #[instrument(skip(self))]
    pub fn prune_idle(&self, max_idle: Duration) -> usize {
        let now = Instant::now();
        let mut rooms = self.lock();
        let before = rooms.len();
        rooms.retain(|_, room| now.duration_since(room.last_activity) <= max_idle);
        let pruned = before - rooms.len();
        if pruned > 0 {
            info!(pruned, remaining = rooms.len(), "Pruned idle rooms");
        }
        pruned
    }

    /// Latest stored state of a room.
    pub fn state(&self, code: &str) -> Option<GameSession> {
        self.lock().get(code).map(|room| room.state.clone())
    }

    /// Listing of every room, sorted by code.
    pub fn summaries(&self) -> Vec<RoomSummary> {
        let now = Instant::now();
        let mut list: Vec<RoomSummary> = self
            .lock()
            .values()
            .map(|room| RoomSummary {
                code: room.code.clone(),
                players: room.player_count(),
                idle_secs: now.duration_since(room.last_activity).as_secs(),
            })
            .collect();
        list.sort_by(|a, b| a.code.cmp(&b.code));
        list
    }

    /// Number of live rooms.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no room is open.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
