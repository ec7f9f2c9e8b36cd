//! One match between a host and a guest.
//!
//! A `GameSession` is an exclusively owned value: whoever holds it (a client,
//! or the relay's room) mutates it one move at a time. It is also the whole
//! payload exchanged between peers, so deserialization is deliberately
//! forgiving about missing collections.

use crate::board::{Board, Coord, TokenColor};
use crate::card::Card;
use crate::deck::{Deck, deal};
use crate::moves::{IllegalMove, MoveReport, apply_move};
use crate::sequence::Sequence;
use crate::turn::advance_turn;
use derive_getters::Getters;
use derive_more::Display;
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info, instrument, warn};

/// Default number of cards in a hand.
pub const DEFAULT_HAND_SIZE: usize = 7;

/// Default number of sequences needed to win.
pub const DEFAULT_SEQUENCES_TO_WIN: u32 = 2;

/// A player's seat. Serialized as its index (0 or 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Seat {
    /// Index 0: created the game.
    #[display("host")]
    Host,
    /// Index 1: joined by room code.
    #[display("guest")]
    Guest,
}

impl Seat {
    /// Both seats in index order.
    pub const ALL: [Seat; 2] = [Seat::Host, Seat::Guest];

    /// Returns the seat index.
    pub fn index(self) -> usize {
        match self {
            Seat::Host => 0,
            Seat::Guest => 1,
        }
    }

    /// Returns the other seat.
    pub fn other(self) -> Self {
        match self {
            Seat::Host => Seat::Guest,
            Seat::Guest => Seat::Host,
        }
    }

    /// Token colour assigned to this seat.
    pub fn color(self) -> TokenColor {
        match self {
            Seat::Host => TokenColor::Blue,
            Seat::Guest => TokenColor::Green,
        }
    }
}

impl From<Seat> for u8 {
    fn from(seat: Seat) -> Self {
        seat.index() as u8
    }
}

impl TryFrom<u8> for Seat {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Seat::Host),
            1 => Ok(Seat::Guest),
            other => Err(format!("Invalid seat index {other}, expected 0 or 1")),
        }
    }
}

/// A participant in the match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    /// Display name.
    #[serde(default)]
    pub(crate) name: String,
    /// Token colour.
    pub(crate) color: TokenColor,
    /// Cards in hand, in deal order.
    #[serde(default)]
    pub(crate) hand: Vec<Card>,
    /// Completed sequences.
    #[serde(default)]
    pub(crate) sequences: u32,
}

impl Player {
    /// An unnamed player with an empty hand for the given seat.
    pub fn for_seat(seat: Seat) -> Self {
        Self {
            name: String::new(),
            color: seat.color(),
            hand: Vec::new(),
            sequences: 0,
        }
    }
}

/// Where the match stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    /// Waiting for this seat to move.
    AwaitingMove(Seat),
    /// Terminal: this seat reached the sequence threshold.
    Finished(Seat),
}

/// Knobs chosen by the host when creating a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MatchOptions {
    /// Cards dealt to each player.
    pub hand_size: usize,
    /// Sequences needed to win.
    pub sequences_to_win: u32,
    /// Who moves first.
    pub first_player: Seat,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            hand_size: DEFAULT_HAND_SIZE,
            sequences_to_win: DEFAULT_SEQUENCES_TO_WIN,
            first_player: Seat::Host,
        }
    }
}

/// Complete state of a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameSession {
    pub(crate) game_id: Option<String>,
    pub(crate) board: Board,
    pub(crate) deck: Deck,
    #[serde(deserialize_with = "deserialize_players")]
    pub(crate) players: [Player; 2],
    pub(crate) current_player: Seat,
    pub(crate) selected_card: Option<usize>,
    pub(crate) sequences: Vec<Sequence>,
    pub(crate) sequences_to_win: u32,
    pub(crate) winner: Option<Seat>,
}

impl GameSession {
    /// An empty session over a fresh canonical board.
    pub fn new() -> Self {
        Self {
            game_id: None,
            board: Board::default(),
            deck: Deck::default(),
            players: [Player::for_seat(Seat::Host), Player::for_seat(Seat::Guest)],
            current_player: Seat::Host,
            selected_card: None,
            sequences: Vec::new(),
            sequences_to_win: DEFAULT_SEQUENCES_TO_WIN,
            winner: None,
        }
    }

    /// Starts a match: fresh board, shuffled deck, host hand dealt.
    ///
    /// The guest seat stays empty until [`GameSession::seat_guest`].
    #[instrument(skip(game_id, rng), fields(host = %host_name))]
    pub fn start<R: Rng + ?Sized>(
        game_id: impl Into<String>,
        host_name: &str,
        options: MatchOptions,
        rng: &mut R,
    ) -> Self {
        let mut session = Self::new();
        session.game_id = Some(game_id.into());
        session.deck = Deck::shuffled(rng);
        session.current_player = options.first_player;
        session.sequences_to_win = options.sequences_to_win;

        let host = &mut session.players[Seat::Host.index()];
        host.name = host_name.to_string();
        deal(&mut session.deck, &mut host.hand, options.hand_size);

        info!(
            game_id = ?session.game_id,
            first = %options.first_player,
            sequences_to_win = options.sequences_to_win,
            "Started match"
        );
        session
    }

    /// Names the guest and deals their hand. Returns the number of cards dealt.
    #[instrument(skip(self), fields(game_id = ?self.game_id))]
    pub fn seat_guest(&mut self, name: &str, hand_size: usize) -> usize {
        let guest = &mut self.players[Seat::Guest.index()];
        guest.name = name.to_string();
        let dealt = deal(&mut self.deck, &mut guest.hand, hand_size);
        if dealt < hand_size {
            warn!(dealt, hand_size, "Deck ran short while dealing guest hand");
        }
        info!(guest = name, dealt, "Guest seated");
        dealt
    }

    /// Plays the card at `hand_index` from `seat`'s hand onto `at`.
    ///
    /// This is the full client action: validate and apply the move, then
    /// discard the card, draw a replacement and pass the turn.
    #[instrument(skip(self), fields(game_id = ?self.game_id))]
    pub fn play(
        &mut self,
        seat: Seat,
        hand_index: usize,
        at: Coord,
    ) -> Result<MoveReport, IllegalMove> {
        if self.winner.is_some() {
            debug!("Move after game end rejected");
            return Err(IllegalMove::GameOver);
        }
        let card = self
            .player(seat)
            .hand
            .get(hand_index)
            .copied()
            .ok_or(IllegalMove::CardNotInHand)?;

        let report = apply_move(self, seat, card, at)?;
        advance_turn(self, card);
        Ok(report)
    }

    /// Selects a card in the current player's hand, or clears the selection.
    #[instrument(skip(self))]
    pub fn select_card(&mut self, index: Option<usize>) -> bool {
        match index {
            Some(i) if i >= self.player(self.current_player).hand.len() => false,
            other => {
                self.selected_card = other;
                true
            }
        }
    }

    /// Normalizes a state received from a peer.
    ///
    /// Drops malformed sequences, restores each seat's colour, re-derives
    /// the locked flags and corner claims from the recorded sequences,
    /// recomputes per-player counts, and clears a selection that no longer
    /// points into the hand.
    #[instrument(skip(self), fields(game_id = ?self.game_id))]
    pub fn reconcile(&mut self) {
        let before = self.sequences.len();
        let board = &self.board;
        self.sequences.retain(|s| {
            s.is_consecutive() && s.positions().iter().all(|c| board.get(*c).is_some())
        });
        if self.sequences.len() != before {
            warn!(
                dropped = before - self.sequences.len(),
                "Discarded malformed sequences"
            );
        }

        for seat in Seat::ALL {
            self.players[seat.index()].color = seat.color();
        }
        for cell in self.board.cells_mut() {
            cell.locked_in_sequence = false;
        }
        for sequence in &self.sequences {
            let color = self.players[sequence.player().index()].color;
            for at in sequence.positions() {
                if let Some(cell) = self.board.get_mut(*at) {
                    cell.locked_in_sequence = true;
                    if cell.is_free_corner() {
                        cell.token = Some(color);
                    }
                }
            }
        }

        for seat in Seat::ALL {
            self.players[seat.index()].sequences = self.sequence_count(seat);
        }

        if let Some(index) = self.selected_card {
            if index >= self.player(self.current_player).hand.len() {
                self.selected_card = None;
            }
        }
        debug!(sequences = self.sequences.len(), "Reconciled session");
    }

    /// Number of recorded sequences owned by `seat`.
    pub fn sequence_count(&self, seat: Seat) -> u32 {
        self.sequences.iter().filter(|s| s.player() == seat).count() as u32
    }

    /// Returns the match status.
    pub fn status(&self) -> GameStatus {
        match self.winner {
            Some(seat) => GameStatus::Finished(seat),
            None => GameStatus::AwaitingMove(self.current_player),
        }
    }

    /// Room code, if the session belongs to one.
    pub fn game_id(&self) -> Option<&str> {
        self.game_id.as_deref()
    }

    /// Sets the room code.
    pub fn set_game_id(&mut self, game_id: impl Into<String>) {
        self.game_id = Some(game_id.into());
    }

    /// Returns the board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Returns the draw pile.
    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    /// Returns the player in a seat.
    pub fn player(&self, seat: Seat) -> &Player {
        &self.players[seat.index()]
    }

    /// Returns both players in seat order.
    pub fn players(&self) -> &[Player; 2] {
        &self.players
    }

    /// Seat whose turn it is.
    pub fn current_player(&self) -> Seat {
        self.current_player
    }

    /// Client-local selected hand index.
    pub fn selected_card(&self) -> Option<usize> {
        self.selected_card
    }

    /// Every sequence recorded so far, in formation order.
    pub fn sequences(&self) -> &[Sequence] {
        &self.sequences
    }

    /// Sequences needed to win.
    pub fn sequences_to_win(&self) -> u32 {
        self.sequences_to_win
    }

    /// The winner, once decided.
    pub fn winner(&self) -> Option<Seat> {
        self.winner
    }
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Player entry as it may arrive from a peer. The colour is fixed by seat.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IncomingPlayer {
    #[serde(default)]
    name: String,
    #[serde(default)]
    color: Option<TokenColor>,
    #[serde(default)]
    hand: Vec<Card>,
    #[serde(default)]
    sequences: u32,
}

/// Accepts zero, one or two (possibly null) player entries and pads the rest.
fn deserialize_players<'de, D>(deserializer: D) -> Result<[Player; 2], D::Error>
where
    D: Deserializer<'de>,
{
    let incoming: Vec<Option<IncomingPlayer>> = Vec::deserialize(deserializer)?;
    let mut entries = incoming.into_iter();
    let mut next = |seat: Seat| match entries.next().flatten() {
        Some(p) => Player {
            name: p.name,
            color: {
                if p.color.is_some_and(|c| c != seat.color()) {
                    warn!(seat = %seat, "Ignoring relayed player colour");
                }
                seat.color()
            },
            hand: p.hand,
            sequences: p.sequences,
        },
        None => Player::for_seat(seat),
    };
    let host = next(Seat::Host);
    let guest = next(Seat::Guest);
    Ok([host, guest])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::DECK_SIZE;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_start_deals_host_only() {
        let mut rng = StdRng::seed_from_u64(1);
        let session = GameSession::start("ABC123", "alice", MatchOptions::default(), &mut rng);
        assert_eq!(session.game_id(), Some("ABC123"));
        assert_eq!(session.player(Seat::Host).hand().len(), DEFAULT_HAND_SIZE);
        assert_eq!(session.player(Seat::Host).name(), "alice");
        assert!(session.player(Seat::Guest).hand().is_empty());
        assert_eq!(session.deck().len(), DECK_SIZE - DEFAULT_HAND_SIZE);
        assert_eq!(session.status(), GameStatus::AwaitingMove(Seat::Host));
    }

    #[test]
    fn test_first_player_option() {
        let options = MatchOptions {
            first_player: Seat::Guest,
            sequences_to_win: 1,
            ..MatchOptions::default()
        };
        let session = GameSession::start("X", "h", options, &mut StdRng::seed_from_u64(2));
        assert_eq!(session.current_player(), Seat::Guest);
        assert_eq!(session.sequences_to_win(), 1);
    }

    #[test]
    fn test_seat_guest_deals_from_remaining_deck() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut session = GameSession::start("X", "h", MatchOptions::default(), &mut rng);
        assert_eq!(session.seat_guest("bob", 7), 7);
        assert_eq!(session.player(Seat::Guest).hand().len(), 7);
        assert_eq!(session.deck().len(), DECK_SIZE - 14);
    }

    #[test]
    fn test_seat_serializes_as_index() {
        assert_eq!(serde_json::to_string(&Seat::Guest).unwrap(), "1");
        assert_eq!(serde_json::from_str::<Seat>("0").unwrap(), Seat::Host);
        assert!(serde_json::from_str::<Seat>("2").is_err());
    }

    #[test]
    fn test_missing_collections_default_empty() {
        let session: GameSession =
            serde_json::from_str(r#"{"players":[{"name":"a"}],"currentPlayer":1}"#).unwrap();
        assert_eq!(session.player(Seat::Host).name(), "a");
        assert_eq!(*session.player(Seat::Host).color(), TokenColor::Blue);
        assert_eq!(*session.player(Seat::Guest).color(), TokenColor::Green);
        assert!(session.deck().is_empty());
        assert!(session.sequences().is_empty());
        assert_eq!(session.current_player(), Seat::Guest);
        assert_eq!(session.board(), &Board::default());
    }

    #[test]
    fn test_null_player_entry_is_padded() {
        let session: GameSession =
            serde_json::from_str(r#"{"players":[null, {"hand":["A♠"]}]}"#).unwrap();
        assert_eq!(session.player(Seat::Host), &Player::for_seat(Seat::Host));
        assert_eq!(session.player(Seat::Guest).hand().len(), 1);
    }

    #[test]
    fn test_session_json_round_trip() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut session = GameSession::start("R", "h", MatchOptions::default(), &mut rng);
        session.seat_guest("g", 7);
        let json = serde_json::to_string(&session).unwrap();
        let back: GameSession = serde_json::from_str(&json).unwrap();
        assert_eq!(back, session);
    }

    #[test]
    fn test_select_card_bounds() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut session = GameSession::start("R", "h", MatchOptions::default(), &mut rng);
        assert!(session.select_card(Some(6)));
        assert_eq!(session.selected_card(), Some(6));
        assert!(!session.select_card(Some(7)));
        assert_eq!(session.selected_card(), Some(6));
        assert!(session.select_card(None));
        assert_eq!(session.selected_card(), None);
    }
}
