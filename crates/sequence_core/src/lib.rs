//! Sequence game engine
//!
//! Rules and state for the two-player board game Sequence: a fixed 10x10
//! card layout, token placement with regular cards and Jacks, detection of
//! five-in-a-row sequences, and win tracking.
//!
//! # Architecture
//!
//! - **Layout / Board**: printed card positions and the per-game occupancy grid
//! - **Deck**: two shuffled 52-card decks and dealing
//! - **Moves**: legality rules and move application
//! - **Sequence**: detection of new five-in-a-row runs around a placed token
//! - **Turn**: hand refill, turn passing and win declaration
//! - **Session**: the match value exchanged between peers
//!
//! Nothing here does I/O. A `GameSession` is plain data that serializes to
//! the JSON exchanged between clients.
//!
//! # Example
//!
//! ```
//! use rand::SeedableRng;
//! use sequence_core::{GameSession, MatchOptions, Seat, legal_targets};
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(7);
//! let mut session = GameSession::start("ABC123", "alice", MatchOptions::default(), &mut rng);
//! session.seat_guest("bob", 7);
//!
//! let card = session.player(Seat::Host).hand()[0];
//! if let Some(&target) = legal_targets(&session, Seat::Host, card).first() {
//!     let report = session.play(Seat::Host, 0, target).unwrap();
//!     assert_eq!(report.seat, Seat::Host);
//!     assert_eq!(session.current_player(), Seat::Guest);
//! }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod board;
mod card;
mod deck;
mod layout;
mod moves;
mod sequence;
mod session;
mod turn;

// Crate-level exports - Cards
pub use card::{Card, CardParseError, JackKind, Rank, Suit};

// Crate-level exports - Board model
pub use board::{BOARD_SIZE, Board, BoardCell, CellKind, Coord, TokenColor, initialize_board};
pub use layout::{BoardLayout, FREE_CORNER_CODE, LayoutCell, LayoutError};

// Crate-level exports - Deck model
pub use deck::{DECK_SIZE, DECKS, Deck, build_shuffled_deck, deal};

// Crate-level exports - Move validation
pub use moves::{
    IllegalMove, MoveAction, MoveOutcome, MoveReport, apply_move, legal_targets, validate_move,
};

// Crate-level exports - Sequence detection
pub use sequence::{Direction, SEQUENCE_LENGTH, Sequence, detect_new_sequences};

// Crate-level exports - Turn and win control
pub use turn::{advance_turn, check_win};

// Crate-level exports - Session
pub use session::{
    DEFAULT_HAND_SIZE, DEFAULT_SEQUENCES_TO_WIN, GameSession, GameStatus, MatchOptions, Player,
    Seat,
};
