//! Sequence detection.
//!
//! A sequence is five consecutive cells in a straight line, each either a
//! free corner or holding the owner's token. Detection runs after every
//! placement, scanning only the lines through the placed cell.

use crate::board::{Board, Coord, TokenColor};
use crate::session::{GameSession, Seat};
use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator};
use tracing::{debug, info, instrument};

/// Cells in one sequence.
pub const SEQUENCE_LENGTH: usize = 5;

/// How far detection walks from the placed cell in each direction.
const REACH: usize = SEQUENCE_LENGTH - 1;

/// Line orientation. Declaration order is the scan order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    /// Along a row.
    Horizontal,
    /// Along a column.
    Vertical,
    /// Down and to the right.
    #[serde(rename = "diagonal-right")]
    DiagonalDownRight,
    /// Down and to the left.
    #[serde(rename = "diagonal-left")]
    DiagonalDownLeft,
}

impl Direction {
    /// Step `(d_row, d_col)` for one cell forward.
    pub fn delta(self) -> (isize, isize) {
        match self {
            Direction::Horizontal => (0, 1),
            Direction::Vertical => (1, 0),
            Direction::DiagonalDownRight => (1, 1),
            Direction::DiagonalDownLeft => (1, -1),
        }
    }
}

/// A recorded five-in-a-row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
    player: Seat,
    positions: [Coord; SEQUENCE_LENGTH],
    direction: Direction,
}

impl Sequence {
    /// Creates a sequence if the positions step consistently along `direction`.
    pub fn new(
        player: Seat,
        positions: [Coord; SEQUENCE_LENGTH],
        direction: Direction,
    ) -> Option<Self> {
        let sequence = Self {
            player,
            positions,
            direction,
        };
        sequence.is_consecutive().then_some(sequence)
    }

    /// Owner of the sequence.
    pub fn player(&self) -> Seat {
        self.player
    }

    /// The five cells, in scan order.
    pub fn positions(&self) -> &[Coord; SEQUENCE_LENGTH] {
        &self.positions
    }

    /// Line orientation.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Whether the sequence covers `at`.
    pub fn contains(&self, at: Coord) -> bool {
        self.positions.contains(&at)
    }

    /// Whether the positions are five consecutive cells along the direction.
    pub fn is_consecutive(&self) -> bool {
        let (d_row, d_col) = self.direction.delta();
        self.positions
            .windows(2)
            .all(|pair| pair[0].offset(d_row, d_col) == Some(pair[1]))
    }

    /// Whether this sequence covers exactly the given cells, in any order.
    pub fn same_cells(&self, cells: &[Coord]) -> bool {
        let mut mine = self.positions.to_vec();
        let mut theirs = cells.to_vec();
        mine.sort();
        theirs.sort();
        mine == theirs
    }
}

/// Whether a cell counts toward `color`'s line.
fn qualifies(board: &Board, at: Coord, color: TokenColor) -> bool {
    board
        .get(at)
        .is_some_and(|cell| cell.is_free_corner() || cell.token == Some(color))
}

/// Contiguous qualifying cells through `at`, ordered along the direction.
fn qualifying_run(board: &Board, at: Coord, direction: Direction, color: TokenColor) -> Vec<Coord> {
    let (d_row, d_col) = direction.delta();

    let mut backward = Vec::with_capacity(REACH);
    let mut cursor = at;
    for _ in 0..REACH {
        match cursor.offset(-d_row, -d_col) {
            Some(next) if qualifies(board, next, color) => {
                backward.push(next);
                cursor = next;
            }
            _ => break,
        }
    }

    let mut run: Vec<Coord> = backward.into_iter().rev().collect();
    run.push(at);

    let mut cursor = at;
    for _ in 0..REACH {
        match cursor.offset(d_row, d_col) {
            Some(next) if qualifies(board, next, color) => {
                run.push(next);
                cursor = next;
            }
            _ => break,
        }
    }
    run
}

/// A window can become a sequence unless it duplicates a recorded one or
/// borrows a free corner already claimed by the opponent.
fn is_new_candidate(session: &GameSession, seat: Seat, window: &[Coord]) -> bool {
    if session.sequences.iter().any(|s| s.same_cells(window)) {
        return false;
    }
    !window.iter().any(|at| {
        session.board.get(*at).is_some_and(|c| c.is_free_corner())
            && session
                .sequences
                .iter()
                .any(|s| s.player != seat && s.contains(*at))
    })
}

/// Records a sequence: lock its cells, claim corners, bump the owner's count.
fn record(session: &mut GameSession, sequence: Sequence, color: TokenColor) {
    for at in sequence.positions {
        if let Some(cell) = session.board.get_mut(at) {
            cell.locked_in_sequence = true;
            if cell.is_free_corner() {
                cell.token = Some(color);
            }
        }
    }
    session.players[sequence.player.index()].sequences += 1;
    session.sequences.push(sequence);
}

/// Finds and records every new sequence through `at` for `seat`.
///
/// Windows are accepted one at a time in scan order (directions in
/// declaration order, then by start offset), so a later window sees the
/// corner claims of an earlier one. Overlapping windows of a longer run
/// each count. Returns the sequences recorded by this call.
#[instrument(skip(session), fields(game_id = ?session.game_id))]
pub fn detect_new_sequences(session: &mut GameSession, at: Coord, seat: Seat) -> Vec<Sequence> {
    let color = session.players[seat.index()].color;
    if !qualifies(&session.board, at, color) {
        return Vec::new();
    }

    let mut found = Vec::new();
    for direction in Direction::iter() {
        let run = qualifying_run(&session.board, at, direction, color);
        if run.len() < SEQUENCE_LENGTH {
            continue;
        }
        debug!(?direction, run = run.len(), "Qualifying run");

        for window in run.windows(SEQUENCE_LENGTH) {
            if !is_new_candidate(session, seat, window) {
                continue;
            }
            let Ok(positions) = <[Coord; SEQUENCE_LENGTH]>::try_from(window) else {
                continue;
            };
            let sequence = Sequence {
                player: seat,
                positions,
                direction,
            };
            info!(%seat, ?direction, start = %positions[0], "Sequence formed");
            record(session, sequence.clone(), color);
            found.push(sequence);
        }
    }
    found
}
