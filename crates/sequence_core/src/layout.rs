//! The printed 10×10 board: which card sits where.
//!
//! A layout is immutable and validated on construction. Every non-Jack
//! card appears in exactly two cells and the four grid corners are free.

use crate::board::{BOARD_SIZE, Coord};
use crate::card::{Card, CardParseError};
use derive_more::{Display, Error};
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Code used for a free corner in textual layouts.
pub const FREE_CORNER_CODE: &str = "F";

/// The official Sequence board, row by row.
const CANONICAL_CODES: [[&str; BOARD_SIZE]; BOARD_SIZE] = [
    ["F", "2♠", "3♠", "4♠", "5♠", "6♠", "7♠", "8♠", "9♠", "F"],
    ["6♣", "5♣", "4♣", "3♣", "2♣", "A♥", "K♥", "Q♥", "10♥", "10♠"],
    ["7♣", "A♠", "2♦", "3♦", "4♦", "5♦", "6♦", "7♦", "9♥", "Q♠"],
    ["8♣", "K♠", "6♣", "5♣", "4♣", "3♣", "2♣", "8♦", "8♥", "K♠"],
    ["9♣", "Q♠", "7♣", "6♥", "5♥", "4♥", "A♥", "9♦", "7♥", "A♠"],
    ["10♣", "10♠", "8♣", "7♥", "2♥", "3♥", "K♥", "10♦", "6♥", "2♦"],
    ["Q♣", "9♠", "9♣", "8♥", "9♥", "10♥", "Q♥", "Q♦", "5♥", "3♦"],
    ["K♣", "8♠", "10♣", "Q♣", "K♣", "A♣", "A♦", "K♦", "4♥", "4♦"],
    ["A♣", "7♠", "6♠", "5♠", "4♠", "3♠", "2♠", "2♥", "3♥", "5♦"],
    ["F", "A♦", "K♦", "Q♦", "10♦", "9♦", "8♦", "7♦", "6♦", "F"],
];

/// One printed cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutCell {
    /// A free corner, usable by every player.
    FreeCorner,
    /// A cell bound to a card.
    Card(Card),
}

/// A layout that breaks the board invariants.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum LayoutError {
    /// The grid is not 10×10.
    #[display("Layout must be {}x{}, found a row of {} cells", BOARD_SIZE, BOARD_SIZE, _0)]
    WrongDimensions(#[error(not(source))] usize),

    /// A cell code is neither `F` nor a valid card.
    #[display("{}", _0)]
    BadCode(CardParseError),

    /// Free corners are not exactly the four grid corners.
    #[display("Free corners must be exactly the 4 grid corners, found {} free cells", _0)]
    WrongCorners(#[error(not(source))] usize),

    /// A Jack is printed on the board.
    #[display("Jacks never appear on the board, found {} at {}", card, at)]
    JackOnBoard {
        /// The Jack.
        card: Card,
        /// Where it was printed.
        at: Coord,
    },

    /// A card does not appear exactly twice.
    #[display("{} appears {} times (expected 2)", card, count)]
    WrongCount {
        /// The card.
        card: Card,
        /// How many cells carry it.
        count: usize,
    },
}

/// The immutable card-position grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardLayout {
    cells: [[LayoutCell; BOARD_SIZE]; BOARD_SIZE],
}

impl BoardLayout {
    /// Returns the official layout.
    ///
    /// The table is fixed data and is covered by a validation test, so the
    /// fallible path is never taken at runtime.
    #[instrument]
    pub fn canonical() -> Self {
        let mut cells = [[LayoutCell::FreeCorner; BOARD_SIZE]; BOARD_SIZE];
        for (row, codes) in CANONICAL_CODES.iter().enumerate() {
            for (col, code) in codes.iter().enumerate() {
                cells[row][col] = code
                    .parse::<Card>()
                    .map(LayoutCell::Card)
                    .unwrap_or(LayoutCell::FreeCorner);
            }
        }
        Self { cells }
    }

    /// Builds and validates a layout from rows of codes (`"F"` for a corner).
    #[instrument(skip(rows))]
    pub fn from_codes<R, S>(rows: &[R]) -> Result<Self, LayoutError>
    where
        R: AsRef<[S]>,
        S: AsRef<str>,
    {
        if rows.len() != BOARD_SIZE {
            return Err(LayoutError::WrongDimensions(rows.len()));
        }
        let mut cells = [[LayoutCell::FreeCorner; BOARD_SIZE]; BOARD_SIZE];
        for (row, codes) in rows.iter().enumerate() {
            let codes = codes.as_ref();
            if codes.len() != BOARD_SIZE {
                return Err(LayoutError::WrongDimensions(codes.len()));
            }
            for (col, code) in codes.iter().enumerate() {
                let code = code.as_ref().trim();
                cells[row][col] = if code == FREE_CORNER_CODE {
                    LayoutCell::FreeCorner
                } else {
                    LayoutCell::Card(code.parse().map_err(LayoutError::BadCode)?)
                };
            }
        }
        let layout = Self { cells };
        layout.validate()?;
        Ok(layout)
    }

    /// Checks the corner and double-occurrence invariants.
    #[instrument(skip(self))]
    pub fn validate(&self) -> Result<(), LayoutError> {
        let free = Coord::all()
            .filter(|c| self.get(*c) == LayoutCell::FreeCorner)
            .count();
        let corners_free = Coord::corners()
            .iter()
            .all(|c| self.get(*c) == LayoutCell::FreeCorner);
        if free != 4 || !corners_free {
            return Err(LayoutError::WrongCorners(free));
        }

        let mut counts: HashMap<Card, usize> = HashMap::new();
        for at in Coord::all() {
            if let LayoutCell::Card(card) = self.get(at) {
                if card.is_jack() {
                    return Err(LayoutError::JackOnBoard { card, at });
                }
                *counts.entry(card).or_default() += 1;
            }
        }
        for card in Card::standard_deck().filter(|c| !c.is_jack()) {
            let count = counts.get(&card).copied().unwrap_or(0);
            if count != 2 {
                return Err(LayoutError::WrongCount { card, count });
            }
        }

        debug!("Layout satisfies corner and double-occurrence invariants");
        Ok(())
    }

    /// Returns the printed cell at a coordinate.
    pub fn get(&self, at: Coord) -> LayoutCell {
        self.cells[at.row()][at.col()]
    }

    /// Returns every coordinate bound to the given card.
    pub fn positions_of(&self, card: Card) -> Vec<Coord> {
        Coord::all()
            .filter(|c| self.get(*c) == LayoutCell::Card(card))
            .collect()
    }

    /// Returns the layout as rows of codes.
    pub fn to_codes(&self) -> Vec<Vec<String>> {
        self.cells
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| match cell {
                        LayoutCell::FreeCorner => FREE_CORNER_CODE.to_string(),
                        LayoutCell::Card(card) => card.to_string(),
                    })
                    .collect()
            })
            .collect()
    }
}

impl Default for BoardLayout {
    fn default() -> Self {
        Self::canonical()
    }
}
