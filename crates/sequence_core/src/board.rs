//! Mutable per-game occupancy grid.

use crate::card::Card;
use crate::layout::{BoardLayout, LayoutCell};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Width and height of the board.
pub const BOARD_SIZE: usize = 10;

/// A 0-indexed board coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    row: usize,
    col: usize,
}

impl Coord {
    /// Creates a coordinate. Bounds are checked by the board on access.
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Returns the row.
    pub fn row(&self) -> usize {
        self.row
    }

    /// Returns the column.
    pub fn col(&self) -> usize {
        self.col
    }

    /// Whether the coordinate lies on the board.
    pub fn in_bounds(&self) -> bool {
        self.row < BOARD_SIZE && self.col < BOARD_SIZE
    }

    /// Moves by a signed delta, or `None` if the result leaves the board.
    pub fn offset(&self, d_row: isize, d_col: isize) -> Option<Coord> {
        let row = self.row.checked_add_signed(d_row)?;
        let col = self.col.checked_add_signed(d_col)?;
        let next = Coord::new(row, col);
        next.in_bounds().then_some(next)
    }

    /// Every coordinate in row-major order.
    pub fn all() -> impl Iterator<Item = Coord> {
        (0..BOARD_SIZE).flat_map(|row| (0..BOARD_SIZE).map(move |col| Coord::new(row, col)))
    }

    /// The four grid corners.
    pub fn corners() -> [Coord; 4] {
        let last = BOARD_SIZE - 1;
        [
            Coord::new(0, 0),
            Coord::new(0, last),
            Coord::new(last, 0),
            Coord::new(last, last),
        ]
    }
}

impl std::fmt::Display for Coord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{},{}]", self.row, self.col)
    }
}

/// Colour of a player's tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenColor {
    /// Host tokens.
    Blue,
    /// Guest tokens.
    Green,
}

/// What a cell is, independent of who occupies it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CellKind {
    /// Free corner: counts for every player.
    Free,
    /// Slot bound to a printed card.
    Card {
        /// The bound card.
        code: Card,
    },
}

/// Per-game state of one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardCell {
    /// Corner or card slot.
    pub kind: CellKind,
    /// Occupying token, if any.
    #[serde(default)]
    pub token: Option<TokenColor>,
    /// Set once the cell belongs to a recorded sequence.
    #[serde(default)]
    pub locked_in_sequence: bool,
}

impl BoardCell {
    /// An empty, unlocked cell.
    pub fn new(kind: CellKind) -> Self {
        Self {
            kind,
            token: None,
            locked_in_sequence: false,
        }
    }

    /// Whether this is a free corner.
    pub fn is_free_corner(&self) -> bool {
        self.kind == CellKind::Free
    }

    /// The bound card of a card slot.
    pub fn card(&self) -> Option<Card> {
        match self.kind {
            CellKind::Free => None,
            CellKind::Card { code } => Some(code),
        }
    }
}

/// The occupancy grid of one game.
///
/// Rows are stored as nested vectors so a state received from a peer can be
/// held even if it is malformed; every access is bounds-checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    rows: Vec<Vec<BoardCell>>,
}

impl Board {
    /// Creates a fresh grid from a layout: no tokens, nothing locked.
    #[instrument(skip(layout))]
    pub fn from_layout(layout: &BoardLayout) -> Self {
        let rows = (0..BOARD_SIZE)
            .map(|row| {
                (0..BOARD_SIZE)
                    .map(|col| {
                        let kind = match layout.get(Coord::new(row, col)) {
                            LayoutCell::FreeCorner => CellKind::Free,
                            LayoutCell::Card(code) => CellKind::Card { code },
                        };
                        BoardCell::new(kind)
                    })
                    .collect()
            })
            .collect();
        Self { rows }
    }

    /// Returns the cell at a coordinate.
    pub fn get(&self, at: Coord) -> Option<&BoardCell> {
        self.rows.get(at.row())?.get(at.col())
    }

    /// Returns the cell at a coordinate mutably.
    pub fn get_mut(&mut self, at: Coord) -> Option<&mut BoardCell> {
        self.rows.get_mut(at.row())?.get_mut(at.col())
    }

    /// Iterates over every present cell with its coordinate.
    pub fn cells(&self) -> impl Iterator<Item = (Coord, &BoardCell)> {
        self.rows.iter().enumerate().flat_map(|(row, cells)| {
            cells
                .iter()
                .enumerate()
                .map(move |(col, cell)| (Coord::new(row, col), cell))
        })
    }

    /// Iterates over every present cell mutably.
    pub fn cells_mut(&mut self) -> impl Iterator<Item = &mut BoardCell> {
        self.rows.iter_mut().flatten()
    }

    /// Formats the board as an aligned text grid.
    ///
    /// Corners print as `F`, tokens as `B`/`G` after the card code, and
    /// locked cells with a trailing `*`.
    pub fn display(&self) -> String {
        let mut result = String::new();
        for (row, cells) in self.rows.iter().enumerate() {
            let line: Vec<String> = cells
                .iter()
                .map(|cell| {
                    let mut text = match cell.kind {
                        CellKind::Free => "F".to_string(),
                        CellKind::Card { code } => code.to_string(),
                    };
                    match cell.token {
                        Some(TokenColor::Blue) => text.push('B'),
                        Some(TokenColor::Green) => text.push('G'),
                        None => {}
                    }
                    if cell.locked_in_sequence {
                        text.push('*');
                    }
                    format!("{:<6}", text)
                })
                .collect();
            result.push_str(line.join("").trim_end());
            if row + 1 < self.rows.len() {
                result.push('\n');
            }
        }
        result
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::from_layout(&BoardLayout::canonical())
    }
}

/// Produces a fresh mutable grid from a layout.
#[instrument(skip(layout))]
pub fn initialize_board(layout: &BoardLayout) -> Board {
    Board::from_layout(layout)
}
