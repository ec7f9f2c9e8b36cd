//! Move validation and application.
//!
//! [`validate_move`] is pure and decides legality. [`apply_move`] runs it,
//! mutates exactly one cell, then hands off to sequence detection and the
//! win check. A rejected move never touches the session.

use crate::board::Coord;
use crate::card::{Card, JackKind};
use crate::sequence::{Sequence, detect_new_sequences};
use crate::session::{GameSession, Seat};
use crate::turn::check_win;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Why a move was rejected. The display text is shown to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Error)]
pub enum IllegalMove {
    /// The acting seat is not the current player.
    #[display("It's not your turn")]
    NotYourTurn,
    /// Target is locked into a sequence.
    #[display("Can't play on a space that's part of a sequence")]
    LockedInSequence,
    /// One-eyed jack aimed at a locked token.
    #[display("Can't remove a token that's part of a sequence")]
    RemoveLockedToken,
    /// One-eyed jack aimed at a free corner.
    #[display("Can't remove tokens from free corners")]
    RemoveFromCorner,
    /// One-eyed jack aimed at an empty cell.
    #[display("No token to remove here")]
    NoTokenToRemove,
    /// One-eyed jack aimed at the player's own token.
    #[display("Can't remove your own token")]
    RemoveOwnToken,
    /// Two-eyed jack aimed at a free corner.
    #[display("Free corners already count for all players")]
    WildOnCorner,
    /// Target already holds a token.
    #[display("Space already occupied")]
    Occupied,
    /// Regular card aimed at a slot bound to a different card.
    #[display("Card doesn't match this position")]
    CardMismatch,
    /// Target coordinate is outside the grid.
    #[display("Position is off the board")]
    OffBoard,
    /// Hand index does not point at a card.
    #[display("Card is not in your hand")]
    CardNotInHand,
    /// The match already has a winner.
    #[display("Game is already over")]
    GameOver,
}

/// What an accepted move did to its target cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveAction {
    /// A token was placed.
    Placed,
    /// An opponent token was removed.
    Removed,
}

/// Result of an accepted move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveReport {
    /// Acting seat.
    pub seat: Seat,
    /// Card played.
    pub card: Card,
    /// Target cell.
    pub at: Coord,
    /// Placement or removal.
    pub action: MoveAction,
    /// Sequences completed by this move.
    pub new_sequences: Vec<Sequence>,
    /// Winner after this move, if any.
    pub winner: Option<Seat>,
}

/// Accepted flag plus rejection reason, as reported to a peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveOutcome {
    /// Whether the move went through.
    pub accepted: bool,
    /// Rejection reason when not accepted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<&Result<MoveReport, IllegalMove>> for MoveOutcome {
    fn from(result: &Result<MoveReport, IllegalMove>) -> Self {
        match result {
            Ok(_) => Self {
                accepted: true,
                reason: None,
            },
            Err(e) => Self {
                accepted: false,
                reason: Some(e.to_string()),
            },
        }
    }
}

/// Decides whether `seat` may play `card` on `at`, without mutating anything.
pub fn validate_move(
    session: &GameSession,
    seat: Seat,
    card: Card,
    at: Coord,
) -> Result<MoveAction, IllegalMove> {
    if seat != session.current_player {
        return Err(IllegalMove::NotYourTurn);
    }
    let cell = session.board.get(at).ok_or(IllegalMove::OffBoard)?;
    let jack = card.jack_kind();

    // The flag and the recorded sequences can disagree in relayed state.
    let locked = cell.locked_in_sequence || session.sequences.iter().any(|s| s.contains(at));
    if locked {
        return Err(match jack {
            Some(JackKind::OneEyed) => IllegalMove::RemoveLockedToken,
            _ => IllegalMove::LockedInSequence,
        });
    }

    match jack {
        Some(JackKind::OneEyed) => {
            if cell.is_free_corner() {
                return Err(IllegalMove::RemoveFromCorner);
            }
            match cell.token {
                None => Err(IllegalMove::NoTokenToRemove),
                Some(color) if color == session.players[seat.index()].color => {
                    Err(IllegalMove::RemoveOwnToken)
                }
                Some(_) => Ok(MoveAction::Removed),
            }
        }
        Some(JackKind::TwoEyed) => {
            if cell.is_free_corner() {
                Err(IllegalMove::WildOnCorner)
            } else if cell.token.is_some() {
                Err(IllegalMove::Occupied)
            } else {
                Ok(MoveAction::Placed)
            }
        }
        None => {
            // Any card fits an unlocked free corner, replacing its token.
            if cell.is_free_corner() {
                Ok(MoveAction::Placed)
            } else if cell.card() != Some(card) {
                Err(IllegalMove::CardMismatch)
            } else if cell.token.is_some() {
                Err(IllegalMove::Occupied)
            } else {
                Ok(MoveAction::Placed)
            }
        }
    }
}

/// Validates and applies one move.
///
/// Placement runs sequence detection at the target and then the win check.
/// Removal only clears the token; existing sequences are never revoked.
/// The card is not taken from the hand here; see [`GameSession::play`].
#[instrument(skip(session), fields(game_id = ?session.game_id, card = %card, row = at.row(), col = at.col()))]
pub fn apply_move(
    session: &mut GameSession,
    seat: Seat,
    card: Card,
    at: Coord,
) -> Result<MoveReport, IllegalMove> {
    let action = validate_move(session, seat, card, at)
        .inspect_err(|reason| debug!(%seat, %reason, "Move rejected"))?;

    let color = session.players[seat.index()].color;
    let cell = session.board.get_mut(at).ok_or(IllegalMove::OffBoard)?;
    cell.token = match action {
        MoveAction::Placed => Some(color),
        MoveAction::Removed => None,
    };

    let new_sequences = match action {
        MoveAction::Placed => {
            let found = detect_new_sequences(session, at, seat);
            check_win(session, seat);
            found
        }
        MoveAction::Removed => Vec::new(),
    };

    info!(
        %seat,
        ?action,
        new_sequences = new_sequences.len(),
        winner = ?session.winner,
        "Move accepted"
    );
    Ok(MoveReport {
        seat,
        card,
        at,
        action,
        new_sequences,
        winner: session.winner,
    })
}

/// Every cell where `seat` could play `card` right now.
///
/// Empty when it is not `seat`'s turn.
#[instrument(skip(session), fields(card = %card))]
pub fn legal_targets(session: &GameSession, seat: Seat, card: Card) -> Vec<Coord> {
    Coord::all()
        .filter(|at| validate_move(session, seat, card, *at).is_ok())
        .collect()
}
