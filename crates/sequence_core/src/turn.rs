//! Turn order and win tracking.

use crate::card::Card;
use crate::deck::deal;
use crate::session::{GameSession, Seat};
use tracing::{debug, info, instrument, warn};

/// Recomputes `seat`'s sequence count from the recorded sequences and
/// declares them the winner once the threshold is reached.
///
/// The first winner sticks: later calls never replace it.
#[instrument(skip(session), fields(game_id = ?session.game_id))]
pub fn check_win(session: &mut GameSession, seat: Seat) -> Option<Seat> {
    let count = session.sequence_count(seat);
    session.players[seat.index()].sequences = count;

    if session.winner.is_none() && count >= session.sequences_to_win {
        session.winner = Some(seat);
        info!(%seat, sequences = count, "Winner declared");
    }
    session.winner
}

/// Finishes the current player's turn after an accepted move.
///
/// Discards the first copy of `played` from their hand, draws one
/// replacement if the deck has any left, passes the turn and clears the
/// selection.
#[instrument(skip(session), fields(game_id = ?session.game_id, played = %played))]
pub fn advance_turn(session: &mut GameSession, played: Card) {
    let seat = session.current_player;
    let player = &mut session.players[seat.index()];

    match player.hand.iter().position(|c| *c == played) {
        Some(index) => {
            player.hand.remove(index);
        }
        None => warn!(%seat, "Played card missing from hand"),
    }
    let drawn = deal(&mut session.deck, &mut player.hand, 1);

    session.current_player = seat.other();
    session.selected_card = None;
    debug!(%seat, drawn, next = %session.current_player, "Turn passed");
}
