//! Hand-level play, match setup and normalization of relayed state.

use rand::SeedableRng;
use rand::rngs::StdRng;
use sequence_core::{
    Card, Coord, DECK_SIZE, GameSession, GameStatus, IllegalMove, MatchOptions, Seat, TokenColor,
    advance_turn, apply_move, legal_targets,
};

fn started(seed: u64) -> GameSession {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut session = GameSession::start("GAME01", "host", MatchOptions::default(), &mut rng);
    session.seat_guest("guest", 7);
    session
}

/// Plays the first card in the current hand that has a legal target.
fn play_any(session: &mut GameSession) -> Option<Coord> {
    let seat = session.current_player();
    let hand = session.player(seat).hand().clone();
    for (index, card) in hand.iter().enumerate() {
        if let Some(&target) = legal_targets(session, seat, *card).first() {
            session.play(seat, index, target).unwrap();
            return Some(target);
        }
    }
    None
}

#[test]
fn test_play_refills_hand_and_passes_turn() {
    let mut session = started(11);
    let deck_before = session.deck().len();
    assert_eq!(deck_before, DECK_SIZE - 14);

    assert!(play_any(&mut session).is_some());

    assert_eq!(session.player(Seat::Host).hand().len(), 7);
    assert_eq!(session.deck().len(), deck_before - 1);
    assert_eq!(session.status(), GameStatus::AwaitingMove(Seat::Guest));
}

#[test]
fn test_play_rejects_bad_hand_index() {
    let mut session = started(12);
    let before = session.clone();
    assert_eq!(
        session.play(Seat::Host, 7, Coord::new(0, 0)),
        Err(IllegalMove::CardNotInHand)
    );
    assert_eq!(session, before);
}

#[test]
fn test_rejected_play_keeps_card_and_turn() {
    let mut session = started(13);
    let before = session.clone();
    let result = session.play(Seat::Guest, 0, Coord::new(0, 0));
    assert_eq!(result, Err(IllegalMove::NotYourTurn));
    assert_eq!(session, before);
}

#[test]
fn test_play_after_win_rejected() {
    let mut session: GameSession =
        serde_json::from_str(r#"{"winner":1,"players":[{"hand":["2♠"]},{}]}"#).unwrap();
    assert_eq!(session.status(), GameStatus::Finished(Seat::Guest));
    assert_eq!(
        session.play(Seat::Host, 0, Coord::new(0, 1)),
        Err(IllegalMove::GameOver)
    );
}

#[test]
fn test_many_turns_keep_card_conservation() {
    let mut session = started(14);
    for _ in 0..40 {
        if session.winner().is_some() || play_any(&mut session).is_none() {
            break;
        }
    }
    let on_board = session
        .board()
        .cells()
        .filter(|(_, c)| c.token.is_some() && !c.is_free_corner())
        .count();
    let in_hands: usize = session.players().iter().map(|p| p.hand().len()).sum();
    // Every card is in a hand, in the deck, or was played.
    assert!(on_board + in_hands + session.deck().len() <= DECK_SIZE);
    assert!(in_hands <= 14);
}

#[test]
fn test_reconcile_rederives_locks_and_counts() {
    let json = r#"{
        "players": [{"name": "h", "color": "blue", "sequences": 5}],
        "selectedCard": 3,
        "sequences": [
            {"player": 1, "direction": "horizontal", "positions": [
                {"row": 0, "col": 0}, {"row": 0, "col": 1}, {"row": 0, "col": 2},
                {"row": 0, "col": 3}, {"row": 0, "col": 4}]},
            {"player": 0, "direction": "vertical", "positions": [
                {"row": 0, "col": 9}, {"row": 1, "col": 9}, {"row": 2, "col": 9},
                {"row": 3, "col": 9}, {"row": 9, "col": 9}]}
        ]
    }"#;
    let mut session: GameSession = serde_json::from_str(json).unwrap();
    session.reconcile();

    assert_eq!(session.sequences().len(), 1);
    assert_eq!(*session.player(Seat::Host).sequences(), 0);
    assert_eq!(*session.player(Seat::Guest).sequences(), 1);
    assert_eq!(session.players().len(), 2);
    assert_eq!(session.selected_card(), None);

    for col in 0..5 {
        assert!(session.board().get(Coord::new(0, col)).unwrap().locked_in_sequence);
    }
    assert!(!session.board().get(Coord::new(0, 9)).unwrap().locked_in_sequence);
    let corner = session.board().get(Coord::new(0, 0)).unwrap();
    assert_eq!(corner.token, Some(sequence_core::TokenColor::Green));
}

#[test]
fn test_reconcile_keeps_valid_selection() {
    let mut session = started(15);
    assert!(session.select_card(Some(2)));
    session.reconcile();
    assert_eq!(session.selected_card(), Some(2));
}

#[test]
fn test_reconcile_restores_seat_colours() {
    let json = r#"{"players": [{"color": "blue"}, {"color": "blue"}]}"#;
    let mut session: GameSession = serde_json::from_str(json).unwrap();
    session.reconcile();
    assert_eq!(*session.player(Seat::Host).color(), TokenColor::Blue);
    assert_eq!(*session.player(Seat::Guest).color(), TokenColor::Green);

    let card = |code: &str| -> Card { code.parse().unwrap() };
    let host_run = [("7♠", 1), ("6♠", 2), ("5♠", 3), ("4♠", 4)];
    let guest_wild = [(2, 2), (2, 4), (4, 2), (4, 4)];
    for ((code, col), (row, wild_col)) in host_run.into_iter().zip(guest_wild) {
        apply_move(&mut session, Seat::Host, card(code), Coord::new(8, col)).unwrap();
        advance_turn(&mut session, card(code));
        if col < 4 {
            apply_move(&mut session, Seat::Guest, card("J♦"), Coord::new(row, wild_col)).unwrap();
            advance_turn(&mut session, card("J♦"));
        }
    }

    assert!(legal_targets(&session, Seat::Guest, card("J♥")).contains(&Coord::new(8, 1)));
    let report = apply_move(&mut session, Seat::Guest, card("3♠"), Coord::new(8, 5)).unwrap();
    assert!(report.new_sequences.is_empty());
    assert_eq!(session.sequence_count(Seat::Guest), 0);
}
