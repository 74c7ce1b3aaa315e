//! Integration tests for the move ledger: turn alternation, player undo,
//! termination precedence and bookmark round-trips.

use sparring_ledger::{Color, GameOverStatus, LedgerError, MoveLedger, STARTING_FEN};

const RUY_LOPEZ_PGN: &str = "1. e4 e5 2. Nf3 Nc6 3. Bb5 a6 4. Ba4 Nf6 5. O-O";

#[test]
fn three_plies_leave_black_to_move() {
    let mut ledger = MoveLedger::new();
    ledger.apply("e4").unwrap();
    ledger.apply("e5").unwrap();
    ledger.apply("Nf3").unwrap();
    assert_eq!(ledger.len(), 3);
    assert_eq!(ledger.turn(), Color::Black);
}

#[test]
fn undo_to_player_returns_control_to_white() {
    let mut ledger = MoveLedger::new();
    for m in ["e4", "e5", "Nf3"] {
        ledger.apply(m).unwrap();
    }
    ledger.undo_to_player(Color::White);
    assert_eq!(ledger.turn(), Color::White);
    assert_eq!(ledger.lan_history(), ["e2e4", "e7e5"]);
}

#[test]
fn turn_alternates_and_matches_replay() {
    let ledger = MoveLedger::from_pgn(RUY_LOPEZ_PGN).unwrap();
    assert_eq!(ledger.len(), 9);
    assert_eq!(ledger.turn(), Color::Black);

    let mut replay = MoveLedger::new();
    for record in ledger.history() {
        assert_eq!(replay.fen(), record.fen_before);
        replay.apply(&record.lan).unwrap();
        assert_eq!(replay.fen(), record.fen_after);
    }
    assert_eq!(replay.fen(), ledger.fen());
}

#[test]
fn rejected_move_is_an_ordinary_outcome() {
    let mut ledger = MoveLedger::from_pgn(RUY_LOPEZ_PGN).unwrap();
    let before = ledger.serialize();
    let err = ledger.apply("O-O").unwrap_err();
    assert_eq!(
        err,
        LedgerError::IllegalMove {
            notation: "O-O".to_string()
        }
    );
    assert_eq!(ledger.serialize(), before);
}

#[test]
fn insufficient_material_outranks_fifty_move_rule() {
    let ledger = MoveLedger::from_fen("8/8/8/4k3/8/8/8/4K3 w - - 100 80").unwrap();
    assert_eq!(ledger.status(), GameOverStatus::InsufficientMaterial);
}

#[test]
fn fifty_move_rule_reached_by_a_quiet_move() {
    let mut ledger = MoveLedger::from_fen("8/8/8/4k3/8/8/8/R3K3 w - - 99 80").unwrap();
    assert_eq!(ledger.status(), GameOverStatus::None);
    ledger.apply("Ra2").unwrap();
    assert_eq!(ledger.status(), GameOverStatus::FiftyMoveDraw);
    ledger.undo();
    assert_eq!(ledger.status(), GameOverStatus::None);
}

#[test]
fn compact_bookmark_reloads() {
    let ledger = MoveLedger::from_pgn(RUY_LOPEZ_PGN).unwrap();
    let bookmark = ledger.serialize().compact_pgn();
    assert!(bookmark.starts_with("1.e4 e5 2.Nf3"));
    let reloaded = MoveLedger::from_pgn(&bookmark).unwrap();
    assert_eq!(reloaded.fen(), ledger.fen());
}

#[test]
fn reset_after_game_over() {
    let mut ledger = MoveLedger::from_pgn("1. f3 e5 2. g4 Qh4#").unwrap();
    assert!(ledger.status().is_over());
    ledger.reset();
    assert!(!ledger.status().is_over());
    assert_eq!(ledger.serialize().fen, STARTING_FEN);
    assert_eq!(ledger.serialize().pgn, "");
}
