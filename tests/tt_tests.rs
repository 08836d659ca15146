use sentinel::moves::types::Move;
use sentinel::search::tt::{Bound, TranspositionTable};
use sentinel::square::Square;
use std::str::FromStr;

fn dummy_move(from: &str, to: &str) -> Move {
    use sentinel::board::{Color, Piece, PieceKind};
    Move {
        from: Square::from_str(from).unwrap(),
        to: Square::from_str(to).unwrap(),
        piece: Piece::new(Color::White, PieceKind::Pawn),
        promotion: None,
        flags: sentinel::moves::types::QUIET_MOVE,
    }
}

#[test]
fn save_then_probe_round_trips_exact_entries() {
    let mut tt = TranspositionTable::new(1);
    let mv = dummy_move("e2", "e4");
    tt.save(0xDEAD_BEEF, 0x1234, Some(mv), 57, 6, Bound::Exact, 0);

    let probe = tt.probe(0xDEAD_BEEF, 0x1234, 0).expect("entry must be present");
    assert_eq!(probe.score, 57);
    assert_eq!(probe.depth, 6);
    assert_eq!(probe.bound, Bound::Exact);
    assert_eq!(probe.best_move, Some(mv.to_tt_u16()));
}

#[test]
fn lock_mismatch_is_treated_as_a_miss() {
    let mut tt = TranspositionTable::new(1);
    let mv = dummy_move("e2", "e4");
    tt.save(0x1111_2222, 0xAAAA, Some(mv), 10, 3, Bound::Exact, 0);
    assert!(tt.probe(0x1111_2222, 0xBBBB, 0).is_none());
}

#[test]
fn clear_empties_all_slots() {
    let mut tt = TranspositionTable::new(1);
    let mv = dummy_move("e2", "e4");
    tt.save(0x42, 0x1, Some(mv), 10, 3, Bound::Exact, 0);
    tt.clear();
    assert!(tt.probe(0x42, 0x1, 0).is_none());
}

#[test]
fn mate_score_is_denormalized_relative_to_the_probing_ply() {
    let mut tt = TranspositionTable::new(1);
    let mate_in_three = sentinel::search::tt::MATE_SCORE - 3;
    // Stored at ply 0, so the stored (root-relative) distance is preserved.
    tt.save(0x99, 0x1, None, mate_in_three, 10, Bound::Exact, 0);
    let probe = tt.probe(0x99, 0x1, 0).unwrap();
    assert_eq!(probe.score, mate_in_three);
}
