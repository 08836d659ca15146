use sentinel::board::Board;
use sentinel::hash::ZobristKeys;
use sentinel::moves::movegen::generate_legal;
use sentinel::search::context::SearchContext;
use sentinel::search::repetition::RepetitionStack;
use sentinel::search::search::{search_go, SearchLimits};
use sentinel::search::tt::TranspositionTable;
use std::str::FromStr;

fn seeded(fen: &str) -> (Board, ZobristKeys) {
    let mut board = Board::from_str(fen).unwrap();
    sentinel::search::eval::recompute_incremental(&mut board);
    let keys = ZobristKeys::new(0x5EED);
    let (hash, lock) = keys.compute_full(&board);
    board.hash = hash;
    board.lock = lock;
    (board, keys)
}

fn run(fen: &str, limits: SearchLimits) -> sentinel::search::search::SearchResult {
    let (mut board, keys) = seeded(fen);
    let mut ctx = SearchContext::new();
    let mut tt = TranspositionTable::new(1);
    let mut rep = RepetitionStack::new();
    rep.push(board.hash, board.lock);
    search_go(&mut board, &keys, &mut ctx, &mut tt, &mut rep, &limits, None)
}

#[test]
fn best_move_from_starting_position_is_always_legal() {
    let (mut board, keys) = seeded(sentinel::board::fen::STARTING_FEN);
    let limits = SearchLimits { max_depth: 4, ..Default::default() };
    let result = run(sentinel::board::fen::STARTING_FEN, limits);
    let best = result.best_move.expect("search must return a move at depth 4");

    let mut legal = arrayvec::ArrayVec::<sentinel::moves::types::Move, 256>::new();
    generate_legal(&mut board, &keys, &mut legal);
    assert!(legal.iter().any(|m| m.from == best.from && m.to == best.to && m.promotion == best.promotion));
}

#[test]
fn finds_mate_in_two() {
    // White to move, mates in two.
    let fen = "r1b1k2r/pppp1Npp/1b3n2/4p3/3nP3/2N5/PPPP1qPP/R1BQKB1R w KQkq - 0 1";
    let limits = SearchLimits { max_depth: 6, ..Default::default() };
    let result = run(fen, limits);
    assert!(
        result.score > sentinel::search::tt::MATE_THRESHOLD,
        "expected a mate score, got {}",
        result.score
    );
}

#[test]
fn deeper_iterative_deepening_never_regresses_score_by_more_than_a_pawn() {
    let fen = "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3";
    let shallow = run(fen, SearchLimits { max_depth: 2, ..Default::default() });
    let deeper = run(fen, SearchLimits { max_depth: 4, ..Default::default() });
    assert!((deeper.score - shallow.score).abs() < 300, "shallow={}, deeper={}", shallow.score, deeper.score);
}

#[test]
fn node_limit_is_honored() {
    let limits = SearchLimits { max_depth: 0, max_time_ms: 0, max_nodes: 500, eval_noise: 0 };
    let result = run(sentinel::board::fen::STARTING_FEN, limits);
    assert!(result.nodes <= 20_000, "node budget should bound the search, got {} nodes", result.nodes);
}
