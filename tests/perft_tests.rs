use sentinel::board::fen::STARTING_FEN;
use sentinel::board::Board;
use sentinel::hash::ZobristKeys;
use sentinel::moves::perft::perft;
use std::str::FromStr;

fn seeded_board(fen: &str) -> (Board, ZobristKeys) {
    let mut board = Board::from_str(fen).unwrap();
    sentinel::search::eval::recompute_incremental(&mut board);
    let keys = ZobristKeys::new(0x5EED);
    let (hash, lock) = keys.compute_full(&board);
    board.hash = hash;
    board.lock = lock;
    (board, keys)
}

#[test]
fn perft_starting_position_depth_four() {
    let (mut board, keys) = seeded_board(STARTING_FEN);
    assert_eq!(perft(&mut board, &keys, 4), 197_281);
}

#[test]
fn perft_kiwipete_depth_three() {
    let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
    let (mut board, keys) = seeded_board(fen);
    assert_eq!(perft(&mut board, &keys, 3), 97_862);
}

#[test]
fn perft_position_three_depth_five() {
    let fen = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1";
    let (mut board, keys) = seeded_board(fen);
    assert_eq!(perft(&mut board, &keys, 5), 674_624);
}

#[test]
fn perft_position_four_depth_four() {
    let fen = "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1";
    let (mut board, keys) = seeded_board(fen);
    assert_eq!(perft(&mut board, &keys, 4), 422_333);
}

#[test]
fn perft_position_five_depth_four() {
    let fen = "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8";
    let (mut board, keys) = seeded_board(fen);
    assert_eq!(perft(&mut board, &keys, 4), 2_103_487);
}

#[test]
fn perft_edge_case_depth_four() {
    let fen = "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10";
    let (mut board, keys) = seeded_board(fen);
    assert_eq!(perft(&mut board, &keys, 4), 3_894_594);
}
