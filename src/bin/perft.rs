use sentinel::board::fen::STARTING_FEN;
use sentinel::board::Board;
use sentinel::hash::ZobristKeys;
use sentinel::logger;
use sentinel::moves::perft::{perft, perft_divide};
use std::env;
use std::str::FromStr;
use std::time::Instant;

fn main() {
    logger::init_logging("logs/perft.log", "perft=info");

    let mut args = env::args().skip(1);
    let depth: u32 = args.next().and_then(|a| a.parse().ok()).unwrap_or(5);
    let fen = args.next().unwrap_or_else(|| STARTING_FEN.to_string());
    let divide = env::args().any(|a| a == "--divide");

    let mut board = Board::from_str(&fen).unwrap_or_else(|e| {
        eprintln!("bad fen {fen:?}: {e}");
        std::process::exit(1);
    });
    sentinel::search::eval::recompute_incremental(&mut board);

    let keys = ZobristKeys::new(0x5EED);
    let (hash, lock) = keys.compute_full(&board);
    board.hash = hash;
    board.lock = lock;

    let start = Instant::now();
    let nodes = if divide { perft_divide(&mut board, &keys, depth) } else { perft(&mut board, &keys, depth) };
    let elapsed = start.elapsed();

    println!("depth {depth}: {nodes} nodes in {:.3}s ({:.0} nps)", elapsed.as_secs_f64(), nodes as f64 / elapsed.as_secs_f64().max(1e-9));
}
