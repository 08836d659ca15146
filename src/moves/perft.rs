use crate::board::Board;
use crate::hash::ZobristKeys;
use crate::moves::attacks::in_check;
use crate::moves::execute::{make_move, unmake_move};
use crate::moves::movegen::generate_legal;
use crate::moves::types::Move;
use tracing::{debug, instrument};

const MAX_LOG_DEPTH: u32 = 3;
const MAX_PERFT_DEPTH: usize = 20;

pub struct PerftCounters {
    pub nodes: u64,
    pub captures: u64,
    pub ep_captures: u64,
    pub castles: u64,
    pub promotions: u64,
    pub checks: u64,
    pub checkmates: u64,
}

impl PerftCounters {
    pub fn zero() -> Self {
        Self {
            nodes: 0,
            captures: 0,
            ep_captures: 0,
            castles: 0,
            promotions: 0,
            checks: 0,
            checkmates: 0,
        }
    }

    pub fn add(&mut self, o: &PerftCounters) {
        self.nodes += o.nodes;
        self.captures += o.captures;
        self.ep_captures += o.ep_captures;
        self.castles += o.castles;
        self.promotions += o.promotions;
        self.checks += o.checks;
        self.checkmates += o.checkmates;
    }
}

fn create_move_buffer_array() -> [Vec<Move>; MAX_PERFT_DEPTH] {
    std::array::from_fn(|_| Vec::with_capacity(64))
}

fn perft_recursive(
    board: &mut Board,
    keys: &ZobristKeys,
    depth: u32,
    ply: usize,
    move_buffers: &mut [Vec<Move>],
) -> u64 {
    if depth == 0 {
        return 1;
    }

    {
        let moves = &mut move_buffers[ply];
        moves.clear();
        generate_legal(board, keys, moves);
    }

    let move_count = move_buffers[ply].len();
    let mut node_count = 0;
    for i in 0..move_count {
        let mv = move_buffers[ply][i];
        let undo = make_move(board, keys, mv);
        node_count += perft_recursive(board, keys, depth - 1, ply + 1, move_buffers);
        unmake_move(board, undo);
    }
    node_count
}

#[instrument(skip(board, keys), fields(depth))]
pub fn perft(board: &mut Board, keys: &ZobristKeys, depth: u32) -> u64 {
    assert!(depth as usize <= MAX_PERFT_DEPTH, "depth {depth} exceeds MAX_PERFT_DEPTH");
    let mut move_buffers = create_move_buffer_array();
    perft_recursive(board, keys, depth, 0, &mut move_buffers)
}

#[instrument(skip(board, keys), fields(depth))]
pub fn perft_divide(board: &mut Board, keys: &ZobristKeys, depth: u32) -> u64 {
    assert!(depth as usize <= MAX_PERFT_DEPTH, "depth {depth} exceeds MAX_PERFT_DEPTH");
    let mut move_buffers = create_move_buffer_array();

    {
        let moves = &mut move_buffers[0];
        moves.clear();
        generate_legal(board, keys, moves);
        if depth <= MAX_LOG_DEPTH {
            debug!(depth, moves = moves.len(), "divide: root legal moves");
        }
    }

    let move_count = move_buffers[0].len();
    let mut total = 0;
    for i in 0..move_count {
        let mv = move_buffers[0][i];
        let undo = make_move(board, keys, mv);
        let count = if depth == 1 {
            1
        } else {
            perft_recursive(board, keys, depth - 1, 1, &mut move_buffers)
        };
        unmake_move(board, undo);

        if depth <= MAX_LOG_DEPTH {
            debug!(%mv, nodes = count, "divide: root child total");
        }
        println!("{mv}: {count}");
        total += count;
    }
    debug!(depth, total, "divide: total");
    println!("Total: {total}");
    total
}

fn perft_count_recursive(
    board: &mut Board,
    keys: &ZobristKeys,
    depth: u32,
    ply: usize,
    out: &mut PerftCounters,
    move_buffers: &mut [Vec<Move>],
) {
    if depth == 0 {
        out.nodes += 1;
        let side_in_check = in_check(board, board.side);
        if side_in_check {
            out.checks += 1;
        }
        {
            let tmp = &mut move_buffers[ply];
            tmp.clear();
            generate_legal(board, keys, tmp);
        }
        if move_buffers[ply].is_empty() && side_in_check {
            out.checkmates += 1;
        }
        return;
    }

    {
        let moves = &mut move_buffers[ply];
        moves.clear();
        generate_legal(board, keys, moves);
    }

    let move_count = move_buffers[ply].len();
    for i in 0..move_count {
        let mv = move_buffers[ply][i];

        if mv.is_capture() {
            out.captures += 1;
            if mv.is_en_passant() {
                out.ep_captures += 1;
            }
        }
        if mv.is_castling() {
            out.castles += 1;
        }
        if mv.promotion.is_some() {
            out.promotions += 1;
        }

        #[cfg(debug_assertions)]
        let (hash0, lock0) = (board.hash, board.lock);

        let undo = make_move(board, keys, mv);
        perft_count_recursive(board, keys, depth - 1, ply + 1, out, move_buffers);
        unmake_move(board, undo);

        #[cfg(debug_assertions)]
        {
            debug_assert_eq!(board.hash, hash0, "hash changed across make/unmake");
            debug_assert_eq!(board.lock, lock0, "lock changed across make/unmake");
            let (full_hash, full_lock) = keys.compute_full(board);
            debug_assert_eq!(board.hash, full_hash, "incremental hash diverged from full recompute");
            debug_assert_eq!(board.lock, full_lock, "incremental lock diverged from full recompute");
        }
    }
}

pub fn perft_count_with_breakdown(board: &mut Board, keys: &ZobristKeys, depth: u32, out: &mut PerftCounters) {
    assert!(depth as usize <= MAX_PERFT_DEPTH, "depth {depth} exceeds MAX_PERFT_DEPTH");
    let mut move_buffers = create_move_buffer_array();
    perft_count_recursive(board, keys, depth, 0, out, &mut move_buffers);
}

pub fn perft_divide_with_breakdown(board: &mut Board, keys: &ZobristKeys, depth: u32) -> Vec<(Move, PerftCounters)> {
    assert!(depth as usize <= MAX_PERFT_DEPTH, "depth {depth} exceeds MAX_PERFT_DEPTH");
    let mut move_buffers = create_move_buffer_array();

    {
        let moves = &mut move_buffers[0];
        moves.clear();
        generate_legal(board, keys, moves);
    }

    let move_count = move_buffers[0].len();
    let mut out = Vec::with_capacity(move_count);
    for i in 0..move_count {
        let mv = move_buffers[0][i];
        let undo = make_move(board, keys, mv);
        let mut pc = PerftCounters::zero();
        if depth > 1 {
            perft_count_recursive(board, keys, depth - 1, 1, &mut pc, &mut move_buffers);
        } else {
            pc.nodes = 1;
        }
        unmake_move(board, undo);
        out.push((mv, pc));
    }
    out
}
