use crate::board::{Board, PieceKind};
use crate::hash::ZobristKeys;
use crate::moves::attacks::in_check;
use crate::moves::execute;
use crate::moves::legal::{compute_legal_info, pin_allows, LegalInfo};
use crate::moves::movegen::{generate_pseudo_legal, GenMode};
use crate::moves::types::Move;
use crate::search::context::SearchContext;
use crate::search::eval::evaluate;
use crate::search::ordering::{captured_kind_for, mvv_lva};
use crate::search::picker::MovePicker;
use crate::search::repetition::RepetitionStack;
use crate::search::tt::{Bound, TranspositionTable, MATE_SCORE, MATE_THRESHOLD, MAX_PLY};
use crate::square::Square;
use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

const INF: i32 = 32_000;
const QS_MAX_DEPTH: i32 = 8;
const DELTA_MARGIN: i32 = 1100;
const FUTILITY_MARGIN_D1: i32 = 200;
const FUTILITY_MARGIN_D2: i32 = 500;
const ASPIRATION_WINDOW: i32 = 25;
const ASPIRATION_START_DEPTH: i32 = 2;
const TIME_EXTENSION_MS: u32 = 5000;
const OPENING_FULLMOVE_LIMIT: u16 = 6;

/// Search configuration. Zero means "unlimited" for every numeric field, per
/// the driver contract: all-zero limits degrade to a depth-1 search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchLimits {
    pub max_depth: u8,
    pub max_time_ms: u32,
    pub max_nodes: u64,
    #[serde(skip)]
    pub eval_noise: i32,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self { max_depth: 0, max_time_ms: 0, max_nodes: 0, eval_noise: 0 }
    }
}

pub struct SearchResult {
    pub best_move: Option<Move>,
    pub score: i32,
    pub depth: i32,
    pub nodes: u64,
}

/// Injectable clock + stop-flag bookkeeping. `time_fn` returns milliseconds
/// since an arbitrary epoch; passing `None` disables all time checks so a
/// caller with only a node limit never touches the clock.
pub struct TimeManager {
    time_fn: Option<Box<dyn FnMut() -> u32>>,
    start_ms: u32,
    max_time_ms: u32,
    max_nodes: u64,
    pub stop_signal: bool,
    extended_once: bool,
}

impl TimeManager {
    pub fn new(mut time_fn: Option<Box<dyn FnMut() -> u32>>, max_time_ms: u32, max_nodes: u64) -> Self {
        let start_ms = time_fn.as_mut().map(|f| f()).unwrap_or(0);
        Self { time_fn, start_ms, max_time_ms, max_nodes, stop_signal: false, extended_once: false }
    }

    #[inline]
    pub fn check(&mut self, nodes: u64) {
        if self.stop_signal {
            return;
        }
        if self.max_nodes != 0 && nodes >= self.max_nodes {
            self.stop_signal = true;
            return;
        }
        if self.max_time_ms != 0 {
            if let Some(f) = self.time_fn.as_mut() {
                if f().saturating_sub(self.start_ms) >= self.max_time_ms {
                    self.stop_signal = true;
                }
            }
        }
    }

    pub fn elapsed_ms(&mut self) -> u32 {
        self.time_fn.as_mut().map(|f| f().saturating_sub(self.start_ms)).unwrap_or(0)
    }

    /// One-shot deadline extension used when no root move has completed.
    fn extend_once(&mut self) -> bool {
        if self.extended_once || self.max_time_ms == 0 {
            return false;
        }
        self.max_time_ms = self.max_time_ms.saturating_add(TIME_EXTENSION_MS);
        self.stop_signal = false;
        self.extended_once = true;
        true
    }
}

struct XorShift32(u32);

impl XorShift32 {
    fn new(seed: u32) -> Self {
        Self(if seed == 0 { 0x9E37_79B9 } else { seed })
    }
    fn next(&mut self) -> u32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        x
    }
    /// Uniform value in `[-bound, +bound]`.
    fn symmetric(&mut self, bound: i32) -> i32 {
        if bound <= 0 {
            return 0;
        }
        let span = (2 * bound + 1) as u32;
        (self.next() % span) as i32 - bound
    }
}

/// Root-only move-selection noise (never affects the alpha-beta window or
/// the score returned upward, only which equally-searched root move is
/// reported as best), active for the first few moves of the game.
struct RootNoise<'a> {
    eval_noise: i32,
    rng: &'a mut XorShift32,
}

/// True unless `mv` can be dismissed without search when the side to move is
/// in check: king moves always evade, captures of the sole checker evade,
/// and (for a slider) moves onto a square between king and checker block it.
/// Double check only leaves king moves standing.
fn is_evasion_candidate(board: &Board, mv: Move, info: &LegalInfo) -> bool {
    if info.checkers.is_empty() {
        return true;
    }
    if mv.piece.kind() == Some(PieceKind::King) {
        return true;
    }
    if info.checkers.len() >= 2 {
        return false;
    }
    let checker = info.checkers[0];
    if mv.to == checker {
        return true;
    }
    if mv.is_en_passant() {
        let captured_sq = Square::new(mv.from.row(), mv.to.col());
        if captured_sq == checker {
            return true;
        }
    }
    is_between(board, board.king_square(board.side), checker, mv.to)
}

fn is_between(board: &Board, king: Square, checker: Square, target: Square) -> bool {
    let slides = matches!(
        board.piece_at(checker).kind(),
        Some(PieceKind::Bishop) | Some(PieceKind::Rook) | Some(PieceKind::Queen)
    );
    if !slides {
        return false;
    }
    let dr = checker.row() as i16 - king.row() as i16;
    let dc = checker.col() as i16 - king.col() as i16;
    if dr != 0 && dc != 0 && dr.abs() != dc.abs() {
        return false;
    }
    let delta = dr.signum() * 16 + dc.signum();
    let mut cur = king.offset(delta);
    while cur.is_valid() && cur != checker {
        if cur == target {
            return true;
        }
        cur = cur.offset(delta);
    }
    false
}

#[allow(clippy::too_many_arguments)]
pub fn quiescence(
    board: &mut Board,
    keys: &ZobristKeys,
    ply: usize,
    mut alpha: i32,
    beta: i32,
    qs_depth: i32,
    nodes: &mut u64,
    time: &mut TimeManager,
) -> i32 {
    *nodes += 1;
    if *nodes % 256 == 0 {
        time.check(*nodes);
    }
    if time.stop_signal {
        return 0;
    }
    if ply as i32 >= MAX_PLY || qs_depth >= QS_MAX_DEPTH {
        return evaluate(board);
    }

    let side = board.side;
    if in_check(board, side) {
        let mut raw: ArrayVec<Move, 96> = ArrayVec::new();
        generate_pseudo_legal(board, GenMode::All, &mut raw);
        let mut legal_moves = 0;
        for mv in raw {
            let undo = execute::make_move(board, keys, mv);
            if in_check(board, side) {
                execute::unmake_move(board, undo);
                continue;
            }
            legal_moves += 1;
            let score = -quiescence(board, keys, ply + 1, -beta, -alpha, qs_depth + 1, nodes, time);
            execute::unmake_move(board, undo);
            if time.stop_signal {
                return 0;
            }
            if score > alpha {
                alpha = score;
            }
            if alpha >= beta {
                return beta;
            }
        }
        if legal_moves == 0 {
            return -MATE_SCORE + ply as i32;
        }
        return alpha;
    }

    let stand_pat = evaluate(board);
    if stand_pat >= beta {
        return beta;
    }
    if stand_pat > alpha {
        alpha = stand_pat;
    }
    if stand_pat + DELTA_MARGIN < alpha {
        return alpha;
    }

    let mut raw: ArrayVec<Move, 64> = ArrayVec::new();
    generate_pseudo_legal(board, GenMode::CapturesOnly, &mut raw);
    let mut scored: ArrayVec<(Move, i32), 64> = raw
        .into_iter()
        .map(|mv| {
            let victim = captured_kind_for(board, mv).unwrap_or(PieceKind::Pawn);
            let attacker = mv.piece.kind().expect("moving piece must be real");
            let mut score = mvv_lva(victim, attacker);
            if let Some(promo) = mv.promotion {
                score += if promo == PieceKind::Queen { 5000 } else { 1000 };
            }
            (mv, score)
        })
        .collect();

    let mut idx = 0;
    while idx < scored.len() {
        let mut best = idx;
        for i in (idx + 1)..scored.len() {
            if scored[i].1 > scored[best].1 {
                best = i;
            }
        }
        scored.swap(idx, best);
        let mv = scored[idx].0;
        idx += 1;

        let undo = execute::make_move(board, keys, mv);
        if in_check(board, side) {
            execute::unmake_move(board, undo);
            continue;
        }
        let score = -quiescence(board, keys, ply + 1, -beta, -alpha, qs_depth + 1, nodes, time);
        execute::unmake_move(board, undo);
        if time.stop_signal {
            return 0;
        }
        if score >= beta {
            return beta;
        }
        if score > alpha {
            alpha = score;
        }
    }
    alpha
}

#[allow(clippy::too_many_arguments)]
fn negamax(
    board: &mut Board,
    keys: &ZobristKeys,
    ctx: &mut SearchContext,
    tt: &mut TranspositionTable,
    rep: &mut RepetitionStack,
    mut depth: i32,
    ply: usize,
    mut alpha: i32,
    beta: i32,
    do_null: bool,
    mut ext: i32,
    nodes: &mut u64,
    time: &mut TimeManager,
    mut root_noise: Option<RootNoise<'_>>,
) -> (i32, Option<Move>) {
    *nodes += 1;
    if *nodes % 256 == 0 {
        time.check(*nodes);
    }
    if time.stop_signal {
        return (0, None);
    }

    if ply > 0 && (rep.is_repetition() || board.halfmove >= 100) {
        return (0, None);
    }

    if depth <= 0 {
        return (quiescence(board, keys, ply, alpha, beta, 0, nodes, time), None);
    }
    if ply as i32 >= MAX_PLY {
        return (evaluate(board), None);
    }

    let (hash, lock) = (board.hash, board.lock);
    let mut tt_move: Option<Move> = None;
    if let Some(probe) = tt.probe(hash, lock, ply as i32) {
        if let Some(packed) = probe.best_move {
            let (from, to, promotion) = Move::decode_tt_u16(packed);
            tt_move = Some(Move { from, to, piece: board.piece_at(from), promotion, flags: 0 });
        }
        if probe.depth as i32 >= depth {
            match probe.bound {
                Bound::Exact => return (probe.score, tt_move),
                Bound::Lower if probe.score >= beta => return (probe.score, tt_move),
                Bound::Upper if probe.score <= alpha => return (probe.score, tt_move),
                _ => {}
            }
        }
    }

    let legal_info = compute_legal_info(board, board.side);
    let in_check_now = legal_info.in_check;
    if in_check_now && ext < 2 {
        depth += 1;
        ext += 1;
    }

    let static_eval_val = evaluate(board);
    let futility = !in_check_now
        && depth <= 2
        && ply > 0
        && {
            let margin = if depth == 1 { FUTILITY_MARGIN_D1 } else { FUTILITY_MARGIN_D2 };
            static_eval_val + margin <= alpha
        };

    if do_null && !in_check_now && depth >= 3 && ply > 0 && board.has_non_pawn_material(board.side) {
        let null_undo = execute::make_null_move(board, keys);
        rep.push(board.hash, board.lock);
        let (val, _) = negamax(board, keys, ctx, tt, rep, depth - 3, ply + 1, -beta, -beta + 1, false, ext, nodes, time, None);
        rep.pop();
        execute::unmake_null_move(board, null_undo);
        if time.stop_signal {
            return (0, None);
        }
        if -val >= beta {
            return (beta, None);
        }
    }

    let mut picker = MovePicker::new(board, tt_move, ctx, ply, false);
    let original_alpha = alpha;
    let mut legal_moves = 0i32;
    let mut best_score = -INF;
    let mut best_move: Option<Move> = None;

    while let Some((mv, is_capture)) = picker.next() {
        if !is_evasion_candidate(board, mv, &legal_info) {
            continue;
        }
        if !in_check_now && !pin_allows(&legal_info.pins, mv.from, mv.to) {
            continue;
        }
        if futility && legal_moves > 0 && !is_capture && mv.promotion.is_none() {
            continue;
        }

        let moving_side = board.side;
        let undo = execute::make_move(board, keys, mv);
        let needs_check = in_check_now || mv.piece.kind() == Some(PieceKind::King) || mv.is_en_passant();
        if needs_check && in_check(board, moving_side) {
            execute::unmake_move(board, undo);
            continue;
        }

        rep.push(board.hash, board.lock);
        legal_moves += 1;

        let score = if legal_moves == 1 {
            -negamax(board, keys, ctx, tt, rep, depth - 1, ply + 1, -beta, -alpha, true, ext, nodes, time, None).0
        } else {
            let lmr_eligible = !in_check_now && legal_moves > 4 && depth >= 3 && !is_capture && mv.promotion.is_none();
            let mut s = if lmr_eligible {
                let reduced = -negamax(board, keys, ctx, tt, rep, depth - 2, ply + 1, -alpha - 1, -alpha, true, ext, nodes, time, None).0;
                if reduced > alpha && !time.stop_signal {
                    -negamax(board, keys, ctx, tt, rep, depth - 1, ply + 1, -alpha - 1, -alpha, true, ext, nodes, time, None).0
                } else {
                    reduced
                }
            } else {
                -negamax(board, keys, ctx, tt, rep, depth - 1, ply + 1, -alpha - 1, -alpha, true, ext, nodes, time, None).0
            };
            if s > alpha && s < beta && !time.stop_signal {
                s = -negamax(board, keys, ctx, tt, rep, depth - 1, ply + 1, -beta, -alpha, true, ext, nodes, time, None).0;
            }
            s
        };

        rep.pop();
        execute::unmake_move(board, undo);

        if time.stop_signal {
            return (0, None);
        }

        let selection_score = if ply == 0 {
            if let Some(rn) = root_noise.as_mut() {
                if board.fullmove <= OPENING_FULLMOVE_LIMIT && rn.eval_noise > 0 {
                    score + rn.rng.symmetric(rn.eval_noise)
                } else {
                    score
                }
            } else {
                score
            }
        } else {
            score
        };

        if selection_score > best_score {
            best_score = selection_score;
            best_move = Some(mv);
        }
        if score > alpha {
            alpha = score;
        }
        if alpha >= beta {
            if !is_capture {
                ctx.update_killer(ply, mv);
                ctx.update_history(board.side, mv, depth);
            }
            tt.save(hash, lock, Some(mv), beta, depth as i8, Bound::Lower, ply as i32);
            return (beta, Some(mv));
        }
    }

    if legal_moves == 0 {
        return (if in_check_now { -MATE_SCORE + ply as i32 } else { 0 }, None);
    }

    let bound = if best_score > original_alpha { Bound::Exact } else { Bound::Upper };
    tt.save(hash, lock, best_move, best_score, depth as i8, bound, ply as i32);
    (best_score, best_move)
}

/// Iterative deepening driver. Commits the best move from the deepest
/// iteration that finished before a stop signal fired.
#[instrument(skip(board, keys, ctx, tt, rep, time_fn), fields(max_depth = limits.max_depth))]
pub fn search_go(
    board: &mut Board,
    keys: &ZobristKeys,
    ctx: &mut SearchContext,
    tt: &mut TranspositionTable,
    rep: &mut RepetitionStack,
    limits: &SearchLimits,
    time_fn: Option<Box<dyn FnMut() -> u32>>,
) -> SearchResult {
    let max_depth = if limits.max_depth == 0 { (MAX_PLY - 1) as i32 } else { limits.max_depth as i32 };
    let mut time = TimeManager::new(time_fn, limits.max_time_ms, limits.max_nodes);
    let mut nodes = 0u64;

    let mut best_move: Option<Move> = None;
    let mut best_score = 0i32;
    let mut last_completed_depth = 0i32;
    let mut rng = XorShift32::new(board.hash ^ 0xDEAD ^ time.elapsed_ms());

    let mut depth = 1;
    while depth <= max_depth {
        tt.new_search();

        let mut alpha = -INF;
        let mut beta = INF;
        if depth >= ASPIRATION_START_DEPTH {
            alpha = best_score - ASPIRATION_WINDOW;
            beta = best_score + ASPIRATION_WINDOW;
        }

        let (score, mv) = loop {
            let noise = RootNoise { eval_noise: limits.eval_noise, rng: &mut rng };
            let result = negamax(board, keys, ctx, tt, rep, depth, 0, alpha, beta, true, 0, &mut nodes, &mut time, Some(noise));
            if time.stop_signal {
                break result;
            }
            if result.0 <= alpha {
                alpha = -INF;
                continue;
            }
            if result.0 >= beta {
                beta = INF;
                continue;
            }
            break result;
        };

        if time.stop_signal {
            if best_move.is_none() && time.extend_once() {
                continue;
            }
            break;
        }

        if mv.is_none() {
            break;
        }

        best_score = score;
        best_move = mv;
        last_completed_depth = depth;

        debug!(depth, score, nodes, "iteration complete");

        if score.abs() >= MATE_THRESHOLD {
            break;
        }
        depth += 1;
    }

    SearchResult { best_move, score: best_score, depth: last_completed_depth, nodes }
}
