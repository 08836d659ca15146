//! Binds one game's worth of engine state — board, transposition table,
//! move-ordering context, repetition history, Zobrist keys, and opening
//! book — behind a single handle. A driver owns one `EngineHandle` per game
//! and must not run two searches on it concurrently.

use crate::board::fen::STARTING_FEN;
use crate::board::{Board, FenError};
use crate::book::{BookError, PolyglotBook};
use crate::hash::ZobristKeys;
use crate::moves::execute;
use crate::moves::types::{Move, Undo};
use crate::search::context::SearchContext;
use crate::search::repetition::RepetitionStack;
use crate::search::search::{search_go, SearchLimits, SearchResult};
use crate::search::tt::TranspositionTable;
use std::path::Path;
use tracing::instrument;

/// Fixed at construction: transposition table size, the Zobrist seed this
/// handle's hash/lock keys are derived from, and the root-move randomization
/// amount. A new seed produces a handle with different (but internally
/// consistent) hash values — never mix TT or book data cut with one seed
/// into a handle built with another.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct EngineConfig {
    pub tt_size_mb: usize,
    pub zobrist_seed: u32,
    pub eval_noise: i32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { tt_size_mb: 64, zobrist_seed: 0x5EED_1234, eval_noise: 0 }
    }
}

pub struct EngineHandle {
    board: Board,
    keys: ZobristKeys,
    tt: TranspositionTable,
    ctx: SearchContext,
    rep: RepetitionStack,
    book: Option<PolyglotBook>,
    book_seed_state: u64,
    config: EngineConfig,
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> Self {
        let keys = ZobristKeys::new(config.zobrist_seed);
        let mut board: Board = STARTING_FEN.parse().expect("starting FEN is valid");
        crate::search::eval::recompute_incremental(&mut board);
        let (hash, lock) = keys.compute_full(&board);
        board.hash = hash;
        board.lock = lock;

        let mut rep = RepetitionStack::new();
        rep.push(board.hash, board.lock);

        Self {
            board,
            keys,
            tt: TranspositionTable::new(config.tt_size_mb),
            ctx: SearchContext::new(),
            rep,
            book: None,
            book_seed_state: config.zobrist_seed as u64 ^ 0x9E37_79B9_7F4A_7C15,
            config,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Resets to the starting position, clearing the TT, killers/history,
    /// and repetition history. The opening book (if loaded) is untouched.
    pub fn new_game(&mut self) {
        let mut board: Board = STARTING_FEN.parse().expect("starting FEN is valid");
        crate::search::eval::recompute_incremental(&mut board);
        let (hash, lock) = self.keys.compute_full(&board);
        board.hash = hash;
        board.lock = lock;
        self.board = board;
        self.tt.clear();
        self.ctx = SearchContext::new();
        self.rep.clear();
        self.rep.push(self.board.hash, self.board.lock);
    }

    pub fn set_position_fen(&mut self, fen: &str) -> Result<(), FenError> {
        let mut board: Board = fen.parse()?;
        crate::search::eval::recompute_incremental(&mut board);
        let (hash, lock) = self.keys.compute_full(&board);
        board.hash = hash;
        board.lock = lock;
        self.board = board;
        self.rep.clear();
        self.rep.push(self.board.hash, self.board.lock);
        Ok(())
    }

    /// Applies `mv` to the live board, updating the persistent repetition
    /// history (distinct from the per-search-node stack `negamax` maintains
    /// internally). Captures, pawn moves, and castling-rights changes reset
    /// the irreversible watermark.
    pub fn make_move(&mut self, mv: Move) -> Undo {
        let prev_castling = self.board.castling;
        let undo = execute::make_move(&mut self.board, &self.keys, mv);
        self.rep.push(self.board.hash, self.board.lock);
        if mv.is_capture() || mv.piece.kind() == Some(crate::board::PieceKind::Pawn) || self.board.castling != prev_castling {
            self.rep.set_irreversible();
        }
        undo
    }

    pub fn unmake_move(&mut self, undo: Undo) {
        self.rep.pop();
        execute::unmake_move(&mut self.board, undo);
    }

    #[instrument(skip(self, time_fn))]
    pub fn search_go(&mut self, limits: &SearchLimits, time_fn: Option<Box<dyn FnMut() -> u32>>) -> SearchResult {
        let mut limits = limits.clone();
        limits.eval_noise = self.config.eval_noise;
        search_go(&mut self.board, &self.keys, &mut self.ctx, &mut self.tt, &mut self.rep, &limits, time_fn)
    }

    pub fn book_init<P: AsRef<Path>>(&mut self, dir: P) -> Result<(), BookError> {
        self.book = Some(PolyglotBook::load_dir(dir)?);
        Ok(())
    }

    pub fn book_close(&mut self) {
        self.book = None;
    }

    pub fn book_get_info(&self) -> (bool, usize, usize) {
        match &self.book {
            Some(book) => (book.is_ready(), book.segment_count(), book.total_entries()),
            None => (false, 0, 0),
        }
    }

    pub fn book_get_tier_name(&self) -> Option<&str> {
        self.book.as_ref().and_then(|b| b.tier_name(0))
    }

    pub fn book_probe(&mut self) -> Option<Move> {
        self.book_seed_state = self.book_seed_state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let book = self.book.as_ref()?;
        book.probe(&self.board, self.book_seed_state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_handle_starts_at_the_starting_position() {
        let engine = EngineHandle::new(EngineConfig::default());
        assert_eq!(engine.board().fullmove, 1);
    }

    #[test]
    fn search_go_returns_a_move_at_depth_one() {
        let mut engine = EngineHandle::new(EngineConfig::default());
        let limits = SearchLimits { max_depth: 1, ..Default::default() };
        let result = engine.search_go(&limits, None);
        assert!(result.best_move.is_some());
    }

    #[test]
    fn book_with_no_segments_reports_not_ready() {
        let engine = EngineHandle::new(EngineConfig::default());
        let (ready, segments, entries) = engine.book_get_info();
        assert!(!ready);
        assert_eq!(segments, 0);
        assert_eq!(entries, 0);
    }
}
