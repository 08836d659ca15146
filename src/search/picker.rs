//! Staged move picker: captures are generated and scored first, then
//! quiets, each stage consumed by a lazy selection sort so a beta cutoff
//! early in a stage never pays for scoring or sorting the rest.

use crate::board::Board;
use crate::moves::movegen::{generate_pseudo_legal, GenMode};
use crate::moves::types::Move;
use crate::search::context::SearchContext;
use crate::search::ordering::{captured_kind_for, score_move};
use arrayvec::ArrayVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Captures,
    Quiets,
    Done,
}

pub struct MovePicker {
    stage: Stage,
    captures: ArrayVec<(Move, i32), 64>,
    quiets: ArrayVec<(Move, i32), 256>,
    cap_idx: usize,
    quiet_idx: usize,
    captures_only: bool,
}

impl MovePicker {
    pub fn new(
        board: &Board,
        tt_move: Option<Move>,
        ctx: &SearchContext,
        ply: usize,
        captures_only: bool,
    ) -> Self {
        let side = board.side;
        let mut raw_captures: ArrayVec<Move, 64> = ArrayVec::new();
        generate_pseudo_legal(board, GenMode::CapturesOnly, &mut raw_captures);
        let captures = raw_captures
            .into_iter()
            .map(|mv| {
                let kind = captured_kind_for(board, mv);
                let score = score_move(mv, side, kind, tt_move, ctx, ply);
                (mv, score)
            })
            .collect();

        let quiets = if captures_only {
            ArrayVec::new()
        } else {
            let mut raw_quiets: ArrayVec<Move, 256> = ArrayVec::new();
            generate_pseudo_legal(board, GenMode::QuietsOnly, &mut raw_quiets);
            raw_quiets
                .into_iter()
                .map(|mv| {
                    let score = score_move(mv, side, None, tt_move, ctx, ply);
                    (mv, score)
                })
                .collect()
        };

        MovePicker {
            stage: Stage::Captures,
            captures,
            quiets,
            cap_idx: 0,
            quiet_idx: 0,
            captures_only,
        }
    }

    fn pick_best(list: &mut [(Move, i32)], idx: &mut usize) -> Option<Move> {
        if *idx >= list.len() {
            return None;
        }
        let mut best = *idx;
        for i in (*idx + 1)..list.len() {
            if list[i].1 > list[best].1 {
                best = i;
            }
        }
        list.swap(*idx, best);
        let mv = list[*idx].0;
        *idx += 1;
        Some(mv)
    }

    /// Returns the next move plus whether it was generated as a capture
    /// (callers need `is_capture` without re-deriving it from the board).
    pub fn next(&mut self) -> Option<(Move, bool)> {
        loop {
            match self.stage {
                Stage::Captures => {
                    if let Some(mv) = Self::pick_best(&mut self.captures, &mut self.cap_idx) {
                        return Some((mv, true));
                    }
                    self.stage = if self.captures_only { Stage::Done } else { Stage::Quiets };
                }
                Stage::Quiets => {
                    if let Some(mv) = Self::pick_best(&mut self.quiets, &mut self.quiet_idx) {
                        return Some((mv, false));
                    }
                    self.stage = Stage::Done;
                }
                Stage::Done => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::fen::STARTING_FEN;

    #[test]
    fn captures_are_exhausted_before_quiets() {
        let board: Board = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2"
            .parse()
            .unwrap();
        let ctx = SearchContext::new();
        let mut picker = MovePicker::new(&board, None, &ctx, 0, false);
        let mut seen_quiet = false;
        while let Some((_mv, is_cap)) = picker.next() {
            if !is_cap {
                seen_quiet = true;
            } else {
                assert!(!seen_quiet, "a capture appeared after a quiet move");
            }
        }
    }

    #[test]
    fn starting_position_yields_all_twenty_pseudo_legal_moves() {
        let board: Board = STARTING_FEN.parse().unwrap();
        let ctx = SearchContext::new();
        let mut picker = MovePicker::new(&board, None, &ctx, 0, false);
        let mut count = 0;
        while picker.next().is_some() {
            count += 1;
        }
        assert_eq!(count, 20);
    }
}
