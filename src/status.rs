use crate::board::{Board, Color, PieceKind};
use crate::hash::ZobristKeys;
use crate::moves::attacks::in_check;
use crate::moves::movegen::generate_legal;
use crate::moves::types::Move;
use crate::search::RepetitionStack;
use arrayvec::ArrayVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    InPlay,
    DrawFivefold,
    DrawSeventyFiveMove,
    DrawThreefold,
    DrawFiftyMove,
    DrawDeadPosition,
    Stalemate,
    Checkmate,
}

pub fn is_draw_by_fifty_move(board: &Board) -> bool {
    board.halfmove >= 100
}

pub fn is_seventyfive_move(board: &Board) -> bool {
    board.halfmove >= 150
}

/// K-vs-K, K-vs-KB, K-vs-KN, and K+N+N-vs-K are the only piece-list
/// combinations this checks for; 3+ minors on one side are conservatively
/// treated as mating material even where some configurations are not.
pub fn is_insufficient_material(board: &Board) -> bool {
    for &color in &[Color::White, Color::Black] {
        for &sq in board.piece_list(color) {
            match board.piece_at(sq).kind() {
                Some(PieceKind::Pawn) | Some(PieceKind::Rook) | Some(PieceKind::Queen) => return false,
                _ => {}
            }
        }
    }

    let minors = |color: Color| -> (u32, u32) {
        let mut bishops = 0;
        let mut knights = 0;
        for &sq in board.piece_list(color) {
            match board.piece_at(sq).kind() {
                Some(PieceKind::Bishop) => bishops += 1,
                Some(PieceKind::Knight) => knights += 1,
                _ => {}
            }
        }
        (bishops, knights)
    };

    let (wb, wn) = minors(Color::White);
    let (bb, bn) = minors(Color::Black);
    let w_minors = wb + wn;
    let b_minors = bb + bn;
    let total_minors = w_minors + b_minors;

    if total_minors == 0 {
        return true;
    }
    if total_minors == 1 {
        return true;
    }
    if total_minors == 2 {
        if wn == 2 || bn == 2 {
            return true;
        }
        if w_minors == 1 && b_minors == 1 {
            return true;
        }
        return false;
    }

    false
}

/// Determines the status of `board` given the caller-maintained repetition
/// history. Priority (highest to lowest): fivefold, 75-move, dead position,
/// threefold, 50-move, then checkmate/stalemate/in-play.
pub fn position_status(board: &mut Board, keys: &ZobristKeys, repetition: &RepetitionStack) -> GameStatus {
    if repetition.repetition_count(board.hash, board.lock) >= 5 {
        return GameStatus::DrawFivefold;
    }
    if is_seventyfive_move(board) {
        return GameStatus::DrawSeventyFiveMove;
    }
    if is_insufficient_material(board) {
        return GameStatus::DrawDeadPosition;
    }
    if repetition.is_repetition() {
        return GameStatus::DrawThreefold;
    }
    if is_draw_by_fifty_move(board) {
        return GameStatus::DrawFiftyMove;
    }

    let mut legal: ArrayVec<Move, 256> = ArrayVec::new();
    generate_legal(board, keys, &mut legal);
    if legal.is_empty() {
        if in_check(board, board.side) {
            GameStatus::Checkmate
        } else {
            GameStatus::Stalemate
        }
    } else {
        GameStatus::InPlay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::fen::STARTING_FEN;

    #[test]
    fn starting_position_is_in_play() {
        let mut board: Board = STARTING_FEN.parse().unwrap();
        let keys = ZobristKeys::new(1);
        let repetition = RepetitionStack::default();
        assert_eq!(position_status(&mut board, &keys, &repetition), GameStatus::InPlay);
    }

    #[test]
    fn bare_kings_are_a_dead_position() {
        let mut board: Board = "8/8/4k3/8/8/4K3/8/8 w - - 0 1".parse().unwrap();
        let keys = ZobristKeys::new(1);
        let repetition = RepetitionStack::default();
        assert_eq!(position_status(&mut board, &keys, &repetition), GameStatus::DrawDeadPosition);
    }

    #[test]
    fn fools_mate_is_checkmate() {
        let mut board: Board = "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3"
            .parse()
            .unwrap();
        let keys = ZobristKeys::new(1);
        let repetition = RepetitionStack::default();
        assert_eq!(position_status(&mut board, &keys, &repetition), GameStatus::Checkmate);
    }

    #[test]
    fn stalemate_is_detected() {
        let mut board: Board = "k7/8/1Q6/8/8/8/8/7K b - - 0 1".parse().unwrap();
        let keys = ZobristKeys::new(1);
        let repetition = RepetitionStack::default();
        assert_eq!(position_status(&mut board, &keys, &repetition), GameStatus::Stalemate);
    }
}
