use crate::board::{Board, Color, Piece, PieceKind, CASTLE_BK, CASTLE_BQ, CASTLE_WK, CASTLE_WQ};
use crate::hash::zobrist::{ep_file_to_hash, ZobristKeys};
use crate::moves::types::{CapturedPiece, Move, NullMoveUndo, Undo};
use crate::search::eval::piece_contribution;
use crate::square::Square;

#[inline(always)]
fn castle_rook_squares(side: Color, kingside: bool) -> (Square, Square) {
    let rank = match side {
        Color::White => 0,
        Color::Black => 7,
    };
    if kingside {
        (Square::from_rank_file(rank, 7), Square::from_rank_file(rank, 5))
    } else {
        (Square::from_rank_file(rank, 0), Square::from_rank_file(rank, 3))
    }
}

#[inline(always)]
fn rook_corner_right(color: Color, sq: Square) -> u8 {
    match (color, sq.rank(), sq.file()) {
        (Color::White, 0, 0) => CASTLE_WQ,
        (Color::White, 0, 7) => CASTLE_WK,
        (Color::Black, 7, 0) => CASTLE_BQ,
        (Color::Black, 7, 7) => CASTLE_BK,
        _ => 0,
    }
}

#[inline(always)]
fn remove_piece(board: &mut Board, color: Color, sq: Square) -> crate::board::ListRemoval {
    let kind = board.piece_at(sq).kind().expect("remove_piece requires an occupied square");
    let (mg, eg, phase) = piece_contribution(color, kind, sq);
    board.mg[color as usize] -= mg;
    board.eg[color as usize] -= eg;
    board.phase -= phase;
    board.squares[sq.0 as usize] = Piece::NONE;
    board.remove_from_list(color, sq)
}

pub fn make_move(board: &mut Board, keys: &ZobristKeys, mv: Move) -> Undo {
    let side = board.side;
    let moved_piece = board.piece_at(mv.from);
    let moved_kind = moved_piece.kind().expect("move source must hold a piece");

    let prev_hash = board.hash;
    let prev_lock = board.lock;
    let prev_castling = board.castling;
    let prev_ep_square = board.ep_square;
    let prev_halfmove = board.halfmove;
    let prev_fullmove = board.fullmove;
    let prev_mg = board.mg;
    let prev_eg = board.eg;
    let prev_phase = board.phase;

    if let Some(file) = ep_file_to_hash(board) {
        let (h, l) = keys.ep_file_key(file);
        board.hash ^= h;
        board.lock ^= l;
    }

    let mut captured = None;
    if mv.is_en_passant() {
        let cap_sq = Square::new(mv.from.row(), mv.to.col());
        let cap_piece = board.piece_at(cap_sq);
        let (h, l) = keys.piece_key(side.opposite(), PieceKind::Pawn, cap_sq);
        board.hash ^= h;
        board.lock ^= l;
        let removal = remove_piece(board, side.opposite(), cap_sq);
        captured = Some(CapturedPiece { piece: cap_piece, square: cap_sq, removal });
    } else if !board.is_empty(mv.to) {
        let cap_piece = board.piece_at(mv.to);
        let cap_kind = cap_piece.kind().expect("capture target holds a piece");
        let (h, l) = keys.piece_key(side.opposite(), cap_kind, mv.to);
        board.hash ^= h;
        board.lock ^= l;
        let removal = remove_piece(board, side.opposite(), mv.to);
        captured = Some(CapturedPiece { piece: cap_piece, square: mv.to, removal });
    }

    let (h_from, l_from) = keys.piece_key(side, moved_kind, mv.from);
    board.hash ^= h_from;
    board.lock ^= l_from;
    {
        let (mg, eg, phase) = piece_contribution(side, moved_kind, mv.from);
        board.mg[side as usize] -= mg;
        board.eg[side as usize] -= eg;
        board.phase -= phase;
    }
    board.squares[mv.from.0 as usize] = Piece::NONE;
    board.move_piece_in_list(side, mv.from, mv.to);

    let placed_kind = mv.promotion.unwrap_or(moved_kind);
    board.squares[mv.to.0 as usize] = Piece::new(side, placed_kind);
    {
        let (mg, eg, phase) = piece_contribution(side, placed_kind, mv.to);
        board.mg[side as usize] += mg;
        board.eg[side as usize] += eg;
        board.phase += phase;
    }
    let (h_to, l_to) = keys.piece_key(side, placed_kind, mv.to);
    board.hash ^= h_to;
    board.lock ^= l_to;

    if placed_kind == PieceKind::King {
        board.king_sq[side as usize] = mv.to;
    }

    if mv.is_castling() {
        let (rook_from, rook_to) = castle_rook_squares(side, mv.is_kingside_castle());
        let (h1, l1) = keys.piece_key(side, PieceKind::Rook, rook_from);
        board.hash ^= h1;
        board.lock ^= l1;
        {
            let (mg, eg, phase) = piece_contribution(side, PieceKind::Rook, rook_from);
            board.mg[side as usize] -= mg;
            board.eg[side as usize] -= eg;
            board.phase -= phase;
        }
        board.squares[rook_from.0 as usize] = Piece::NONE;
        board.move_piece_in_list(side, rook_from, rook_to);
        board.squares[rook_to.0 as usize] = Piece::new(side, PieceKind::Rook);
        {
            let (mg, eg, phase) = piece_contribution(side, PieceKind::Rook, rook_to);
            board.mg[side as usize] += mg;
            board.eg[side as usize] += eg;
            board.phase += phase;
        }
        let (h2, l2) = keys.piece_key(side, PieceKind::Rook, rook_to);
        board.hash ^= h2;
        board.lock ^= l2;
    }

    let mut mask_to_clear = 0u8;
    if moved_kind == PieceKind::King {
        mask_to_clear |= match side {
            Color::White => CASTLE_WK | CASTLE_WQ,
            Color::Black => CASTLE_BK | CASTLE_BQ,
        };
    }
    if moved_kind == PieceKind::Rook {
        mask_to_clear |= rook_corner_right(side, mv.from);
    }
    if let Some(cap) = captured {
        if cap.piece.kind() == Some(PieceKind::Rook) {
            mask_to_clear |= rook_corner_right(side.opposite(), cap.square);
        }
    }
    let new_castling = board.castling & !mask_to_clear;
    if new_castling != board.castling {
        let (h, l) = keys.castling_delta(board.castling, new_castling);
        board.hash ^= h;
        board.lock ^= l;
        board.castling = new_castling;
    }

    board.ep_square = Square::INVALID;
    if moved_kind == PieceKind::Pawn {
        let delta = mv.to.0 as i16 - mv.from.0 as i16;
        if delta == 32 || delta == -32 {
            board.ep_square = mv.from.offset(delta / 2);
        }
    }
    if let Some(file) = ep_file_to_hash(board) {
        let (h, l) = keys.ep_file_key(file);
        board.hash ^= h;
        board.lock ^= l;
    }

    board.halfmove = if captured.is_some() || moved_kind == PieceKind::Pawn {
        0
    } else {
        prev_halfmove + 1
    };
    if side == Color::Black {
        board.fullmove = prev_fullmove + 1;
    }

    board.side = side.opposite();
    let (h, l) = keys.side_key();
    board.hash ^= h;
    board.lock ^= l;

    Undo {
        mv,
        moved_piece,
        captured,
        prev_castling,
        prev_ep_square,
        prev_halfmove,
        prev_fullmove,
        prev_hash,
        prev_lock,
        prev_mg,
        prev_eg,
        prev_phase,
    }
}

pub fn unmake_move(board: &mut Board, undo: Undo) {
    let side = board.side.opposite();
    let mv = undo.mv;
    let moved_kind = undo.moved_piece.kind().expect("moved piece");

    if mv.is_castling() {
        let (rook_from, rook_to) = castle_rook_squares(side, mv.is_kingside_castle());
        board.squares[rook_to.0 as usize] = Piece::NONE;
        board.squares[rook_from.0 as usize] = Piece::new(side, PieceKind::Rook);
        board.unmove_piece_in_list(side, rook_from, rook_to);
    }

    board.squares[mv.to.0 as usize] = Piece::NONE;
    board.squares[mv.from.0 as usize] = undo.moved_piece;
    board.unmove_piece_in_list(side, mv.from, mv.to);
    if moved_kind == PieceKind::King {
        board.king_sq[side as usize] = mv.from;
    }

    if let Some(cap) = undo.captured {
        board.squares[cap.square.0 as usize] = cap.piece;
        board.restore_to_list(side.opposite(), cap.removal);
    }

    board.side = side;
    board.castling = undo.prev_castling;
    board.ep_square = undo.prev_ep_square;
    board.halfmove = undo.prev_halfmove;
    board.fullmove = undo.prev_fullmove;
    board.hash = undo.prev_hash;
    board.lock = undo.prev_lock;
    board.mg = undo.prev_mg;
    board.eg = undo.prev_eg;
    board.phase = undo.prev_phase;
}

pub fn make_null_move(board: &mut Board, keys: &ZobristKeys) -> NullMoveUndo {
    let prev_ep_square = board.ep_square;
    let prev_hash = board.hash;
    let prev_lock = board.lock;

    if let Some(file) = ep_file_to_hash(board) {
        let (h, l) = keys.ep_file_key(file);
        board.hash ^= h;
        board.lock ^= l;
    }
    board.ep_square = Square::INVALID;
    board.side = board.side.opposite();
    let (h, l) = keys.side_key();
    board.hash ^= h;
    board.lock ^= l;

    NullMoveUndo { prev_ep_square, prev_hash, prev_lock }
}

pub fn unmake_null_move(board: &mut Board, undo: NullMoveUndo) {
    board.side = board.side.opposite();
    board.ep_square = undo.prev_ep_square;
    board.hash = undo.prev_hash;
    board.lock = undo.prev_lock;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::fen::STARTING_FEN;
    use crate::search::eval::recompute_incremental;

    fn setup(fen: &str) -> (Board, ZobristKeys) {
        let mut board: Board = fen.parse().unwrap();
        recompute_incremental(&mut board);
        let keys = ZobristKeys::new(123);
        let (hash, lock) = keys.compute_full(&board);
        board.hash = hash;
        board.lock = lock;
        (board, keys)
    }

    #[test]
    fn make_then_unmake_restores_board_exactly() {
        let (mut board, keys) = setup(STARTING_FEN);
        let before = board.clone();
        let mv = Move {
            from: Square::from_rank_file(1, 4),
            to: Square::from_rank_file(3, 4),
            piece: Piece::new(Color::White, PieceKind::Pawn),
            promotion: None,
            flags: crate::moves::types::DOUBLE_PAWN_PUSH,
        };
        let undo = make_move(&mut board, &keys, mv);
        assert_ne!(board, before);
        unmake_move(&mut board, undo);
        assert_eq!(board, before);
    }

    #[test]
    fn en_passant_capture_round_trips() {
        let (mut board, keys) =
            setup("rnbqkbnr/ppp1pppp/8/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3");
        let before = board.clone();
        let mv = Move {
            from: Square::from_rank_file(4, 4),
            to: Square::from_rank_file(5, 3),
            piece: Piece::new(Color::White, PieceKind::Pawn),
            promotion: None,
            flags: crate::moves::types::EN_PASSANT,
        };
        let undo = make_move(&mut board, &keys, mv);
        assert!(board.is_empty(Square::from_rank_file(4, 3)));
        unmake_move(&mut board, undo);
        assert_eq!(board, before);
    }

    #[test]
    fn hash_matches_full_recompute_after_several_moves() {
        let (mut board, keys) = setup(STARTING_FEN);
        let mv1 = Move {
            from: Square::from_rank_file(1, 4),
            to: Square::from_rank_file(3, 4),
            piece: Piece::new(Color::White, PieceKind::Pawn),
            promotion: None,
            flags: crate::moves::types::DOUBLE_PAWN_PUSH,
        };
        let _undo = make_move(&mut board, &keys, mv1);
        let (full_hash, full_lock) = keys.compute_full(&board);
        assert_eq!(board.hash, full_hash);
        assert_eq!(board.lock, full_lock);
    }
}
