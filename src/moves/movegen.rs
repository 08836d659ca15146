use crate::board::{Board, Color, PieceKind, CASTLE_BK, CASTLE_BQ, CASTLE_WK, CASTLE_WQ};
use crate::moves::attacks::{in_check, is_square_attacked, BISHOP_DELTAS, KING_DELTAS, KNIGHT_DELTAS, ROOK_DELTAS};
use crate::moves::types::{
    Move, MoveBuffer, CAPTURE, DOUBLE_PAWN_PUSH, EN_PASSANT, KINGSIDE_CASTLE, PROMOTION,
    PROMOTION_CAPTURE, QUEENSIDE_CASTLE, QUIET_MOVE,
};
use crate::square::Square;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenMode {
    All,
    CapturesOnly,
    QuietsOnly,
}

pub fn generate_pseudo_legal(board: &Board, mode: GenMode, out: &mut impl MoveBuffer) {
    let side = board.side;
    let pieces: Vec<Square> = board.piece_list(side).to_vec();
    for from in pieces {
        let piece = board.piece_at(from);
        match piece.kind().unwrap() {
            PieceKind::Pawn => gen_pawn_moves(board, from, side, mode, out),
            PieceKind::Knight => gen_leaper(board, from, side, &KNIGHT_DELTAS, mode, out),
            PieceKind::King => gen_leaper(board, from, side, &KING_DELTAS, mode, out),
            PieceKind::Bishop => gen_slider(board, from, side, &BISHOP_DELTAS, mode, out),
            PieceKind::Rook => gen_slider(board, from, side, &ROOK_DELTAS, mode, out),
            PieceKind::Queen => {
                gen_slider(board, from, side, &BISHOP_DELTAS, mode, out);
                gen_slider(board, from, side, &ROOK_DELTAS, mode, out);
            }
        }
    }
    if mode != GenMode::CapturesOnly {
        gen_castling(board, side, out);
    }
}

fn gen_leaper(board: &Board, from: Square, side: Color, deltas: &[i16], mode: GenMode, out: &mut impl MoveBuffer) {
    let piece = board.piece_at(from);
    for &d in deltas {
        let to = from.offset(d);
        if !to.is_valid() {
            continue;
        }
        let target = board.piece_at(to);
        if target.is_none() {
            if mode != GenMode::CapturesOnly {
                out.push(Move { from, to, piece, promotion: None, flags: QUIET_MOVE });
            }
        } else if target.is_color(side.opposite()) && mode != GenMode::QuietsOnly {
            out.push(Move { from, to, piece, promotion: None, flags: CAPTURE });
        }
    }
}

fn gen_slider(board: &Board, from: Square, side: Color, deltas: &[i16], mode: GenMode, out: &mut impl MoveBuffer) {
    let piece = board.piece_at(from);
    for &d in deltas {
        let mut to = from.offset(d);
        while to.is_valid() {
            let target = board.piece_at(to);
            if target.is_none() {
                if mode != GenMode::CapturesOnly {
                    out.push(Move { from, to, piece, promotion: None, flags: QUIET_MOVE });
                }
            } else {
                if target.is_color(side.opposite()) && mode != GenMode::QuietsOnly {
                    out.push(Move { from, to, piece, promotion: None, flags: CAPTURE });
                }
                break;
            }
            to = to.offset(d);
        }
    }
}

const PROMO_KINDS: [PieceKind; 4] = [PieceKind::Queen, PieceKind::Rook, PieceKind::Bishop, PieceKind::Knight];

fn gen_pawn_moves(board: &Board, from: Square, side: Color, mode: GenMode, out: &mut impl MoveBuffer) {
    let piece = board.piece_at(from);
    let (push, start_rank, promo_rank) = match side {
        Color::White => (-16i16, 1u8, 7u8),
        Color::Black => (16i16, 6u8, 0u8),
    };

    if mode != GenMode::CapturesOnly {
        let one = from.offset(push);
        if one.is_valid() && board.is_empty(one) {
            push_pawn_move(from, one, piece, promo_rank, QUIET_MOVE, PROMOTION, out);
            if from.rank() == start_rank {
                let two = one.offset(push);
                if two.is_valid() && board.is_empty(two) {
                    out.push(Move { from, to: two, piece, promotion: None, flags: DOUBLE_PAWN_PUSH });
                }
            }
        }
    }

    if mode != GenMode::QuietsOnly {
        for &d in &[push - 1, push + 1] {
            let to = from.offset(d);
            if !to.is_valid() {
                continue;
            }
            if to == board.ep_square {
                out.push(Move { from, to, piece, promotion: None, flags: EN_PASSANT });
                continue;
            }
            let target = board.piece_at(to);
            if target.is_color(side.opposite()) {
                push_pawn_move(from, to, piece, promo_rank, CAPTURE, PROMOTION_CAPTURE, out);
            }
        }
    }
}

fn push_pawn_move(
    from: Square,
    to: Square,
    piece: crate::board::Piece,
    promo_rank: u8,
    plain_flag: u8,
    promo_flag: u8,
    out: &mut impl MoveBuffer,
) {
    if to.rank() == promo_rank {
        for &kind in &PROMO_KINDS {
            out.push(Move { from, to, piece, promotion: Some(kind), flags: promo_flag });
        }
    } else {
        out.push(Move { from, to, piece, promotion: None, flags: plain_flag });
    }
}

fn gen_castling(board: &Board, side: Color, out: &mut impl MoveBuffer) {
    let king = board.king_square(side);
    let opp = side.opposite();
    let (kflag, qflag, rank) = match side {
        Color::White => (CASTLE_WK, CASTLE_WQ, 0u8),
        Color::Black => (CASTLE_BK, CASTLE_BQ, 7u8),
    };
    let piece = board.piece_at(king);

    if board.has_castling(kflag) {
        let f = Square::from_rank_file(rank, 5);
        let g = Square::from_rank_file(rank, 6);
        if board.is_empty(f) && board.is_empty(g) {
            let e = Square::from_rank_file(rank, 4);
            if !is_square_attacked(board, e, opp)
                && !is_square_attacked(board, f, opp)
                && !is_square_attacked(board, g, opp)
            {
                out.push(Move { from: king, to: g, piece, promotion: None, flags: KINGSIDE_CASTLE });
            }
        }
    }
    if board.has_castling(qflag) {
        let d = Square::from_rank_file(rank, 3);
        let c = Square::from_rank_file(rank, 2);
        let b = Square::from_rank_file(rank, 1);
        if board.is_empty(d) && board.is_empty(c) && board.is_empty(b) {
            let e = Square::from_rank_file(rank, 4);
            if !is_square_attacked(board, e, opp)
                && !is_square_attacked(board, d, opp)
                && !is_square_attacked(board, c, opp)
            {
                out.push(Move { from: king, to: c, piece, promotion: None, flags: QUEENSIDE_CASTLE });
            }
        }
    }
}

/// Filters pseudo-legal moves down to legal ones by making and immediately
/// testing for self-check. Simple and correct; `search` uses the cheaper
/// in-check/pin fast path from `legal.rs` instead of calling this directly.
pub fn generate_legal(board: &mut Board, keys: &crate::hash::ZobristKeys, out: &mut impl MoveBuffer) {
    let mut pseudo: Vec<Move> = Vec::with_capacity(64);
    generate_pseudo_legal(board, GenMode::All, &mut pseudo);
    let side = board.side;
    for mv in pseudo {
        let undo = crate::moves::execute::make_move(board, keys, mv);
        if !in_check(board, side) {
            out.push(mv);
        }
        crate::moves::execute::unmake_move(board, undo);
    }
}
