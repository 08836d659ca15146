// Cheap in-check / pin detection used by `search` as a fast path before
// falling back to full make+unmake legality testing (`movegen::generate_legal`).

use crate::board::{Board, Color, PieceKind};
use crate::moves::attacks::{BISHOP_DELTAS, KNIGHT_DELTAS, ROOK_DELTAS};
use crate::square::Square;
use arrayvec::ArrayVec;

#[derive(Debug, Clone, Copy)]
pub struct Pin {
    pub square: Square,
    pub ray: i16,
}

#[derive(Debug, Clone)]
pub struct LegalInfo {
    pub in_check: bool,
    pub checkers: ArrayVec<Square, 2>,
    pub pins: ArrayVec<Pin, 8>,
}

fn pawn_attack_deltas(color: Color) -> [i16; 2] {
    match color {
        Color::White => [15, 17],
        Color::Black => [-15, -17],
    }
}

pub fn compute_legal_info(board: &Board, side: Color) -> LegalInfo {
    let king_sq = board.king_square(side);
    let enemy = side.opposite();
    let mut checkers = ArrayVec::new();

    for &d in &KNIGHT_DELTAS {
        let from = king_sq.offset(d);
        if from.is_valid() {
            let p = board.piece_at(from);
            if p.is_color(enemy) && p.kind() == Some(PieceKind::Knight) && !checkers.is_full() {
                checkers.push(from);
            }
        }
    }
    for &d in &pawn_attack_deltas(enemy.opposite()) {
        let from = king_sq.offset(-d);
        if from.is_valid() {
            let p = board.piece_at(from);
            if p.is_color(enemy) && p.kind() == Some(PieceKind::Pawn) && !checkers.is_full() {
                checkers.push(from);
            }
        }
    }

    let mut pins = ArrayVec::new();
    for &d in BISHOP_DELTAS.iter().chain(ROOK_DELTAS.iter()) {
        let is_diagonal = BISHOP_DELTAS.contains(&d);
        let mut cur = king_sq.offset(d);
        let mut own_blocker: Option<Square> = None;
        loop {
            if !cur.is_valid() {
                break;
            }
            let p = board.piece_at(cur);
            if p.is_none() {
                cur = cur.offset(d);
                continue;
            }
            if p.is_color(side) {
                if own_blocker.is_some() {
                    break;
                }
                own_blocker = Some(cur);
                cur = cur.offset(d);
                continue;
            }
            // enemy piece: does it slide along this ray?
            let slides = match p.kind() {
                Some(PieceKind::Queen) => true,
                Some(PieceKind::Bishop) => is_diagonal,
                Some(PieceKind::Rook) => !is_diagonal,
                _ => false,
            };
            if slides {
                if let Some(blocker) = own_blocker {
                    if !pins.is_full() {
                        pins.push(Pin { square: blocker, ray: d });
                    }
                } else if !checkers.is_full() {
                    checkers.push(cur);
                }
            }
            break;
        }
    }

    LegalInfo { in_check: !checkers.is_empty(), checkers, pins }
}

/// A pinned piece may only move along the ray connecting it to its king
/// (toward or away from the attacker); anything else exposes the king.
pub fn pin_allows(pins: &[Pin], from: Square, to: Square) -> bool {
    for pin in pins {
        if pin.square == from {
            return is_collinear(from, to, pin.ray);
        }
    }
    true
}

fn is_collinear(from: Square, to: Square, ray: i16) -> bool {
    let mut cur = from;
    loop {
        cur = cur.offset(ray);
        if !cur.is_valid() {
            break;
        }
        if cur == to {
            return true;
        }
    }
    let mut cur = from;
    loop {
        cur = cur.offset(-ray);
        if !cur.is_valid() {
            break;
        }
        if cur == to {
            return true;
        }
    }
    false
}
