use crate::board::{DIAGONALS, KING_DELTAS, KNIGHT_DELTAS, ORTHOGONALS, Position};
use crate::types::*;

const PROMOTIONS: [PieceKind; 4] = [
    PieceKind::Queen,
    PieceKind::Rook,
    PieceKind::Bishop,
    PieceKind::Knight,
];

/// Generate all legal moves for the side to move, in board order (a1 first)
/// and per-piece direction order. Callers rely on this order being stable.
pub fn legal_moves(pos: &Position) -> Vec<Move> {
    let mut tmp = pos.clone();
    let mut out = Vec::with_capacity(64);
    legal_moves_into(&mut tmp, &mut out);
    out
}

/// Generate all legal moves into the provided buffer, reusing it across calls.
/// `pos` is played on and restored, so it is unchanged on return.
pub fn legal_moves_into(pos: &mut Position, out: &mut Vec<Move>) {
    out.clear();
    pseudo_moves(pos, out);

    let mover = pos.side_to_move;
    out.retain(|&mv| {
        let undo = pos.make_move(mv);
        let illegal = pos.in_check(mover);
        pos.unmake_move(mv, undo);
        !illegal
    });
}

fn pseudo_moves(pos: &Position, out: &mut Vec<Move>) {
    let c = pos.side_to_move;
    for (sq, pc) in pos.pieces() {
        if pc.color != c {
            continue;
        }
        match pc.kind {
            PieceKind::Pawn => gen_pawn(pos, sq, c, out),
            PieceKind::Knight => gen_steps(pos, sq, c, out, &KNIGHT_DELTAS),
            PieceKind::Bishop => gen_slider(pos, sq, c, out, &DIAGONALS),
            PieceKind::Rook => gen_slider(pos, sq, c, out, &ORTHOGONALS),
            PieceKind::Queen => {
                gen_slider(pos, sq, c, out, &DIAGONALS);
                gen_slider(pos, sq, c, out, &ORTHOGONALS);
            }
            PieceKind::King => {
                gen_steps(pos, sq, c, out, &KING_DELTAS);
                gen_castle(pos, sq, c, out);
            }
        }
    }
}

/// Push `from -> to` if the target is empty or holds an enemy piece.
/// Returns whether a slider may keep going past `to`.
fn push_target(pos: &Position, from: u8, to: u8, c: Color, out: &mut Vec<Move>) -> bool {
    match pos.piece_at(to) {
        None => {
            out.push(Move::new(from, to));
            true
        }
        Some(pc) if pc.color != c => {
            out.push(Move::capture(from, to, pc.kind));
            false
        }
        _ => false,
    }
}

fn push_pawn_move(from: u8, to: u8, captured: Option<PieceKind>, promotes: bool, out: &mut Vec<Move>) {
    let base = Move {
        captured,
        ..Move::new(from, to)
    };
    if promotes {
        for pk in PROMOTIONS {
            out.push(Move {
                promo: Some(pk),
                ..base
            });
        }
    } else {
        out.push(base);
    }
}

fn gen_pawn(pos: &Position, from: u8, c: Color, out: &mut Vec<Move>) {
    let f = file_of(from);
    let r = rank_of(from);
    let (dir, start_rank, promo_rank): (i8, i8, i8) = match c {
        Color::White => (1, 1, 7),
        Color::Black => (-1, 6, 0),
    };

    if let Some(to) = sq(f, r + dir)
        && pos.piece_at(to).is_none()
    {
        push_pawn_move(from, to, None, rank_of(to) == promo_rank, out);
        if r == start_rank
            && let Some(to2) = sq(f, r + 2 * dir)
            && pos.piece_at(to2).is_none()
        {
            out.push(Move::new(from, to2));
        }
    }

    for df in [-1, 1] {
        let Some(to) = sq(f + df, r + dir) else {
            continue;
        };
        match pos.piece_at(to) {
            Some(tpc) if tpc.color != c => {
                push_pawn_move(from, to, Some(tpc.kind), rank_of(to) == promo_rank, out);
            }
            None if pos.en_passant == Some(to) => out.push(Move {
                is_en_passant: true,
                ..Move::capture(from, to, PieceKind::Pawn)
            }),
            _ => {}
        }
    }
}

fn gen_steps(pos: &Position, from: u8, c: Color, out: &mut Vec<Move>, deltas: &[(i8, i8)]) {
    let f = file_of(from);
    let r = rank_of(from);
    for (df, dr) in deltas {
        if let Some(to) = sq(f + df, r + dr) {
            push_target(pos, from, to, c, out);
        }
    }
}

fn gen_slider(pos: &Position, from: u8, c: Color, out: &mut Vec<Move>, dirs: &[(i8, i8)]) {
    let f0 = file_of(from);
    let r0 = rank_of(from);
    for (df, dr) in dirs {
        let mut f = f0 + df;
        let mut r = r0 + dr;
        while let Some(to) = sq(f, r) {
            if !push_target(pos, from, to, c, out) {
                break;
            }
            f += df;
            r += dr;
        }
    }
}

fn gen_castle(pos: &Position, from: u8, c: Color, out: &mut Vec<Move>) {
    // (king_from, king_to, right, squares that must be empty, squares that must not be attacked)
    let options: [(u8, u8, bool, &[u8], [u8; 2]); 2] = match c {
        Color::White => [
            (4, 6, pos.castling.wk, &[5, 6], [5, 6]),
            (4, 2, pos.castling.wq, &[1, 2, 3], [3, 2]),
        ],
        Color::Black => [
            (60, 62, pos.castling.bk, &[61, 62], [61, 62]),
            (60, 58, pos.castling.bq, &[57, 58, 59], [59, 58]),
        ],
    };
    let enemy = c.other();
    if pos.in_check(c) {
        return;
    }
    for (king_from, king_to, right, empty, safe) in options {
        if !right || from != king_from {
            continue;
        }
        let rook_home = if king_to > king_from {
            king_from + 3
        } else {
            king_from - 4
        };
        let rook_ok = pos.piece_at(rook_home) == Some(Piece::new(c, PieceKind::Rook));
        if rook_ok
            && empty.iter().all(|&s| pos.piece_at(s).is_none())
            && safe.iter().all(|&s| !pos.is_square_attacked(s, enemy))
        {
            out.push(Move {
                is_castle: true,
                ..Move::new(king_from, king_to)
            });
        }
    }
}
