//! Material evaluation and the blunder tests built on it.
//!
//! Everything here is a pure function of positions. "Attacked" and
//! "defended" are the same question asked from two sides: can a piece of
//! the given colour legally land on the square? The answer is computed on a
//! turn-override clone, so it holds whoever is actually to move.

use chess_core::{Color, Move, Piece, PieceKind, Position};

pub const QUEEN_VALUE: i32 = 9;

/// Material lost in a single ply that counts as a blunder.
pub const BLUNDER_SWING: i32 = 3;

pub fn piece_value(kind: PieceKind) -> i32 {
    match kind {
        PieceKind::Pawn => 1,
        PieceKind::Knight => 3,
        PieceKind::Bishop => 3,
        PieceKind::Rook => 5,
        PieceKind::Queen => QUEEN_VALUE,
        PieceKind::King => 0,
    }
}

pub fn material_for(pos: &Position, color: Color) -> i32 {
    pos.pieces()
        .filter(|(_, pc)| pc.color == color)
        .map(|(_, pc)| piece_value(pc.kind))
        .sum()
}

/// Signed material from `player`'s point of view.
pub fn material_score(pos: &Position, player: Color) -> i32 {
    material_for(pos, player) - material_for(pos, player.other())
}

/// Can a `by` piece legally move onto `square`, if `by` were to move?
///
/// The probe puts a stand-in enemy pawn on the square when it is empty or
/// holds one of `by`'s own pieces, so only capturing moves count: a pawn
/// push onto an empty square is not an attack, and a guarded piece is one
/// that could be recaptured on.
fn can_land_on(pos: &Position, square: u8, by: Color) -> bool {
    let mut probe = pos.with_turn(by);
    match probe.piece_at(square) {
        Some(pc) if pc.color != by => {}
        _ => probe = probe.with_piece(square, Some(Piece::new(by.other(), PieceKind::Pawn))),
    }
    probe.legal_moves().iter().any(|m| m.to == square)
}

/// True if some `by` piece could legally recapture on `square`.
pub fn is_square_defended(pos: &Position, square: u8, by: Color) -> bool {
    can_land_on(pos, square, by)
}

/// True if some `by` piece could legally capture on `square`.
pub fn is_square_attacked(pos: &Position, square: u8, by: Color) -> bool {
    can_land_on(pos, square, by)
}

/// `owner`'s piece on `square` can be taken and not taken back.
pub fn is_hanging(pos: &Position, square: u8, owner: Color) -> bool {
    is_square_attacked(pos, square, owner.other()) && !is_square_defended(pos, square, owner)
}

/// The player's queen move from `before` to `after` left her en prise.
///
/// All four must hold: the queen moved, she took less than a queen's worth,
/// nothing of the player's guards her new square, and the opponent has a
/// legal capture there.
pub fn is_queen_blunder(before: &Position, after: &Position, player: Color, mv: &Move) -> bool {
    let moved_queen = before.piece_at(mv.from) == Some(Piece::new(player, PieceKind::Queen));
    if !moved_queen {
        return false;
    }
    let taken = before
        .piece_at(mv.to)
        .filter(|pc| pc.color != player)
        .map_or(0, |pc| piece_value(pc.kind));
    taken < QUEEN_VALUE
        && !is_square_defended(after, mv.to, player)
        && is_square_attacked(after, mv.to, player.other())
}

/// A swing of `BLUNDER_SWING` or more against the evaluated side.
pub fn is_net_blunder(prev_score: i32, new_score: i32) -> bool {
    new_score <= prev_score - BLUNDER_SWING
}

/// The player's score once the opponent takes the most profitable capture
/// available in `after`.
///
/// A capture on a square the player can recapture on is charged the value
/// of the capturing piece. Captures that would lose material are ignored,
/// so the result is never above the plain material score.
pub fn exposed_score(after: &Position, player: Color) -> i32 {
    let opponent = player.other();
    let to_move = after.with_turn(opponent);
    let best_gain = to_move
        .legal_moves()
        .into_iter()
        .filter_map(|m| {
            let gain = piece_value(m.captured?);
            let capturer = to_move.piece_at(m.from)?;
            let next = to_move.apply_move(m).ok()?;
            let cost = if is_square_defended(&next, m.to, player) {
                piece_value(capturer.kind)
            } else {
                0
            };
            Some(gain - cost)
        })
        .max()
        .unwrap_or(0)
        .max(0);
    material_score(after, player) - best_gain
}
