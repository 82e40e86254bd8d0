use crate::movegen::{legal_moves, legal_moves_into};
use crate::types::*;
use thiserror::Error;

/// Returned by [`Position::apply_move`] when the move is not in the legal list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("illegal move {}", coords(.from, .to))]
pub struct IllegalMove {
    pub from: u8,
    pub to: u8,
}

fn coords(from: &u8, to: &u8) -> String {
    format!("{}{}", sq_to_coord(*from), sq_to_coord(*to))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CastlingRights {
    pub wk: bool,
    pub wq: bool,
    pub bk: bool,
    pub bq: bool,
}

impl CastlingRights {
    pub fn none() -> Self {
        Self {
            wk: false,
            wq: false,
            bk: false,
            bq: false,
        }
    }
}

/// A chess position. Fields are crate-private: outside this crate a position
/// only changes by producing a successor through [`Position::apply_move`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Position {
    pub(crate) board: [Option<Piece>; 64],
    pub(crate) side_to_move: Color,
    pub(crate) castling: CastlingRights,
    pub(crate) en_passant: Option<u8>, // square behind a pawn that just advanced 2
    pub(crate) halfmove_clock: u32,
    pub(crate) fullmove_number: u32,
}

#[derive(Clone, Debug)]
pub(crate) struct Undo {
    captured: Option<Piece>,
    castling: CastlingRights,
    en_passant: Option<u8>,
    halfmove_clock: u32,
    fullmove_number: u32,
    moved_piece: Piece,
    rook_move: Option<(u8, u8)>, // (rook_from, rook_to) for castling
    ep_captured_sq: Option<u8>,  // square actually captured in en-passant
}

impl Position {
    pub fn startpos() -> Self {
        Self::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1")
            .expect("start position FEN is valid")
    }

    pub(crate) fn empty(side_to_move: Color) -> Self {
        Position {
            board: [None; 64],
            side_to_move,
            castling: CastlingRights::none(),
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    /// The piece on `sq`, or `None` for an empty or off-board index.
    pub fn piece_at(&self, sq: u8) -> Option<Piece> {
        self.board.get(sq as usize).copied().flatten()
    }

    /// Every occupied square with its piece, a1 first.
    pub fn pieces(&self) -> impl Iterator<Item = (u8, Piece)> + '_ {
        self.board
            .iter()
            .enumerate()
            .filter_map(|(i, pc)| pc.map(|p| (i as u8, p)))
    }

    pub fn king_sq(&self, c: Color) -> Option<u8> {
        self.pieces()
            .find(|(_, pc)| pc.color == c && pc.kind == PieceKind::King)
            .map(|(s, _)| s)
    }

    /// Clone of this position with `color` to move.
    ///
    /// The board and castling rights are kept as they are. The en-passant
    /// square is dropped because it only ever belongs to the real side to
    /// move. Legal moves generated from the result answer "what could
    /// `color` do here if it were their turn", which is what defence and
    /// attack probes need.
    pub fn with_turn(&self, color: Color) -> Position {
        let mut p = self.clone();
        if p.side_to_move != color {
            p.side_to_move = color;
            p.en_passant = None;
        }
        p
    }

    /// Clone of this position with one square replaced. Used for
    /// hypothetical probes; the result is never played on.
    pub fn with_piece(&self, sq: u8, pc: Option<Piece>) -> Position {
        let mut p = self.clone();
        p.set_piece(sq, pc);
        p
    }

    pub fn legal_moves(&self) -> Vec<Move> {
        legal_moves(self)
    }

    /// Legal moves of the side to move that start on `from`.
    pub fn legal_moves_from(&self, from: u8) -> Vec<Move> {
        match self.piece_at(from) {
            Some(pc) if pc.color == self.side_to_move => {
                let mut moves = legal_moves(self);
                moves.retain(|m| m.from == from);
                moves
            }
            _ => Vec::new(),
        }
    }

    pub fn has_legal_moves(&self) -> bool {
        let mut tmp = self.clone();
        let mut out = Vec::with_capacity(64);
        legal_moves_into(&mut tmp, &mut out);
        !out.is_empty()
    }

    /// Resolve a from/to pair against the legal list. Promotions default to
    /// a queen, which is the first promotion the generator emits.
    pub fn find_move(&self, from: u8, to: u8) -> Option<Move> {
        self.find_promotion(from, to, None)
    }

    /// Like [`find_move`](Self::find_move), but a `Some` promotion must match
    /// exactly, so `promo` on a non-promoting move finds nothing.
    pub fn find_promotion(&self, from: u8, to: u8, promo: Option<PieceKind>) -> Option<Move> {
        legal_moves(self)
            .into_iter()
            .find(|m| m.from == from && m.to == to && (promo.is_none() || m.promo == promo))
    }

    /// Parse a long-algebraic move (`e2e4`, `e7e8n`) against this position.
    pub fn parse_uci_move(&self, txt: &str) -> Option<Move> {
        let txt = txt.trim();
        if txt.len() < 4 || !txt.is_ascii() {
            return None;
        }
        let from = coord_to_sq(&txt[0..2])?;
        let to = coord_to_sq(&txt[2..4])?;
        let promo = match txt.chars().nth(4) {
            Some(ch) => Some(PieceKind::from_char(ch)?),
            None => None,
        };
        self.find_promotion(from, to, promo)
    }

    /// Play `mv` and return the successor position. The move is looked up in
    /// the legal list, so flags on the caller's copy (castle, en passant,
    /// captured) do not have to be right; only from, to and promotion count.
    pub fn apply_move(&self, mv: Move) -> Result<Position, IllegalMove> {
        let legal = legal_moves(self).into_iter().find(|m| {
            m.from == mv.from && m.to == mv.to && (mv.promo.is_none() || m.promo == mv.promo)
        });
        match legal {
            Some(m) => {
                let mut next = self.clone();
                next.make_move(m);
                Ok(next)
            }
            None => Err(IllegalMove {
                from: mv.from,
                to: mv.to,
            }),
        }
    }

    pub(crate) fn set_piece(&mut self, sq: u8, pc: Option<Piece>) {
        self.board[sq as usize] = pc;
    }

    pub fn in_check(&self, c: Color) -> bool {
        match self.king_sq(c) {
            Some(ksq) => self.is_square_attacked(ksq, c.other()),
            None => false,
        }
    }

    pub fn is_checkmate(&self) -> bool {
        self.in_check(self.side_to_move) && !self.has_legal_moves()
    }

    pub fn is_stalemate(&self) -> bool {
        !self.in_check(self.side_to_move) && !self.has_legal_moves()
    }

    /// Pseudo-attack test: does any `by` piece hit `target`, ignoring pins.
    /// Used for check detection; the legality-aware question lives on top of
    /// [`Position::with_turn`].
    pub fn is_square_attacked(&self, target: u8, by: Color) -> bool {
        let tf = file_of(target);
        let tr = rank_of(target);
        let hits = |s: Option<u8>, kinds: &[PieceKind]| {
            s.and_then(|s| self.piece_at(s))
                .is_some_and(|pc| pc.color == by && kinds.contains(&pc.kind))
        };

        // A white pawn attacks upward, so it sits one rank below its target.
        let pawn_dr: i8 = match by {
            Color::White => -1,
            Color::Black => 1,
        };
        for df in [-1, 1] {
            if hits(sq(tf + df, tr + pawn_dr), &[PieceKind::Pawn]) {
                return true;
            }
        }
        for (df, dr) in KNIGHT_DELTAS {
            if hits(sq(tf + df, tr + dr), &[PieceKind::Knight]) {
                return true;
            }
        }
        for (df, dr) in KING_DELTAS {
            if hits(sq(tf + df, tr + dr), &[PieceKind::King]) {
                return true;
            }
        }

        let rays: [(&[(i8, i8)], [PieceKind; 2]); 2] = [
            (&DIAGONALS, [PieceKind::Bishop, PieceKind::Queen]),
            (&ORTHOGONALS, [PieceKind::Rook, PieceKind::Queen]),
        ];
        for (dirs, sliders) in rays {
            for (df, dr) in dirs {
                let mut f = tf + df;
                let mut r = tr + dr;
                while let Some(s) = sq(f, r) {
                    if let Some(pc) = self.piece_at(s) {
                        if pc.color == by && sliders.contains(&pc.kind) {
                            return true;
                        }
                        break;
                    }
                    f += df;
                    r += dr;
                }
            }
        }

        false
    }

    pub(crate) fn make_move(&mut self, mv: Move) -> Undo {
        let from = mv.from;
        let to = mv.to;
        let moved = self.piece_at(from).expect("no piece on from-square");
        let mut captured = self.piece_at(to);
        let prev_castling = self.castling.clone();
        let prev_ep = self.en_passant;
        let prev_hmc = self.halfmove_clock;
        let prev_fmn = self.fullmove_number;

        self.en_passant = None;
        let mut reset_hmc = moved.kind == PieceKind::Pawn || captured.is_some();

        let mut ep_captured_sq = None;
        if mv.is_en_passant {
            let dir = match moved.color {
                Color::White => -1,
                Color::Black => 1,
            };
            if let Some(cs) = sq(file_of(to), rank_of(to) + dir) {
                captured = self.piece_at(cs);
                self.set_piece(cs, None);
                ep_captured_sq = Some(cs);
                reset_hmc = true;
            }
        }

        self.set_piece(from, None);
        self.set_piece(to, Some(moved));

        if moved.kind == PieceKind::Pawn {
            let r = rank_of(to);
            if (moved.color == Color::White && r == 7) || (moved.color == Color::Black && r == 0) {
                let promo = mv.promo.unwrap_or(PieceKind::Queen);
                self.set_piece(to, Some(Piece::new(moved.color, promo)));
            }
        }

        let mut rook_move = None;
        if mv.is_castle && moved.kind == PieceKind::King {
            let rook_squares = match (moved.color, from, to) {
                (Color::White, 4, 6) => Some((7, 5)),
                (Color::White, 4, 2) => Some((0, 3)),
                (Color::Black, 60, 62) => Some((63, 61)),
                (Color::Black, 60, 58) => Some((56, 59)),
                _ => None,
            };
            if let Some((rf, rt)) = rook_squares {
                let rook = self.piece_at(rf);
                self.set_piece(rf, None);
                self.set_piece(rt, rook);
                rook_move = Some((rf, rt));
            }
        }

        // Castling rights go with king moves, rook moves, and rooks captured at home.
        for s in [from, to] {
            match s {
                0 => self.castling.wq = false,
                7 => self.castling.wk = false,
                56 => self.castling.bq = false,
                63 => self.castling.bk = false,
                _ => {}
            }
        }
        if moved.kind == PieceKind::King {
            match moved.color {
                Color::White => {
                    self.castling.wk = false;
                    self.castling.wq = false;
                }
                Color::Black => {
                    self.castling.bk = false;
                    self.castling.bq = false;
                }
            }
        }

        if moved.kind == PieceKind::Pawn && (rank_of(from) - rank_of(to)).abs() == 2 {
            self.en_passant = sq(file_of(from), (rank_of(from) + rank_of(to)) / 2);
        }

        self.halfmove_clock = if reset_hmc {
            0
        } else {
            self.halfmove_clock + 1
        };
        if self.side_to_move == Color::Black {
            self.fullmove_number += 1;
        }
        self.side_to_move = self.side_to_move.other();

        Undo {
            captured,
            castling: prev_castling,
            en_passant: prev_ep,
            halfmove_clock: prev_hmc,
            fullmove_number: prev_fmn,
            moved_piece: moved,
            rook_move,
            ep_captured_sq,
        }
    }

    pub(crate) fn unmake_move(&mut self, mv: Move, undo: Undo) {
        self.side_to_move = self.side_to_move.other();
        self.castling = undo.castling;
        self.en_passant = undo.en_passant;
        self.halfmove_clock = undo.halfmove_clock;
        self.fullmove_number = undo.fullmove_number;

        if let Some((rf, rt)) = undo.rook_move {
            let rook = self.piece_at(rt);
            self.set_piece(rt, None);
            self.set_piece(rf, rook);
        }

        // The moved piece goes back as it was, which also undoes promotion.
        self.set_piece(mv.to, None);
        self.set_piece(mv.from, Some(undo.moved_piece));

        match undo.ep_captured_sq {
            Some(cs) => self.set_piece(cs, undo.captured),
            None => self.set_piece(mv.to, undo.captured),
        }
    }
}

pub(crate) const KNIGHT_DELTAS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (-1, 2),
    (-2, 1),
    (1, -2),
    (2, -1),
    (-1, -2),
    (-2, -1),
];
pub(crate) const KING_DELTAS: [(i8, i8); 8] = [
    (1, 1),
    (1, 0),
    (1, -1),
    (0, 1),
    (0, -1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];
pub(crate) const DIAGONALS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
pub(crate) const ORTHOGONALS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
