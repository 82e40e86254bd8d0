//! Forsyth-Edwards Notation in and out.
//!
//! Parsing is strict: challenge positions are authored by hand, so a typo
//! should surface as an error at load time rather than as a half-built board.

use crate::board::{CastlingRights, Position};
use crate::types::*;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FenError {
    #[error("expected at least 4 space-separated fields, found {0}")]
    FieldCount(usize),
    #[error("expected 8 ranks in the board field, found {0}")]
    RankCount(usize),
    #[error("invalid piece character '{0}'")]
    BadPiece(char),
    #[error("rank {rank} does not describe exactly 8 files")]
    RankWidth { rank: u8 },
    #[error("invalid side to move '{0}'")]
    SideToMove(String),
    #[error("invalid castling character '{0}'")]
    Castling(char),
    #[error("invalid en-passant square '{0}'")]
    EnPassant(String),
    #[error("en-passant square '{0}' does not follow a double pawn push")]
    EnPassantTarget(String),
    #[error("invalid move counter '{0}'")]
    Counter(String),
    #[error("{color:?} has {count} kings, expected exactly one")]
    KingCount { color: Color, count: usize },
    #[error("the side not to move is in check")]
    OpponentInCheck,
}

impl Position {
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let parts: Vec<&str> = fen.split_whitespace().collect();
        if parts.len() < 4 {
            return Err(FenError::FieldCount(parts.len()));
        }

        let side_to_move = match parts[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(FenError::SideToMove(other.to_string())),
        };
        let mut pos = Position::empty(side_to_move);

        let ranks: Vec<&str> = parts[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::RankCount(ranks.len()));
        }
        for (rank_idx, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - rank_idx as i8; // FEN lists rank 8 .. 1
            let width_err = FenError::RankWidth {
                rank: rank as u8 + 1,
            };
            let mut file: i8 = 0;
            for ch in rank_str.chars() {
                if let Some(d) = ch.to_digit(10) {
                    if d == 0 || d > 8 {
                        return Err(width_err);
                    }
                    file += d as i8;
                } else {
                    let kind = PieceKind::from_char(ch).ok_or(FenError::BadPiece(ch))?;
                    let color = if ch.is_ascii_uppercase() {
                        Color::White
                    } else {
                        Color::Black
                    };
                    let s = sq(file, rank).ok_or_else(|| width_err.clone())?;
                    pos.set_piece(s, Some(Piece::new(color, kind)));
                    file += 1;
                }
                if file > 8 {
                    return Err(width_err);
                }
            }
            if file != 8 {
                return Err(width_err);
            }
        }

        let mut castling = CastlingRights::none();
        if parts[2] != "-" {
            for c in parts[2].chars() {
                match c {
                    'K' => castling.wk = true,
                    'Q' => castling.wq = true,
                    'k' => castling.bk = true,
                    'q' => castling.bq = true,
                    _ => return Err(FenError::Castling(c)),
                }
            }
        }
        pos.castling = castling;

        pos.en_passant = match parts[3] {
            "-" => None,
            s => {
                let ep = coord_to_sq(s).ok_or_else(|| FenError::EnPassant(s.to_string()))?;
                if !follows_double_push(&pos, ep) {
                    return Err(FenError::EnPassantTarget(s.to_string()));
                }
                Some(ep)
            }
        };

        let counter = |s: &str| s.parse::<u32>().map_err(|_| FenError::Counter(s.to_string()));
        pos.halfmove_clock = parts.get(4).map_or(Ok(0), |s| counter(s))?;
        pos.fullmove_number = parts.get(5).map_or(Ok(1), |s| counter(s))?;

        for color in [Color::White, Color::Black] {
            let count = pos
                .pieces()
                .filter(|(_, pc)| pc.color == color && pc.kind == PieceKind::King)
                .count();
            if count != 1 {
                return Err(FenError::KingCount { color, count });
            }
        }
        if pos.in_check(side_to_move.other()) {
            return Err(FenError::OpponentInCheck);
        }

        Ok(pos)
    }

    pub fn to_fen(&self) -> String {
        let mut out = String::with_capacity(64);
        for rank in (0..8i8).rev() {
            let mut empty = 0;
            for file in 0..8i8 {
                let s = (rank as u8) * 8 + file as u8;
                match self.piece_at(s) {
                    Some(pc) => {
                        if empty > 0 {
                            out.push(char::from(b'0' + empty));
                            empty = 0;
                        }
                        out.push(pc.fen_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                out.push(char::from(b'0' + empty));
            }
            if rank > 0 {
                out.push('/');
            }
        }

        out.push(' ');
        out.push(self.side_to_move.fen_char());

        out.push(' ');
        let c = &self.castling;
        let rights: String = [(c.wk, 'K'), (c.wq, 'Q'), (c.bk, 'k'), (c.bq, 'q')]
            .iter()
            .filter(|(on, _)| *on)
            .map(|(_, ch)| *ch)
            .collect();
        out.push_str(if rights.is_empty() { "-" } else { &rights });

        out.push(' ');
        match self.en_passant {
            Some(s) => out.push_str(&sq_to_coord(s)),
            None => out.push('-'),
        }

        out.push_str(&format!(" {} {}", self.halfmove_clock, self.fullmove_number));
        out
    }
}

/// `ep` is the square a pawn of the side not to move just skipped: third
/// rank from that side, empty, the pawn directly beyond it and its start
/// square vacated. Anything else would let en passant remove a stray piece.
fn follows_double_push(pos: &Position, ep: u8) -> bool {
    let (ep_rank, toward_pawn): (i8, i8) = match pos.side_to_move {
        Color::White => (5, -1),
        Color::Black => (2, 1),
    };
    let (f, r) = (file_of(ep), rank_of(ep));
    let pusher = Piece::new(pos.side_to_move.other(), PieceKind::Pawn);
    r == ep_rank
        && pos.piece_at(ep).is_none()
        && sq(f, r + toward_pawn).and_then(|s| pos.piece_at(s)) == Some(pusher)
        && sq(f, r - toward_pawn).is_some_and(|s| pos.piece_at(s).is_none())
}

impl std::str::FromStr for Position {
    type Err = FenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Position::from_fen(s)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_fen())
    }
}
