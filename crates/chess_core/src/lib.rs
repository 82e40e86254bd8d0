//! Chess rules for the coach: positions, FEN, legal move generation.
//!
//! The challenge engine treats this crate as its rules collaborator. Nothing
//! outside it can edit a [`Position`] in place; every change is a successor
//! returned by [`Position::apply_move`], and "what if the other side were to
//! move" questions go through [`Position::with_turn`].

pub mod board;
pub mod fen;
pub mod movegen;
pub mod types;


pub use board::{CastlingRights, IllegalMove, Position};
pub use fen::FenError;
pub use movegen::{legal_moves, legal_moves_into};
pub use types::*;
