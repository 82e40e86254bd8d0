//! FEN parsing and printing.

use chess_core::{Color, FenError, Position};

#[test]
fn startpos_prints_the_standard_fen() {
    assert_eq!(
        Position::startpos().to_fen(),
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
    );
}

#[test]
fn challenge_positions_survive_a_round_trip() {
    for fen in [
        "3qk3/ppp5/8/8/8/8/PPP5/3QK3 w - - 0 1",
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        "4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 7",
    ] {
        let pos: Position = fen.parse().unwrap();
        assert_eq!(pos.to_fen(), fen);
    }
}

#[test]
fn missing_counters_default() {
    let pos = Position::from_fen("4k3/8/8/8/8/8/8/4K3 b - -").unwrap();
    assert_eq!(pos.to_fen(), "4k3/8/8/8/8/8/8/4K3 b - - 0 1");
    assert_eq!(pos.side_to_move(), Color::Black);
}

#[test]
fn malformed_positions_are_rejected() {
    assert_eq!(
        Position::from_fen("4k3/8/8/8/8/8/8/4K3"),
        Err(FenError::FieldCount(1))
    );
    assert_eq!(
        Position::from_fen("4k3/8/8/8/8/8/4K3 w - - 0 1"),
        Err(FenError::RankCount(7))
    );
    assert_eq!(
        Position::from_fen("4k3/8/8/8/8/8/8/4X3 w - - 0 1"),
        Err(FenError::BadPiece('X'))
    );
    assert_eq!(
        Position::from_fen("4k4/8/8/8/8/8/8/4K3 w - - 0 1"),
        Err(FenError::RankWidth { rank: 8 })
    );
    assert_eq!(
        Position::from_fen("4k3/8/8/8/8/8/8/4K3 x - - 0 1"),
        Err(FenError::SideToMove("x".into()))
    );
    assert_eq!(
        Position::from_fen("4k3/8/8/8/8/8/8/4K3 w - - zero 1"),
        Err(FenError::Counter("zero".into()))
    );
}

#[test]
fn kings_are_required() {
    assert_eq!(
        Position::from_fen("8/8/8/8/8/8/8/4K3 w - - 0 1"),
        Err(FenError::KingCount {
            color: Color::Black,
            count: 0
        })
    );
    assert_eq!(
        Position::from_fen("4k3/8/8/8/8/8/8/K3K3 w - - 0 1"),
        Err(FenError::KingCount {
            color: Color::White,
            count: 2
        })
    );
}

#[test]
fn waiting_side_may_not_be_in_check() {
    assert_eq!(
        Position::from_fen("4k3/8/8/8/8/8/8/4R1K1 w - - 0 1"),
        Err(FenError::OpponentInCheck)
    );
}

#[test]
fn en_passant_square_must_follow_a_double_push() {
    // Wrong rank for the side to move: the king behind e3 would be "captured".
    assert_eq!(
        Position::from_fen("4k3/8/8/8/8/8/3PK3/8 w - e3 0 1"),
        Err(FenError::EnPassantTarget("e3".into()))
    );
    // Right rank, but no black pawn on d5.
    assert_eq!(
        Position::from_fen("4k3/8/8/8/4P3/8/8/4K3 w - d6 0 1"),
        Err(FenError::EnPassantTarget("d6".into()))
    );
    // The pawn cannot have come from d7 if d7 is occupied.
    assert_eq!(
        Position::from_fen("4k3/3p4/8/3pP3/8/8/8/4K3 w - d6 0 1"),
        Err(FenError::EnPassantTarget("d6".into()))
    );
    // Black to move after e2e4.
    assert!(Position::from_fen("4k3/8/8/8/4P3/8/8/4K3 b - e3 0 1").is_ok());
    assert_eq!(
        Position::from_fen("4k3/8/8/8/4P3/8/8/4K3 b - e6 0 1"),
        Err(FenError::EnPassantTarget("e6".into()))
    );
}
