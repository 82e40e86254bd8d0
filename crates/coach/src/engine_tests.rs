use super::bot::{BotProfile, Coach, Opponent, Scripted};
use super::config::{ChallengeConfig, Narrative, WinCondition, WinKind};
use super::engine::*;
use super::session::ChallengeSession;
use chess_core::{coord_to_sq, Color, Move, Piece, PieceKind, Position};
use std::sync::Arc;

const QUEEN_LESSON: &str = "3qk3/ppp5/8/8/8/8/PPP5/3QK3 w - - 0 1";

fn s(c: &str) -> u8 {
    coord_to_sq(c).unwrap()
}

fn narrative() -> Narrative {
    Narrative {
        title: "Test".into(),
        briefing: "Play.".into(),
        success: "Won.".into(),
        failure: "Lost.".into(),
        queen_blunder: None,
        timeout: None,
    }
}

fn config(level: u8, fen: &str, kind: WinKind, target: i32, max_plies: u32) -> ChallengeConfig {
    ChallengeConfig {
        id: "test".into(),
        level,
        fen: fen.into(),
        player: Color::White,
        opponent: BotProfile::Naive,
        win: WinCondition {
            kind,
            target,
            max_plies,
        },
        narrative: narrative(),
    }
}

fn queen_lesson() -> ChallengeConfig {
    config(0, QUEEN_LESSON, WinKind::Captures, 3, 15)
}

fn play(cfg: &ChallengeConfig, current: &Match, mv: &str, opp: &mut dyn Opponent) -> (Match, MoveResult) {
    attempt(cfg, current, s(&mv[0..2]), s(&mv[2..4]), opp)
}

/// Counts how often the engine asks it for a move.
struct Counting {
    calls: usize,
    inner: Scripted,
}

impl Opponent for Counting {
    fn reply(&mut self, pos: &Position, profile: BotProfile) -> Option<Move> {
        self.calls += 1;
        self.inner.reply(pos, profile)
    }
}

fn counting<const N: usize>(replies: [&str; N]) -> Counting {
    Counting {
        calls: 0,
        inner: Scripted::new(replies),
    }
}

#[test]
fn start_scores_the_opening_material() {
    let m = Match::start(&queen_lesson()).unwrap();
    assert_eq!(m.fen(), QUEEN_LESSON);
    assert_eq!(m.state, ChallengeState::default());

    let behind = config(1, "4k3/8/8/3q4/8/8/8/R3K3 w - - 0 1", WinKind::MaterialLead, 1, 5);
    assert_eq!(Match::start(&behind).unwrap().state.material_score, -4);
}

#[test]
fn accepted_move_gets_one_coach_reply() {
    let cfg = queen_lesson();
    let start = Match::start(&cfg).unwrap();
    let mut opp = counting(["e8f8"]);
    let (next, res) = play(&cfg, &start, "e1e2", &mut opp);

    assert!(res.accepted);
    assert_eq!(opp.calls, 1);
    assert_eq!(res.player_move.map(|m| m.to_uci()).as_deref(), Some("e1e2"));
    assert_eq!(res.player_fen.as_deref(), Some("3qk3/ppp5/8/8/8/8/PPP1K3/3Q4 b - - 1 1"));
    assert_eq!(res.bot_move.map(|m| m.to_uci()).as_deref(), Some("e8f8"));
    assert_eq!(res.final_fen(), Some(next.fen().as_str()));
    assert_eq!(next.state.moves_played, 1);
    assert!(next.is_player_turn(Color::White));
}

#[test]
fn illegal_move_is_a_no_op() {
    let cfg = queen_lesson();
    let start = Match::start(&cfg).unwrap();
    let mut opp = counting([]);
    let (next, res) = play(&cfg, &start, "e1e3", &mut opp);

    assert!(!res.accepted);
    assert_eq!(res.rejection, Some(Rejection::Illegal));
    assert_eq!(next, start);
    assert_eq!(res.state, start.state);
    assert_eq!(res.final_fen(), None);
    assert_eq!(opp.calls, 0);
}

#[test]
fn moving_on_the_coachs_turn_is_rejected() {
    let cfg = queen_lesson();
    let current = Match {
        position: Position::from_fen("3qk3/ppp5/8/8/8/8/PPP5/3QK3 b - - 0 1").unwrap(),
        state: ChallengeState::default(),
    };
    let mut opp = counting([]);
    let (next, res) = play(&cfg, &current, "d8d1", &mut opp);
    assert_eq!(res.rejection, Some(Rejection::NotPlayerTurn));
    assert_eq!(next, current);
    assert!(!current.is_player_turn(Color::White));
}

#[test]
fn level_zero_queen_blunder_ends_without_a_reply() {
    let cfg = queen_lesson();
    let start = Match::start(&cfg).unwrap();
    let mut opp = counting(["d8d5"]);
    let (next, res) = play(&cfg, &start, "d1d5", &mut opp);

    assert!(res.accepted);
    assert_eq!(opp.calls, 0);
    assert_eq!(res.bot_move, None);
    let st = next.state;
    assert!(st.finished);
    assert_eq!(st.pass, Some(false));
    assert_eq!(st.fail_reason, Some(FailReason::QueenBlunder));
    assert!(st.queen_blundered);
    assert!(st.blundered);
    assert_eq!(st.moves_played, 1);
    assert!(!next.is_player_turn(Color::White));
}

#[test]
fn hung_queen_above_level_zero_is_an_ordinary_blunder() {
    let cfg = config(1, QUEEN_LESSON, WinKind::Captures, 3, 15);
    let start = Match::start(&cfg).unwrap();
    let (next, _) = play(&cfg, &start, "d1d5", &mut counting([]));
    assert_eq!(next.state.fail_reason, Some(FailReason::Blunder));
    assert!(next.state.blundered);
    assert!(!next.state.queen_blundered);
}

#[test]
fn hanging_a_rook_is_a_blunder_at_any_level() {
    let cfg = config(0, "4k3/8/8/3q4/8/8/8/R3K3 w - - 0 1", WinKind::MaterialLead, 1, 10);
    let start = Match::start(&cfg).unwrap();
    let (next, res) = play(&cfg, &start, "a1a5", &mut counting([]));
    assert_eq!(res.state.fail_reason, Some(FailReason::Blunder));
    assert!(!res.state.queen_blundered);
    // Nothing has been captured yet; the score reflects the board.
    assert_eq!(next.state.material_score, -4);
}

#[test]
fn finished_match_absorbs_further_moves() {
    let cfg = queen_lesson();
    let start = Match::start(&cfg).unwrap();
    let mut opp = counting([]);
    let (done, _) = play(&cfg, &start, "d1d5", &mut opp);

    let (again, res) = play(&cfg, &done, "e1e2", &mut opp);
    assert_eq!(res.rejection, Some(Rejection::AlreadyFinished));
    assert_eq!(again, done);
    assert_eq!(opp.calls, 0);
}

#[test]
fn running_out_of_plies_wins_over_meeting_the_target() {
    let fen = "4k3/8/8/8/8/8/p7/R3K3 w - - 0 1";
    let cfg = config(1, fen, WinKind::Captures, 1, 1);
    let start = Match::start(&cfg).unwrap();
    let (next, _) = play(&cfg, &start, "a1a2", &mut counting([]));
    assert_eq!(next.state.captures_by_player, 1);
    assert_eq!(next.state.fail_reason, Some(FailReason::Timeout));
    assert_eq!(next.state.pass, Some(false));
}

#[test]
fn capture_target_passes_before_the_coach_moves() {
    let fen = "4k3/8/8/8/8/8/p7/R3K3 w - - 0 1";
    let cfg = config(1, fen, WinKind::Captures, 1, 5);
    let start = Match::start(&cfg).unwrap();
    let mut opp = counting(["e8d8"]);
    let (next, res) = play(&cfg, &start, "a1a2", &mut opp);
    assert_eq!(next.state.pass, Some(true));
    assert_eq!(next.state.fail_reason, None);
    assert_eq!(res.bot_move, None);
    assert_eq!(opp.calls, 0);
}

#[test]
fn material_lead_target_passes() {
    let fen = "4k3/8/8/8/8/8/p7/R3K3 w - - 0 1";
    let cfg = config(1, fen, WinKind::MaterialLead, 5, 5);
    let start = Match::start(&cfg).unwrap();
    assert_eq!(start.state.material_score, 4);
    let (next, _) = play(&cfg, &start, "a1a2", &mut counting([]));
    assert_eq!(next.state.material_score, 5);
    assert_eq!(next.state.pass, Some(true));
}

#[test]
fn mating_the_coach_passes() {
    let cfg = config(1, "6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1", WinKind::Captures, 5, 10);
    let start = Match::start(&cfg).unwrap();
    let mut opp = counting([]);
    let (next, res) = play(&cfg, &start, "a1a8", &mut opp);
    assert_eq!(opp.calls, 1);
    assert_eq!(res.bot_move, None);
    assert_eq!(next.state.pass, Some(true));
    assert_eq!(next.state.fail_reason, None);
}

#[test]
fn stalemating_the_coach_fails() {
    let cfg = config(1, "7k/8/6Q1/8/8/8/8/K7 w - - 0 1", WinKind::Captures, 5, 10);
    let start = Match::start(&cfg).unwrap();
    let (next, _) = play(&cfg, &start, "a1a2", &mut counting([]));
    assert_eq!(next.state.fail_reason, Some(FailReason::Stalemate));
    assert_eq!(next.state.pass, Some(false));
    assert!(!next.state.blundered);
}

#[test]
fn being_mated_by_the_coach_fails() {
    let cfg = config(1, "kr6/8/8/8/8/8/P4PPP/6K1 w - - 0 1", WinKind::Captures, 5, 10);
    let start = Match::start(&cfg).unwrap();
    let (next, res) = play(&cfg, &start, "a2a3", &mut counting(["b8b1"]));
    assert_eq!(res.bot_move.map(|m| m.to_uci()).as_deref(), Some("b8b1"));
    assert_eq!(next.state.fail_reason, Some(FailReason::Checkmated));
    assert!(next.state.finished);
}

#[test]
fn threats_left_standing_count_against_the_learner() {
    // The c3 knight already hits both rooks. Stepping the king aside leaves
    // a rook to be taken for free, which is judged on this ply even though
    // the learner did not create the threat.
    let fork = "7k/8/8/8/4R3/2n5/R7/4K3 w - - 0 1";
    let cfg = config(1, fork, WinKind::MaterialLead, 20, 10);
    let start = Match::start(&cfg).unwrap();
    assert_eq!(start.state.material_score, 7);

    let (idle, _) = play(&cfg, &start, "e1f1", &mut counting([]));
    assert_eq!(idle.state.fail_reason, Some(FailReason::Blunder));

    // Re2 guards a2 and is guarded by the king: whichever rook goes, the
    // knight goes too.
    let (guarded, res) = play(&cfg, &start, "e4e2", &mut counting([]));
    assert!(res.accepted);
    assert!(!guarded.state.blundered);
    assert_eq!(guarded.state.fail_reason, None);
}

#[test]
fn promotion_piece_can_be_chosen() {
    let cfg = config(1, "4k3/P7/8/8/8/8/8/4K3 w - - 0 1", WinKind::MaterialLead, 20, 10);
    let start = Match::start(&cfg).unwrap();
    let mut opp = Scripted::new(["e8e7"]);
    let (next, res) = attempt_promoting(&cfg, &start, s("a7"), s("a8"), Some(PieceKind::Knight), &mut opp);
    assert!(res.accepted);
    assert_eq!(res.player_move.map(|m| m.to_uci()).as_deref(), Some("a7a8n"));
    assert_eq!(
        next.position.piece_at(s("a8")),
        Some(Piece::new(Color::White, PieceKind::Knight))
    );
    assert_eq!(next.state.material_score, 3);

    // Plain from/to still promotes to a queen.
    let (queened, _) = attempt(&cfg, &start, s("a7"), s("a8"), &mut Scripted::new(["e8e7"]));
    assert_eq!(queened.state.material_score, 9);

    // A promotion piece on an ordinary move is not a legal move.
    let (same, res) = attempt_promoting(&cfg, &start, s("e1"), s("e2"), Some(PieceKind::Queen), &mut opp);
    assert_eq!(res.rejection, Some(Rejection::Illegal));
    assert_eq!(same, start);
}

#[test]
fn move_text_takes_an_optional_promotion_letter() {
    assert_eq!(parse_move_text("e2e4"), Some((s("e2"), s("e4"), None)));
    assert_eq!(parse_move_text(" e7e8n "), Some((s("e7"), s("e8"), Some(PieceKind::Knight))));
    assert_eq!(parse_move_text("E7E8Q"), Some((s("e7"), s("e8"), Some(PieceKind::Queen))));
    for bad in ["", "e2", "e2e", "e2e9", "e7e8k", "e7e8p", "e7e8x", "e7e8nn", "e2é4"] {
        assert_eq!(parse_move_text(bad), None, "{bad:?}");
    }
}

#[test]
fn sessions_honour_the_promotion_suffix() {
    let cfg = Arc::new(config(1, "4k3/P7/8/8/8/8/8/4K3 w - - 0 1", WinKind::MaterialLead, 20, 10));
    let mut session = ChallengeSession::new(Arc::clone(&cfg), Box::new(Scripted::new(["e8e7"]))).unwrap();
    for bad in ["a7a8k", "a7a8nq", "e1e2q"] {
        assert_eq!(session.attempt_uci(bad).rejection, Some(Rejection::Illegal), "{bad}");
    }
    assert!(session.attempt_uci("a7a8n").accepted);
    assert_eq!(session.history(), ["a7a8n", "e8e7"]);
    assert_eq!(
        session.snapshot().position.piece_at(s("a8")).map(|pc| pc.kind),
        Some(PieceKind::Knight)
    );
}

#[test]
fn capture_count_includes_only_learner_captures() {
    let cfg = queen_lesson();
    let start = Match::start(&cfg).unwrap();
    let mut opp = Scripted::new(["d8g5", "e8f8"]);
    let (m1, _) = play(&cfg, &start, "d1f3", &mut opp);
    assert_eq!(m1.state.captures_by_player, 0);
    let (m2, _) = play(&cfg, &m1, "f3b7", &mut opp);
    assert_eq!(m2.state.captures_by_player, 1);
    assert_eq!(m2.state.material_score, 1);
    assert_eq!(m2.state.moves_played, 2);
}

#[test]
fn replay_matches_step_by_step_play() {
    let cfg = queen_lesson();
    let moves = ["d1f3", "f3b7", "b7a7", "a7c7"];
    let script = ["d8g5", "e8f8", "f8g8"];

    let (replayed, results) = replay(&cfg, moves, &mut Scripted::new(script)).unwrap();
    assert_eq!(results.len(), 4);
    assert!(results.iter().all(|r| r.accepted));

    let mut opp = Scripted::new(script);
    let mut current = Match::start(&cfg).unwrap();
    for mv in moves {
        current = play(&cfg, &current, mv, &mut opp).0;
    }
    assert_eq!(replayed, current);
    assert_eq!(current.state.pass, Some(true));
    assert_eq!(current.state.captures_by_player, 3);
}

#[test]
fn replay_stops_at_the_first_rejection() {
    let cfg = queen_lesson();
    let (m, results) = replay(&cfg, ["e1e2", "e2e5", "e2e1"], &mut Scripted::new(["e8f8"])).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[1].rejection, Some(Rejection::Illegal));
    assert_eq!(m.state.moves_played, 1);
}

#[test]
fn seeded_coaches_replay_identically() {
    let cfg = queen_lesson();
    let moves = ["e1e2", "e2e1", "e1e2", "e2e1", "e1e2"];
    let (a, ra) = replay(&cfg, moves, &mut Coach::seeded(11)).unwrap();
    let (b, rb) = replay(&cfg, moves, &mut Coach::seeded(11)).unwrap();
    assert_eq!(a, b);
    assert_eq!(ra, rb);
}

#[test]
fn move_result_serializes_camel_case() {
    let cfg = queen_lesson();
    let start = Match::start(&cfg).unwrap();
    let (_, res) = play(&cfg, &start, "d1d5", &mut counting([]));
    let json = serde_json::to_value(&res).unwrap();
    assert_eq!(json["accepted"], true);
    assert_eq!(json["state"]["failReason"], "queenBlunder");
    assert_eq!(json["state"]["queenBlundered"], true);
    assert!(json.get("botMove").is_none());
    assert!(json.get("playerFen").is_some());
}
