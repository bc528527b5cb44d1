//! Session integration tests: logging, undo, repetition and replay.

use rust_dipole::core::{Move, ReplayMode, SessionError};
use rust_dipole::digest::RepetitionTable;
use rust_dipole::games::dipole::{DipoleBoard, Phase};
use rust_dipole::robot::{RobotAlgorithm, RobotConfig, RobotDriver};
use rust_dipole::rules::GameResult;
use rust_dipole::session::Session;
use rust_dipole::mcts::MCTSConfig;

const INIT: &str = "dipole 2 734687 1";

const OPENING: [&str; 9] = [
    "start P0",
    "pick C 1 P0",
    "drop D 2 P0",
    "done P0",
    "pick D 8 P1",
    "drop C 7 P1",
    "done P1",
    "move C 1 C 3 P0",
    "done P0",
];

fn play(session: &mut Session, text: &str) -> Move {
    session
        .apply(Move::decode(text).unwrap(), ReplayMode::Live)
        .unwrap_or_else(|err| panic!("{text}: {err}"))
}

fn opened() -> Session {
    let mut session = Session::from_init_str(INIT).unwrap();
    for text in OPENING {
        play(&mut session, text);
    }
    session
}

// =============================================================================
// Replay
// =============================================================================

#[test]
fn test_opening_digest_matches_direct_execution() {
    let session = opened();

    let mut board = DipoleBoard::from_init_str(INIT).unwrap();
    for text in OPENING {
        board
            .execute(&mut Move::decode(text).unwrap(), ReplayMode::Replay)
            .unwrap();
    }
    assert_eq!(session.digest(), board.digest());
    assert_eq!(session.whose_turn(), rust_dipole::PlayerId::new(1));
}

#[test]
fn test_transcript_replays_to_live_digest() {
    let session = opened();
    let transcript = session.transcript();
    assert_eq!(transcript.len(), OPENING.len());
    assert_eq!(transcript[0], "1 start P0");
    assert_eq!(transcript[8], "9 done P0");

    let replayed = Session::replay(INIT, &transcript).unwrap();
    assert_eq!(replayed.digest(), session.digest());
    assert_eq!(session.verify_replay().unwrap(), session.digest());
}

#[test]
fn test_replay_under_other_init_diverges() {
    let session = opened();
    let other = Session::replay("dipole 2 734687 0", session.transcript()).unwrap();
    assert_ne!(other.digest(), session.digest());
}

#[test]
fn test_replay_rejects_illegal_log() {
    let err = Session::replay(INIT, ["1 start P0", "2 done P0"]).unwrap_err();
    assert!(matches!(err, SessionError::ReplayLine { line: 2, .. }));
}

// =============================================================================
// Recorded digests
// =============================================================================

// Stored games replay only while these hold: key streams, key layout and the
// set of digested fields all feed them.
const OPENING_DIGEST: u64 = 0xDD8C_E1DE_E49A_C2E7;
const STARTED_DIGEST: u64 = 0x31A7_F75A_91B7_50B9;
const FIRST_MOVE_DIGEST: u64 = 0x02E0_CFBD_6579_58FE;
const LEGACY_OPENING_DIGEST: u64 = 0xBB28_4D75_E9D0_D7D0;

#[test]
fn test_recorded_digests() {
    let mut session = Session::from_init_str(INIT).unwrap();
    assert_eq!(session.digest(), OPENING_DIGEST);

    play(&mut session, "start P0");
    assert_eq!(session.digest(), STARTED_DIGEST);

    play(&mut session, "move C 1 D 2 P0");
    play(&mut session, "done P0");
    assert_eq!(session.digest(), FIRST_MOVE_DIGEST);
    assert_eq!(session.verify_replay().unwrap(), FIRST_MOVE_DIGEST);

    let legacy = Session::from_init_str("dipole 2 734687 0").unwrap();
    assert_eq!(legacy.digest(), LEGACY_OPENING_DIGEST);
}

// =============================================================================
// Undo and edit history
// =============================================================================

#[test]
fn test_undo_everything_returns_to_start() {
    let mut session = opened();
    let start = Session::from_init_str(INIT).unwrap().digest();
    while !session.log().is_empty() {
        session.undo().unwrap();
    }
    assert_eq!(session.digest(), start);
    assert_eq!(session.phase(), Phase::Puzzle);
    assert_eq!(session.undo(), Err(SessionError::EmptyLog));
}

#[test]
fn test_redundant_pick_drop_leaves_no_trace() {
    let mut session = opened();
    let len = session.log().len();
    let digest = session.digest();
    play(&mut session, "pick D 8 P1");
    play(&mut session, "drop D 8 P1");
    assert_eq!(session.log().len(), len);
    assert_eq!(session.digest(), digest);
}

#[test]
fn test_drop_taken_back_by_pick_collapses() {
    let mut session = opened();
    let len = session.log().len();
    play(&mut session, "pick C 7 P1");
    play(&mut session, "drop B 6 P1");
    assert_eq!(session.phase(), Phase::Confirm);
    play(&mut session, "pick B 6 P1");
    assert_eq!(session.log().len(), len + 1);
    assert_eq!(session.phase(), Phase::Play);
    session.verify_replay().unwrap();
}

// =============================================================================
// Repetition
// =============================================================================

#[test]
fn test_repetition_limit_is_configurable() {
    let mut session = Session::from_init_str(INIT)
        .unwrap()
        .with_repetitions(RepetitionTable::with_limit(2));
    play(&mut session, "start P0");
    play(&mut session, "offerdraw P0");
    play(&mut session, "done P0");
    play(&mut session, "declinedraw P1");
    play(&mut session, "done P1");
    assert_eq!(session.result(), Some(&GameResult::Draw));

    let replayed = Session::replay(INIT, session.transcript()).unwrap();
    // Replays use the default limit of three.
    assert!(!replayed.is_over());
    assert_eq!(session.verify_replay().unwrap(), session.digest());
}

fn decline_cycles(session: &mut Session, cycles: usize) {
    for _ in 0..cycles {
        for text in ["offerdraw P0", "done P0", "declinedraw P1", "done P1"] {
            play(session, text);
        }
    }
}

#[test]
fn test_verify_replay_keeps_a_raised_limit() {
    let mut session = Session::from_init_str(INIT)
        .unwrap()
        .with_repetitions(RepetitionTable::with_limit(5));
    play(&mut session, "start P0");
    decline_cycles(&mut session, 3);
    assert!(!session.is_over());
    assert_eq!(session.repetition_count(), 4);
    assert_eq!(session.verify_replay().unwrap(), session.digest());

    // Under the default limit this log would have drawn two cycles in.
    assert!(Session::replay(INIT, session.transcript()).is_err());

    decline_cycles(&mut session, 1);
    assert_eq!(session.result(), Some(&GameResult::Draw));
    let replayed =
        Session::replay_with(INIT, RepetitionTable::with_limit(5), session.transcript()).unwrap();
    assert_eq!(replayed.result(), Some(&GameResult::Draw));
    assert_eq!(session.verify_replay().unwrap(), session.digest());
}

#[test]
fn test_zero_limit_never_draws() {
    let mut session = Session::from_init_str(INIT)
        .unwrap()
        .with_repetitions(RepetitionTable::with_limit(0));
    play(&mut session, "start P0");
    decline_cycles(&mut session, 4);
    assert!(!session.is_over());
    assert_eq!(session.repetition_count(), 5);
    assert!(session.log().iter().all(|entry| !entry.drew));
    session.verify_replay().unwrap();
}

#[test]
fn test_no_moves_after_repetition_draw() {
    let mut session = Session::from_init_str(INIT)
        .unwrap()
        .with_repetitions(RepetitionTable::with_limit(2));
    for text in ["start P0", "offerdraw P0", "done P0", "declinedraw P1", "done P1"] {
        play(&mut session, text);
    }
    let err = session
        .apply(Move::decode("move C 1 D 2 P0").unwrap(), ReplayMode::Live)
        .unwrap_err();
    assert!(matches!(err, SessionError::Game(_)));
    assert!(session.legal_moves(session.whose_turn()).is_empty());
}

// =============================================================================
// Robots
// =============================================================================

#[test]
fn test_robot_game_replays() {
    let mut session = Session::from_init_str(INIT).unwrap();
    play(&mut session, "start P0");
    let config = RobotConfig::default()
        .with_iterations(60)
        .with_mcts(MCTSConfig::default().with_playout_depth(8));
    let mut robots = [
        RobotDriver::<DipoleBoard>::new(config.clone()),
        RobotDriver::<DipoleBoard>::new(
            config
                .with_algorithm(RobotAlgorithm::AlphaBeta)
                .with_max_depth(1),
        ),
    ];

    for _ in 0..12 {
        if session.is_over() {
            break;
        }
        let player = session.whose_turn();
        let played = session.robot_turn(&mut robots[player.index()]).unwrap();
        assert!(played.is_some());
        assert!(!session.phase().awaits_done());
    }
    session.verify_replay().unwrap();
}
