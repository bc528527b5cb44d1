//! Robot integration tests: MCTS, alpha-beta and the driver hand-off.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use rust_dipole::core::{Move, PlayerId, ReplayMode};
use rust_dipole::games::dipole::DipoleBoard;
use rust_dipole::mcts::{parallel_search, MCTSConfig, MCTSSearch, PUCT};
use rust_dipole::robot::{
    choose_move, AlphaBeta, RobotAlgorithm, RobotConfig, RobotDriver, RobotReply, RobotState,
    TranspositionTable,
};
use rust_dipole::rules::{GameResult, RulesEngine};

fn position(moves: &[&str]) -> DipoleBoard {
    let mut b = DipoleBoard::from_init_str("dipole 2 734687 1").unwrap();
    for text in moves {
        b.execute(&mut Move::decode(text).unwrap(), ReplayMode::Replay)
            .unwrap();
    }
    b
}

/// White can take Black's last chip with C1xD2.
fn winning_capture() -> DipoleBoard {
    let mut moves = Vec::new();
    for _ in 0..11 {
        moves.extend(["pick D 8 P0", "drop waste P0"]);
    }
    moves.extend(["pick D 8 P0", "drop D 2 P0", "start P0"]);
    position(&moves)
}

fn winner() -> Move {
    Move::decode("move C 1 D 2 P0").unwrap()
}

// =============================================================================
// Searches
// =============================================================================

#[test]
fn test_mcts_and_alpha_beta_agree_on_the_win() {
    let b = winning_capture();

    let mut mcts = MCTSSearch::<DipoleBoard>::new(MCTSConfig::default().with_seed(3))
        .with_selection(PUCT);
    assert_eq!(mcts.search(&b, 800).unwrap(), Some(winner()));

    let ab = AlphaBeta::<DipoleBoard>::new(RobotConfig::default().with_max_depth(2));
    let outcome = ab.search(&b).unwrap();
    assert_eq!(outcome.best, Some(winner()));
    assert!(outcome.score > 0.0);
}

#[test]
fn test_parallel_mcts_merges_workers() {
    let b = winning_capture();
    let cancel = Arc::new(AtomicBool::new(false));
    let config = MCTSConfig::default().with_seed(11);
    let outcome = parallel_search(&b, &config, 300, 4, &cancel).unwrap();
    assert_eq!(outcome.best, Some(winner()));
    let total: u32 = outcome.visits.iter().map(|(_, v)| v).sum();
    assert!(total >= 4 * 300 - 4);
}

#[test]
fn test_searches_leave_the_position_alone() {
    let b = position(&["start P0"]);
    let before = b.clone();
    let table = Arc::new(TranspositionTable::new(1 << 12));
    let cancel = Arc::new(AtomicBool::new(false));

    for config in [
        RobotConfig::default().with_iterations(150).with_digest_checks(true),
        RobotConfig::default()
            .with_algorithm(RobotAlgorithm::AlphaBeta)
            .with_max_depth(2)
            .with_workers(2)
            .with_digest_checks(true),
    ] {
        let mv = choose_move(&b, &config, &table, &cancel).unwrap().unwrap();
        assert!(b.robot_moves().contains(&mv), "{mv}");
    }
    assert_eq!(b, before);
}

// =============================================================================
// Driver
// =============================================================================

#[test]
fn test_driver_plays_a_short_game() {
    let mut board = position(&["start P0"]);
    let config = RobotConfig::default()
        .with_iterations(80)
        .with_mcts(MCTSConfig::default().with_playout_depth(6));
    let mut driver = RobotDriver::<DipoleBoard>::new(config);

    for turn in 0..6u8 {
        assert_eq!(RulesEngine::whose_turn(&board), PlayerId::new(turn % 2));
        driver.prepare_to_move(&board).unwrap();
        let reply = driver.wait().unwrap();
        let RobotReply::Move(mut mv) = reply else {
            panic!("no move on turn {turn}");
        };
        board.execute_robot(&mut mv).unwrap();
        driver.complete();
        assert_eq!(driver.state(), RobotState::Idle);
    }
    assert_eq!(board.move_number(), 7);
}

#[test]
fn test_driver_reports_no_move_after_game_end() {
    let mut board = winning_capture();
    board.execute_robot(&mut winner()).unwrap();
    assert_eq!(
        RulesEngine::result(&board),
        Some(GameResult::Winner(PlayerId::new(0)))
    );

    let mut driver = RobotDriver::<DipoleBoard>::new(RobotConfig::default());
    driver.prepare_to_move(&board).unwrap();
    assert_eq!(driver.wait().unwrap(), RobotReply::NoMove);
    driver.complete();
    assert_eq!(driver.state(), RobotState::Idle);
}
