//! Tree and playout policies.
//!
//! A [`SelectionPolicy`] ranks the edges of a fully expanded node; a
//! [`SimulationPolicy`] picks the next move of a playout.

use crate::core::{GameRng, PlayerId, PlayerMap};
use crate::rules::{GameResult, RulesEngine};

use super::config::MCTSConfig;
use super::node::MCTSNode;

// =============================================================================
// Selection Policy
// =============================================================================

/// Picks the edge to descend through.
pub trait SelectionPolicy<M>: Send + Sync {
    /// Edge index of `node` to follow, scored for `player`, the mover there.
    fn select(&self, node: &MCTSNode<M>, player: PlayerId, config: &MCTSConfig) -> usize;
}

/// `Q(a) + c * sqrt(ln N / n(a))`. Unvisited edges go first.
#[derive(Clone, Debug, Default)]
pub struct UCB1;

impl<M> SelectionPolicy<M> for UCB1 {
    fn select(&self, node: &MCTSNode<M>, player: PlayerId, config: &MCTSConfig) -> usize {
        let ln_parent = f64::from(node.visits.max(1)).ln();

        argmax(node.edges.iter().map(|edge| {
            let exploitation = edge.mean_reward(player);
            let exploration = if edge.visits == 0 {
                f64::INFINITY
            } else {
                config.exploration_constant * (ln_parent / f64::from(edge.visits)).sqrt()
            };
            exploitation + exploration
        }))
    }
}

/// `Q(a) + c * P(a) * sqrt(N) / (1 + n(a))` with `P` from the edge priors,
/// which are the engine's move weights normalized at expansion.
#[derive(Clone, Debug, Default)]
pub struct PUCT;

impl<M> SelectionPolicy<M> for PUCT {
    fn select(&self, node: &MCTSNode<M>, player: PlayerId, config: &MCTSConfig) -> usize {
        let sqrt_parent = f64::from(node.visits.max(1)).sqrt();

        argmax(node.edges.iter().map(|edge| {
            let q = edge.mean_reward(player);
            let u = config.exploration_constant * f64::from(edge.prior) * sqrt_parent
                / (1.0 + f64::from(edge.visits));
            q + u
        }))
    }
}

/// Index of the largest score, 0 for an empty sequence.
fn argmax(scores: impl Iterator<Item = f64>) -> usize {
    scores
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map_or(0, |(i, _)| i)
}

// =============================================================================
// Simulation Policy
// =============================================================================

/// Picks playout moves.
pub trait SimulationPolicy<E: RulesEngine>: Send + Sync {
    /// Index into `moves` (never empty) of the move to play.
    fn choose(&self, engine: &E, moves: &[E::Move], rng: &mut GameRng) -> usize;
}

#[derive(Clone, Debug, Default)]
pub struct RandomSimulation;

impl<E: RulesEngine> SimulationPolicy<E> for RandomSimulation {
    fn choose(&self, _engine: &E, moves: &[E::Move], rng: &mut GameRng) -> usize {
        rng.gen_range_usize(0..moves.len())
    }
}

/// Playouts biased by [`RulesEngine::move_weight`].
#[derive(Clone, Debug, Default)]
pub struct WeightedSimulation;

impl<E: RulesEngine> SimulationPolicy<E> for WeightedSimulation {
    fn choose(&self, engine: &E, moves: &[E::Move], rng: &mut GameRng) -> usize {
        let weights: Vec<f32> = moves.iter().map(|m| engine.move_weight(m)).collect();
        rng.choose_weighted(&weights)
            .unwrap_or_else(|| rng.gen_range_usize(0..moves.len()))
    }
}

/// Rewards of a finished game: 1 to the winner, half each on a draw.
pub fn result_to_rewards(result: &GameResult, player_count: usize) -> PlayerMap<f64> {
    PlayerMap::new(player_count, |player| result.reward(player))
}

/// Exact rewards when the game is over, the evaluator's guess otherwise.
pub fn evaluate_rewards<E: RulesEngine>(engine: &E) -> PlayerMap<f64> {
    match engine.result() {
        Some(result) => result_to_rewards(&result, engine.player_count()),
        None => PlayerMap::new(engine.player_count(), |player| engine.evaluate(player)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Move, MoveOp, ReplayMode};
    use crate::games::dipole::DipoleBoard;
    use crate::mcts::node::Edge;

    const WHITE: PlayerId = PlayerId::new(0);

    fn edge(op: MoveOp, visits: u32, reward: f64) -> Edge<Move> {
        let mut e = Edge::new(Move::simple(op, WHITE), 2);
        e.visits = visits;
        e.total_reward[WHITE] = reward;
        e
    }

    fn node(edges: Vec<Edge<Move>>) -> MCTSNode<Move> {
        let mut node = MCTSNode::root(WHITE);
        node.visits = edges.iter().map(|e| e.visits).sum();
        node.edges.extend(edges);
        node
    }

    #[test]
    fn test_ucb1_tries_unvisited_first() {
        let n = node(vec![
            edge(MoveOp::Pass, 100, 80.0),
            edge(MoveOp::Resign, 10, 7.0),
            edge(MoveOp::OfferDraw, 0, 0.0),
        ]);
        assert_eq!(UCB1.select(&n, WHITE, &MCTSConfig::default()), 2);
    }

    #[test]
    fn test_ucb1_without_exploration_is_greedy() {
        let n = node(vec![edge(MoveOp::Pass, 50, 20.0), edge(MoveOp::Resign, 2, 1.8)]);
        let greedy = MCTSConfig::default().with_exploration(0.0);
        assert_eq!(UCB1.select(&n, WHITE, &greedy), 1);
    }

    #[test]
    fn test_empty_node_selects_zero() {
        let n: MCTSNode<Move> = MCTSNode::root(WHITE);
        assert_eq!(UCB1.select(&n, WHITE, &MCTSConfig::default()), 0);
        assert_eq!(PUCT.select(&n, WHITE, &MCTSConfig::default()), 0);
    }

    #[test]
    fn test_puct_prefers_higher_prior() {
        let mut low = edge(MoveOp::AcceptDraw, 10, 5.0);
        low.prior = 0.1;
        let mut high = edge(MoveOp::DeclineDraw, 10, 5.0);
        high.prior = 0.9;
        let n = node(vec![low, high]);
        assert_eq!(PUCT.select(&n, WHITE, &MCTSConfig::default()), 1);
    }

    #[test]
    fn test_simulations_stay_in_range() {
        let mut board = DipoleBoard::from_init_str("dipole 2 734687 1").unwrap();
        board
            .execute(&mut Move::simple(MoveOp::Start, WHITE), ReplayMode::Live)
            .unwrap();
        let moves = board.robot_moves();
        assert!(!moves.is_empty());

        let mut rng = GameRng::new(5);
        for _ in 0..50 {
            assert!(RandomSimulation.choose(&board, &moves, &mut rng) < moves.len());
            assert!(WeightedSimulation.choose(&board, &moves, &mut rng) < moves.len());
        }
    }

    #[test]
    fn test_rewards() {
        let won = result_to_rewards(&GameResult::Winner(PlayerId::new(1)), 2);
        assert_eq!((won[WHITE], won[PlayerId::new(1)]), (0.0, 1.0));

        let drawn = result_to_rewards(&GameResult::Draw, 2);
        assert_eq!((drawn[WHITE], drawn[PlayerId::new(1)]), (0.5, 0.5));
    }
}
