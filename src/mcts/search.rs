//! Core MCTS search algorithm.
//!
//! Every iteration walks one engine copy down the tree with
//! `execute_robot` and back up with `unexecute_robot`, so the copy made at
//! the start of a search is the only clone. With digest checks enabled,
//! each unexecute is verified to restore the digest seen before the move.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error};

use crate::core::{GameRng, PlayerId, PlayerMap, SearchError, SearchResult};
use crate::rules::RulesEngine;

use super::config::MCTSConfig;
use super::node::{Edge, MCTSNode, NodeId};
use super::policy::{
    evaluate_rewards, result_to_rewards, RandomSimulation, SelectionPolicy, SimulationPolicy,
    WeightedSimulation, UCB1,
};
use super::stats::SearchStats;
use super::tree::MCTSTree;

/// A move executed during an iteration with the digest seen before it.
type Played<M> = (M, u64);

/// Main MCTS search context.
///
/// Generic over the rules engine type. Owns the search tree and
/// configuration; the engine is borrowed per search.
pub struct MCTSSearch<E: RulesEngine + 'static> {
    /// Search configuration.
    config: MCTSConfig,

    /// The search tree.
    tree: MCTSTree<E::Move>,

    /// RNG for expansion order and playouts.
    rng: GameRng,

    /// Selection policy.
    selection: Box<dyn SelectionPolicy<E::Move>>,

    /// Simulation policy.
    simulation: Box<dyn SimulationPolicy<E>>,

    /// Set from another thread to stop between iterations.
    cancel: Arc<AtomicBool>,

    /// Search statistics.
    stats: SearchStats,
}

impl<E: RulesEngine + 'static> MCTSSearch<E> {
    /// Create a new MCTS search context.
    pub fn new(config: MCTSConfig) -> Self {
        let simulation: Box<dyn SimulationPolicy<E>> = if config.weighted_playouts {
            Box::new(WeightedSimulation)
        } else {
            Box::new(RandomSimulation)
        };

        Self {
            tree: MCTSTree::with_capacity(PlayerId::new(0), 1, config.max_nodes.min(1 << 16)),
            rng: GameRng::new(config.seed),
            config,
            selection: Box::new(UCB1),
            simulation,
            cancel: Arc::new(AtomicBool::new(false)),
            stats: SearchStats::default(),
        }
    }

    /// Set a custom selection policy.
    pub fn with_selection<S: SelectionPolicy<E::Move> + 'static>(mut self, selection: S) -> Self {
        self.selection = Box::new(selection);
        self
    }

    /// Set a custom simulation policy.
    pub fn with_simulation<S: SimulationPolicy<E> + 'static>(mut self, simulation: S) -> Self {
        self.simulation = Box::new(simulation);
        self
    }

    /// Share a cancellation flag with the caller.
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run up to `iterations` iterations from `engine`'s position.
    ///
    /// Stops early on the node budget, the deadline, or the cancel flag.
    /// Returns `None` when the game is over or nobody can move.
    pub fn search(&mut self, engine: &E, iterations: u32) -> SearchResult<Option<E::Move>> {
        let start = Instant::now();
        let deadline = self.config.deadline(start);
        self.stats.reset();

        let mut sandbox = engine.sandbox();
        self.tree.reset(sandbox.whose_turn(), sandbox.player_count());

        let root = self.tree.root();
        self.expand_node(root, &sandbox);

        if self.tree.get(root).is_terminal() {
            return Ok(None);
        }
        if self.tree.get(root).edges.len() == 1 {
            return Ok(Some(self.tree.get(root).edges[0].mv.clone()));
        }

        for _ in 0..iterations {
            if self.should_stop(deadline) {
                break;
            }
            self.iteration(&mut sandbox)?;
            self.stats.iterations += 1;

            if self.tree.len() >= self.config.max_nodes {
                break;
            }
        }

        self.stats.time_us = start.elapsed().as_micros() as u64;
        let line: Vec<String> = self
            .tree
            .principal_variation(4)
            .into_iter()
            .map(ToString::to_string)
            .collect();
        debug!(
            iterations = self.stats.iterations,
            nodes = self.tree.len(),
            max_depth = self.stats.max_depth,
            time_us = self.stats.time_us,
            rate = format_args!("{:.0}/s", self.stats.rate()),
            cancelled = self.stats.cancelled,
            line = %line.join(" / "),
            "mcts search finished"
        );

        Ok(self.best_move())
    }

    fn should_stop(&mut self, deadline: Option<Instant>) -> bool {
        if self.cancel.load(Ordering::Relaxed) {
            self.stats.cancelled = true;
            return true;
        }
        deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Single MCTS iteration: select, expand, simulate, backpropagate.
    fn iteration(&mut self, engine: &mut E) -> SearchResult<()> {
        let mut path: Vec<(NodeId, usize)> = Vec::new();
        let mut played: Vec<Played<E::Move>> = Vec::new();

        let outcome = self.descend(engine, &mut path, &mut played);
        // Unwind even when the descent failed part way.
        self.unwind(engine, &mut played)?;
        let rewards = outcome?;

        self.backpropagate(&path, &rewards);
        Ok(())
    }

    fn descend(
        &mut self,
        engine: &mut E,
        path: &mut Vec<(NodeId, usize)>,
        played: &mut Vec<Played<E::Move>>,
    ) -> SearchResult<PlayerMap<f64>> {
        let mut current = self.tree.root();

        loop {
            let node = self.tree.get(current);

            if node.is_terminal() {
                return Ok(self.terminal_rewards(current));
            }

            if self.config.max_depth > 0 && u32::from(node.depth) >= self.config.max_depth {
                return Ok(evaluate_rewards(&*engine));
            }

            let edge_idx = if node.has_unexpanded() {
                self.select_unexpanded(current)
            } else {
                self.selection.select(node, node.to_move, &self.config)
            };
            path.push((current, edge_idx));

            let mut mv = self.tree.get(current).edges[edge_idx].mv.clone();
            self.make(engine, &mut mv, played)?;

            let child = self.tree.get(current).edges[edge_idx].child;
            if child.is_none() {
                let child = self.expand_child(current, edge_idx, &*engine);
                if self.tree.get(child).is_terminal() {
                    return Ok(self.terminal_rewards(child));
                }
                self.stats.simulations += 1;
                return self.playout(engine, played);
            }

            current = child;
        }
    }

    fn terminal_rewards(&self, node_id: NodeId) -> PlayerMap<f64> {
        self.tree
            .get(node_id)
            .terminal
            .clone()
            .unwrap_or_else(|| PlayerMap::with_value(self.tree.player_count(), 0.5))
    }

    /// Play from the current position until the game ends or the playout
    /// depth is reached, then score it.
    fn playout(
        &mut self,
        engine: &mut E,
        played: &mut Vec<Played<E::Move>>,
    ) -> SearchResult<PlayerMap<f64>> {
        let mut rng = self.rng.fork();
        let mut steps = 0;

        loop {
            if let Some(result) = engine.result() {
                return Ok(result_to_rewards(&result, engine.player_count()));
            }
            if self.config.playout_depth > 0 && steps >= self.config.playout_depth {
                return Ok(evaluate_rewards(&*engine));
            }

            let mut moves = engine.robot_moves();
            if moves.is_empty() {
                return Ok(PlayerMap::with_value(engine.player_count(), 0.5));
            }

            let idx = self.simulation.choose(&*engine, &moves, &mut rng);
            let mut mv = moves.swap_remove(idx.min(moves.len() - 1));
            self.make(engine, &mut mv, played)?;
            steps += 1;
        }
    }

    fn make(
        &self,
        engine: &mut E,
        mv: &mut E::Move,
        played: &mut Vec<Played<E::Move>>,
    ) -> SearchResult<()> {
        let before = if self.config.verify_digests {
            engine.digest()
        } else {
            0
        };
        engine.execute_robot(mv)?;
        played.push((mv.clone(), before));
        Ok(())
    }

    fn unwind(&mut self, engine: &mut E, played: &mut Vec<Played<E::Move>>) -> SearchResult<()> {
        while let Some((mv, before)) = played.pop() {
            engine.unexecute_robot(&mv)?;
            if self.config.verify_digests {
                self.stats.digest_checks += 1;
                let after = engine.digest();
                if after != before {
                    error!(%mv, before, after, "digest not restored by unexecute");
                    return Err(SearchError::DigestMismatch {
                        mv: mv.to_string(),
                        before,
                        after,
                    });
                }
            }
        }
        Ok(())
    }

    /// Give a node its edges, or mark it terminal.
    fn expand_node(&mut self, node_id: NodeId, engine: &E) {
        let player_count = self.tree.player_count();

        if let Some(result) = engine.result() {
            let node = self.tree.get_mut(node_id);
            node.terminal = Some(result_to_rewards(&result, player_count));
            return;
        }

        let moves = engine.robot_moves();
        if moves.is_empty() {
            let node = self.tree.get_mut(node_id);
            node.terminal = Some(PlayerMap::with_value(player_count, 0.5));
            return;
        }

        let weights: Vec<f32> = moves
            .iter()
            .map(|m| engine.move_weight(m).max(0.0))
            .collect();
        let total: f32 = weights.iter().sum();
        let uniform = 1.0 / moves.len() as f32;

        let node = self.tree.get_mut(node_id);
        for (mv, weight) in moves.into_iter().zip(weights) {
            let prior = if total > 0.0 { weight / total } else { uniform };
            node.edges.push(Edge::with_prior(mv, player_count, prior));
        }

        self.stats.nodes_expanded += 1;
    }

    /// Select an unexpanded edge randomly.
    fn select_unexpanded(&mut self, node_id: NodeId) -> usize {
        let unexpanded: Vec<usize> = self.tree.get(node_id).unexpanded().collect();

        match unexpanded.len() {
            0 => 0,
            1 => unexpanded[0],
            n => unexpanded[self.rng.gen_range_usize(0..n)],
        }
    }

    /// Expand a child node for the given edge. `engine` is already past
    /// the edge's move.
    fn expand_child(&mut self, parent_id: NodeId, edge_idx: usize, engine: &E) -> NodeId {
        let depth = self.tree.get(parent_id).depth + 1;
        self.stats.max_depth = self.stats.max_depth.max(depth);

        let child = MCTSNode::child(parent_id, engine.whose_turn(), depth);
        let child_id = self.tree.alloc(child);
        self.tree.get_mut(parent_id).edges[edge_idx].child = child_id;

        self.expand_node(child_id, engine);
        child_id
    }

    /// Backpropagate rewards through the path.
    fn backpropagate(&mut self, path: &[(NodeId, usize)], rewards: &PlayerMap<f64>) {
        if path.is_empty() {
            self.tree.root_node_mut().visits += 1;
            return;
        }

        for &(node_id, edge_idx) in path.iter().rev() {
            let node = self.tree.get_mut(node_id);
            node.visits += 1;

            let edge = &mut node.edges[edge_idx];
            edge.visits += 1;
            for (player, reward) in rewards.iter() {
                edge.total_reward[player] += *reward;
            }
        }
    }

    /// Select the best move from the root.
    fn best_move(&self) -> Option<E::Move> {
        let root = self.tree.root_node();

        if root.edges.is_empty() {
            return None;
        }

        if self.config.temperature <= 0.0 {
            // Greedy: select most visited
            root.most_visited().map(|e| e.mv.clone())
        } else {
            let weights: Vec<f32> = root
                .edges
                .iter()
                .map(|e| (e.visits as f32 / self.config.temperature as f32).exp())
                .collect();

            let mut rng = self.rng.clone();
            rng.choose_weighted(&weights)
                .map(|idx| root.edges[idx].mv.clone())
        }
    }

    /// Get search statistics.
    #[must_use]
    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    /// Get the search tree.
    #[must_use]
    pub fn tree(&self) -> &MCTSTree<E::Move> {
        &self.tree
    }

    /// Root moves with their visit counts.
    pub fn move_visits(&self) -> Vec<(E::Move, u32)> {
        self.tree
            .root_node()
            .edges
            .iter()
            .map(|e| (e.mv.clone(), e.visits))
            .collect()
    }

    /// Root moves with visit shares summing to ~1.0.
    pub fn move_probabilities(&self) -> Vec<(E::Move, f64)> {
        let root = self.tree.root_node();
        let total: u32 = root.edges.iter().map(|e| e.visits).sum();

        if total == 0 {
            let uniform = 1.0 / root.edges.len().max(1) as f64;
            return root.edges.iter().map(|e| (e.mv.clone(), uniform)).collect();
        }

        root.edges
            .iter()
            .map(|e| (e.mv.clone(), f64::from(e.visits) / f64::from(total)))
            .collect()
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &MCTSConfig {
        &self.config
    }
}
