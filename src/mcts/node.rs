//! Search tree nodes and edges.
//!
//! Nodes live in the [`MCTSTree`](super::MCTSTree) arena and point at each
//! other by [`NodeId`]. Statistics sit on the edges, so a node's children
//! can be ranked without touching the child nodes.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::{PlayerId, PlayerMap};

/// Index into the node arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// The root is always the first node allocated.
    pub const ROOT: NodeId = NodeId(0);

    /// No node: an edge that has not been expanded, or the root's parent.
    pub const NONE: NodeId = NodeId(u32::MAX);

    #[inline]
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }

    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_none() {
            f.write_str("#-")
        } else {
            write!(f, "#{}", self.0)
        }
    }
}

/// One robot move out of a node, with its visit statistics.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Edge<M> {
    pub mv: M,

    /// Node reached by the move, or [`NodeId::NONE`] until expanded.
    pub child: NodeId,

    pub visits: u32,

    /// Sum of playout rewards seen through this edge, per player.
    pub total_reward: PlayerMap<f64>,

    /// Share of the engine's playout weight; PUCT's prior.
    pub prior: f32,
}

impl<M> Edge<M> {
    pub fn new(mv: M, player_count: usize) -> Self {
        Self::with_prior(mv, player_count, 1.0)
    }

    pub fn with_prior(mv: M, player_count: usize, prior: f32) -> Self {
        Self {
            mv,
            child: NodeId::NONE,
            visits: 0,
            total_reward: PlayerMap::with_value(player_count, 0.0),
            prior,
        }
    }

    /// Average reward for `player`; zero before the first visit.
    #[must_use]
    pub fn mean_reward(&self, player: PlayerId) -> f64 {
        match self.visits {
            0 => 0.0,
            n => self.total_reward[player] / f64::from(n),
        }
    }

    #[must_use]
    pub fn is_expanded(&self) -> bool {
        !self.child.is_none()
    }
}

/// A position in the search tree.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MCTSNode<M> {
    pub parent: NodeId,

    /// Player to move here.
    pub to_move: PlayerId,

    /// Plies below the root.
    pub depth: u16,

    pub visits: u32,

    /// Exact rewards when the game is over here (or nobody can move).
    pub terminal: Option<PlayerMap<f64>>,

    pub edges: SmallVec<[Edge<M>; 8]>,
}

impl<M> MCTSNode<M> {
    pub fn root(to_move: PlayerId) -> Self {
        Self::child(NodeId::NONE, to_move, 0)
    }

    pub fn child(parent: NodeId, to_move: PlayerId, depth: u16) -> Self {
        Self {
            parent,
            to_move,
            depth,
            visits: 0,
            terminal: None,
            edges: SmallVec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.terminal.is_some()
    }

    #[must_use]
    pub fn has_unexpanded(&self) -> bool {
        self.edges.iter().any(|e| !e.is_expanded())
    }

    /// Indices of the edges without a child yet.
    pub fn unexpanded(&self) -> impl Iterator<Item = usize> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter_map(|(i, e)| (!e.is_expanded()).then_some(i))
    }

    /// The edge searched most, first one on ties.
    #[must_use]
    pub fn most_visited(&self) -> Option<&Edge<M>> {
        self.edges
            .iter()
            .reduce(|best, e| if e.visits > best.visits { e } else { best })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Move, MoveOp};

    const WHITE: PlayerId = PlayerId::new(0);
    const BLACK: PlayerId = PlayerId::new(1);

    fn edge(op: MoveOp) -> Edge<Move> {
        Edge::new(Move::simple(op, WHITE), 2)
    }

    #[test]
    fn test_node_id() {
        assert_eq!(NodeId::ROOT.index(), 0);
        assert!(NodeId::NONE.is_none());
        assert_eq!(NodeId(5).to_string(), "#5");
        assert_eq!(NodeId::NONE.to_string(), "#-");
    }

    #[test]
    fn test_mean_reward() {
        let mut e = edge(MoveOp::Pass);
        assert_eq!(e.mean_reward(WHITE), 0.0);
        assert!(!e.is_expanded());

        e.visits = 4;
        e.total_reward[WHITE] = 3.0;
        e.total_reward[BLACK] = 1.0;
        assert_eq!(e.mean_reward(WHITE), 0.75);
        assert_eq!(e.mean_reward(BLACK), 0.25);
    }

    #[test]
    fn test_unexpanded_edges() {
        let mut node = MCTSNode::root(WHITE);
        assert!(node.parent.is_none());
        assert!(!node.has_unexpanded());

        node.edges.push(edge(MoveOp::AcceptDraw));
        node.edges.push(edge(MoveOp::DeclineDraw));
        node.edges[0].child = NodeId(1);
        assert_eq!(node.unexpanded().collect::<Vec<_>>(), vec![1]);

        node.edges[1].child = NodeId(2);
        assert!(!node.has_unexpanded());
    }

    #[test]
    fn test_most_visited_keeps_first_on_ties() {
        let mut node = MCTSNode::root(WHITE);
        assert!(node.most_visited().is_none());

        for (op, visits) in [(MoveOp::Resign, 3), (MoveOp::OfferDraw, 7), (MoveOp::Edit, 7)] {
            let mut e = edge(op);
            e.visits = visits;
            node.edges.push(e);
        }
        assert_eq!(node.most_visited().unwrap().mv.op, MoveOp::OfferDraw);
    }

    #[test]
    fn test_terminal_node() {
        let mut node: MCTSNode<Move> = MCTSNode::child(NodeId::ROOT, BLACK, 1);
        assert!(!node.is_terminal());
        node.terminal = Some(PlayerMap::with_value(2, 0.5));
        assert!(node.is_terminal());

        let json = serde_json::to_string(&node).unwrap();
        let back: MCTSNode<Move> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.depth, 1);
        assert!(back.is_terminal());
    }
}
