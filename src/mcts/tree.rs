//! Node arena for one search.
//!
//! The tree is rebuilt for every search: [`MCTSTree::reset`] keeps the
//! allocation and puts a fresh root at [`NodeId::ROOT`].

use serde::{Deserialize, Serialize};

use super::node::{MCTSNode, NodeId};
use crate::core::PlayerId;

/// Flat arena of search nodes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MCTSTree<M> {
    nodes: Vec<MCTSNode<M>>,
    player_count: usize,
}

impl<M> MCTSTree<M> {
    pub fn new(root_player: PlayerId, player_count: usize) -> Self {
        Self::with_capacity(root_player, player_count, 0)
    }

    /// Tree with room for `capacity` nodes before reallocating.
    pub fn with_capacity(root_player: PlayerId, player_count: usize, capacity: usize) -> Self {
        let mut nodes = Vec::with_capacity(capacity.max(1));
        nodes.push(MCTSNode::root(root_player));
        Self {
            nodes,
            player_count,
        }
    }

    /// Drop every node and start over from a new root.
    pub fn reset(&mut self, root_player: PlayerId, player_count: usize) {
        self.nodes.clear();
        self.nodes.push(MCTSNode::root(root_player));
        self.player_count = player_count;
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    #[inline]
    #[must_use]
    pub fn get(&self, id: NodeId) -> &MCTSNode<M> {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut MCTSNode<M> {
        &mut self.nodes[id.index()]
    }

    #[must_use]
    pub fn root_node(&self) -> &MCTSNode<M> {
        &self.nodes[0]
    }

    pub fn root_node_mut(&mut self) -> &mut MCTSNode<M> {
        &mut self.nodes[0]
    }

    pub fn alloc(&mut self, node: MCTSNode<M>) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() as u32 - 1)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Never true: a tree always has its root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.player_count
    }

    /// Moves along the most visited edges from the root, at most `limit`.
    pub fn principal_variation(&self, limit: usize) -> Vec<&M> {
        let mut line = Vec::new();
        let mut node = self.root_node();
        while line.len() < limit {
            let Some(edge) = node.most_visited().filter(|e| e.visits > 0) else {
                break;
            };
            line.push(&edge.mv);
            if !edge.is_expanded() {
                break;
            }
            node = self.get(edge.child);
        }
        line
    }

    #[must_use]
    pub fn stats(&self) -> TreeStats {
        self.nodes.iter().fold(TreeStats::default(), |mut s, node| {
            s.node_count += 1;
            s.max_depth = s.max_depth.max(node.depth);
            s.terminal_count += usize::from(node.is_terminal());
            s.total_edges += node.edges.len();
            s.expanded_edges += node.edges.iter().filter(|e| e.is_expanded()).count();
            s
        })
    }
}

/// Shape of a search tree.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TreeStats {
    pub node_count: usize,
    pub max_depth: u16,
    pub terminal_count: usize,
    pub total_edges: usize,
    /// Edges with a child node.
    pub expanded_edges: usize,
}

impl TreeStats {
    /// Average edges per node.
    #[must_use]
    pub fn branching_factor(&self) -> f64 {
        if self.node_count == 0 {
            return 0.0;
        }
        self.total_edges as f64 / self.node_count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Move, MoveOp, PlayerMap};
    use crate::mcts::node::Edge;

    const WHITE: PlayerId = PlayerId::new(0);
    const BLACK: PlayerId = PlayerId::new(1);

    fn edge(op: MoveOp, player: PlayerId, visits: u32) -> Edge<Move> {
        let mut e = Edge::new(Move::simple(op, player), 2);
        e.visits = visits;
        e
    }

    /// Root with two edges; the busier one leads to a node with one edge.
    fn small_tree() -> MCTSTree<Move> {
        let mut tree = MCTSTree::new(WHITE, 2);
        let root = tree.root();
        tree.get_mut(root).edges.push(edge(MoveOp::OfferDraw, WHITE, 2));
        tree.get_mut(root).edges.push(edge(MoveOp::Resign, WHITE, 5));

        let child = tree.alloc(MCTSNode::child(root, BLACK, 1));
        tree.get_mut(root).edges[1].child = child;
        tree.get_mut(child).edges.push(edge(MoveOp::Done, BLACK, 4));
        tree
    }

    #[test]
    fn test_new_tree_has_root() {
        let tree: MCTSTree<Move> = MCTSTree::new(BLACK, 2);
        assert_eq!(tree.len(), 1);
        assert!(!tree.is_empty());
        assert_eq!(tree.root(), NodeId::ROOT);
        assert_eq!(tree.root_node().to_move, BLACK);
    }

    #[test]
    fn test_alloc_and_reset() {
        let mut tree = small_tree();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.get(NodeId(1)).parent, NodeId::ROOT);

        tree.reset(BLACK, 2);
        assert_eq!(tree.len(), 1);
        assert!(tree.root_node().edges.is_empty());
        assert_eq!(tree.root_node().to_move, BLACK);
    }

    #[test]
    fn test_principal_variation() {
        let tree = small_tree();
        let line: Vec<MoveOp> = tree.principal_variation(8).iter().map(|m| m.op).collect();
        assert_eq!(line, vec![MoveOp::Resign, MoveOp::Done]);
        assert_eq!(tree.principal_variation(1).len(), 1);

        let empty: MCTSTree<Move> = MCTSTree::new(WHITE, 2);
        assert!(empty.principal_variation(8).is_empty());
    }

    #[test]
    fn test_stats() {
        let mut tree = small_tree();
        tree.get_mut(NodeId(1)).terminal = Some(PlayerMap::with_value(2, 1.0));

        let stats = tree.stats();
        assert_eq!(stats.node_count, 2);
        assert_eq!(stats.max_depth, 1);
        assert_eq!(stats.terminal_count, 1);
        assert_eq!(stats.total_edges, 3);
        assert_eq!(stats.expanded_edges, 1);
        assert_eq!(stats.branching_factor(), 1.5);
    }
}
