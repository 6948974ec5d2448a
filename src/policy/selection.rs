//! Selection policy for the MCTS algorithm
//!
//! The selection policy decides which child to descend into during the
//! selection phase, balancing exploration and exploitation.

use rand::{seq::SliceRandom, Rng};

use crate::{
    game_state::GameState,
    tree::{NodeId, SearchTree},
    utils::uct_value,
};

/// Upper Confidence bound applied to Trees (UCT) selection policy
///
/// Scores every child `c` of a node `n` with:
///
/// ```text
/// UCT = sign(n) * total_reward(c) / visits(c) + c * sqrt(ln(visits(n)) / visits(c))
/// ```
///
/// Where:
/// - `sign(n)` is +1 when the maximizer moves at `n` and -1 otherwise
/// - `c` is the exploration constant
///
/// An exploration constant of 0 gives pure exploitation, which is how the
/// final action is chosen at the root. Exact ties are broken uniformly at
/// random.
#[derive(Debug, Clone, Copy)]
pub struct UCTPolicy {
    /// Exploration constant that controls the balance between exploration and exploitation.
    /// Higher values favor exploration of less-visited nodes.
    pub exploration_constant: f64,
}

impl UCTPolicy {
    /// Creates a new UCT policy with the given exploration constant
    pub fn new(exploration_constant: f64) -> Self {
        UCTPolicy {
            exploration_constant,
        }
    }

    /// Creates a policy that only exploits, used for the final decision
    pub fn greedy() -> Self {
        Self::new(0.0)
    }

    /// Scores `child` as seen from its parent `parent`
    pub fn score<S: GameState>(&self, tree: &SearchTree<S>, parent: NodeId, child: NodeId) -> f64 {
        let parent_node = tree.node(parent);
        let child_node = tree.node(child);

        uct_value(
            parent_node.state.get_current_player().sign(),
            child_node.total_reward(),
            child_node.visits(),
            parent_node.visits(),
            self.exploration_constant,
        )
    }

    /// Returns the child of `parent` with the highest score
    ///
    /// Returns `None` if `parent` has no children.
    pub fn select_child<S: GameState, R: Rng + ?Sized>(
        &self,
        tree: &SearchTree<S>,
        parent: NodeId,
        rng: &mut R,
    ) -> Option<NodeId> {
        let mut best_value = f64::NEG_INFINITY;
        let mut best_children = Vec::new();

        for child in tree.children(parent) {
            let value = self.score(tree, parent, child);

            if value > best_value {
                best_value = value;
                best_children.clear();
                best_children.push(child);
            } else if value == best_value {
                best_children.push(child);
            }
        }

        best_children.choose(rng).copied()
    }

    /// Returns a child of `parent` chosen uniformly at random
    pub fn select_random_child<S: GameState, R: Rng + ?Sized>(
        &self,
        tree: &SearchTree<S>,
        parent: NodeId,
        rng: &mut R,
    ) -> Option<NodeId> {
        let children: Vec<NodeId> = tree.children(parent).collect();
        children.choose(rng).copied()
    }
}

impl Default for UCTPolicy {
    fn default() -> Self {
        Self::new(std::f64::consts::SQRT_2)
    }
}
