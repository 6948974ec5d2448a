//! Tree data structures for Monte Carlo Tree Search
//!
//! The tree is an arena: every node lives in one `Vec` owned by the
//! [`SearchTree`] and is addressed by its [`NodeId`]. Children are owned by
//! their parent through the id mapping, and each child keeps a plain id back to
//! its parent for backpropagation. Nodes are never removed; the whole arena is
//! dropped when the search that built it is done.

use std::collections::HashMap;
use std::fmt;

use rand::Rng;

use crate::{game_state::GameState, policy::selection::UCTPolicy, MCTSError, Result};

/// Index of a node inside a [`SearchTree`]
pub type NodeId = usize;

/// Id of the root node of every tree
pub const ROOT: NodeId = 0;

/// Represents a node in the MCTS tree
///
/// Each node holds the state it stands for, the action that led to it and the
/// visit/reward statistics of every round whose path went through it.
pub struct MCTSNode<S: GameState> {
    /// The state at this node, never modified after creation
    pub state: S,

    /// The action that led to this state (None for root)
    pub action: Option<S::Action>,

    /// Parent node (None for root)
    pub parent: Option<NodeId>,

    /// Depth of this node in the tree (root = 0)
    pub depth: usize,

    /// Whether `state` is terminal, fixed at creation
    pub is_terminal: bool,

    children: HashMap<S::Action, NodeId>,

    /// Children in creation order, so iteration does not depend on hashing
    child_order: Vec<NodeId>,

    visits: u64,

    total_reward: f64,

    fully_expanded: bool,

    all_children_visited: bool,
}

impl<S: GameState> MCTSNode<S> {
    fn new(state: S, action: Option<S::Action>, parent: Option<NodeId>, depth: usize) -> Self {
        let is_terminal = state.is_terminal();

        MCTSNode {
            state,
            action,
            parent,
            depth,
            is_terminal,
            children: HashMap::new(),
            child_order: Vec::new(),
            visits: 0,
            total_reward: 0.0,
            fully_expanded: is_terminal,
            all_children_visited: false,
        }
    }

    /// Returns the number of rounds that passed through this node
    pub fn visits(&self) -> u64 {
        self.visits
    }

    /// Returns the sum of all rewards backpropagated through this node
    pub fn total_reward(&self) -> f64 {
        self.total_reward
    }

    /// Returns the average reward, or `None` before the first visit
    pub fn average_reward(&self) -> Option<f64> {
        if self.visits == 0 {
            return None;
        }
        Some(self.total_reward / self.visits as f64)
    }

    /// Returns true if every legal action has a child, or the node is terminal
    pub fn is_fully_expanded(&self) -> bool {
        self.fully_expanded
    }

    /// Returns true if this node has no children
    pub fn is_leaf(&self) -> bool {
        self.child_order.is_empty()
    }

    /// Returns the number of children
    pub fn num_children(&self) -> usize {
        self.child_order.len()
    }

    /// Adds one visit and `reward` to the statistics
    pub(crate) fn record_visit(&mut self, reward: f64) {
        self.visits += 1;
        self.total_reward += reward;
    }
}

impl<S: GameState> fmt::Display for MCTSNode<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MCTSNode {{totalReward: {}, numVisits: {}, isTerminal: {}, possibleActions: [",
            self.total_reward, self.visits, self.is_terminal
        )?;
        let mut first = true;
        for action in self.children.keys() {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{:?}", action)?;
            first = false;
        }
        write!(f, "]}}")
    }
}

/// The search tree built by one call to a search engine
pub struct SearchTree<S: GameState> {
    nodes: Vec<MCTSNode<S>>,
    max_depth: usize,
}

impl<S: GameState> SearchTree<S> {
    /// Creates a tree holding only a root for `state`
    pub fn new(state: S) -> Self {
        SearchTree {
            nodes: vec![MCTSNode::new(state, None, None, 0)],
            max_depth: 0,
        }
    }

    /// Returns the root node
    pub fn root(&self) -> &MCTSNode<S> {
        &self.nodes[ROOT]
    }

    /// Returns the node with the given id
    ///
    /// # Panics
    ///
    /// Panics if `id` was not handed out by this tree.
    pub fn node(&self, id: NodeId) -> &MCTSNode<S> {
        &self.nodes[id]
    }

    /// Returns the number of nodes in the tree
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a tree holds at least its root
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the depth of the deepest node
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Iterates over the children of `id` in creation order
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[id].child_order.iter().copied()
    }

    /// Returns the child of `id` reached through `action`, if it exists
    pub fn child(&self, id: NodeId, action: &S::Action) -> Option<NodeId> {
        self.nodes[id].children.get(action).copied()
    }

    /// Returns the child of `id` that `policy` scores highest
    ///
    /// Ties are broken with `rng`. Returns `None` if `id` has no children.
    pub fn best_child<R: Rng + ?Sized>(
        &self,
        id: NodeId,
        policy: &UCTPolicy,
        rng: &mut R,
    ) -> Option<NodeId> {
        policy.select_child(self, id, rng)
    }

    /// Attaches `state` as the child of `parent` reached through `action`
    ///
    /// If that child already exists it is returned unchanged, so an action
    /// never maps to two children.
    pub fn add_child(&mut self, parent: NodeId, action: S::Action, state: S) -> NodeId {
        if let Some(existing) = self.child(parent, &action) {
            return existing;
        }
        debug_assert!(
            !self.nodes[parent].is_terminal,
            "terminal nodes never get children"
        );

        let id = self.nodes.len();
        let depth = self.nodes[parent].depth + 1;
        self.nodes.push(MCTSNode::new(state, Some(action.clone()), Some(parent), depth));

        let parent_node = &mut self.nodes[parent];
        parent_node.children.insert(action, id);
        parent_node.child_order.push(id);
        parent_node.all_children_visited = false;
        self.max_depth = self.max_depth.max(depth);

        id
    }

    /// Expands `id` with the first legal action that has no child yet
    ///
    /// Actions are taken in the order the state enumerates them. The node is
    /// marked fully expanded once the last missing action has a child.
    ///
    /// # Errors
    ///
    /// [`MCTSError::NoPossibleActions`] if the state is non-terminal but has
    /// no legal actions.
    pub fn expand(&mut self, id: NodeId) -> Result<NodeId> {
        let actions = self.nodes[id].state.get_possible_actions();
        if actions.is_empty() {
            return Err(MCTSError::NoPossibleActions);
        }

        let total = actions.len();
        let action = actions
            .into_iter()
            .find(|action| !self.nodes[id].children.contains_key(action));

        match action {
            Some(action) => {
                let state = self.nodes[id].state.take_action(&action);
                let child = self.add_child(id, action, state);
                if self.nodes[id].children.len() >= total {
                    self.nodes[id].fully_expanded = true;
                }
                Ok(child)
            }
            None => {
                // Every action already has a child
                self.nodes[id].fully_expanded = true;
                Ok(id)
            }
        }
    }

    /// Returns true once every child of `id` has at least one visit
    ///
    /// Nodes without children report false. A positive answer is cached on
    /// the node, since visit counts only ever grow.
    pub fn all_children_visited(&mut self, id: NodeId) -> bool {
        let node = &self.nodes[id];
        if node.all_children_visited {
            return true;
        }
        if node.child_order.is_empty() {
            return false;
        }

        let visited = node
            .child_order
            .iter()
            .all(|&child| self.nodes[child].visits > 0);
        self.nodes[id].all_children_visited = visited;
        visited
    }

    /// Adds one visit and `reward` to `id` and every ancestor up to the root
    ///
    /// The reward is added unmodified at every level.
    pub fn backpropagate(&mut self, id: NodeId, reward: f64) {
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = &mut self.nodes[node_id];
            node.record_visit(reward);
            current = node.parent;
        }
    }

    /// Returns the ids from `id` up to and including the root
    pub fn path_to_root(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = vec![id];
        let mut current = self.nodes[id].parent;
        while let Some(parent) = current {
            path.push(parent);
            current = self.nodes[parent].parent;
        }
        path
    }

    /// Returns a textual dump of the tree
    pub fn visualize(&self) -> String {
        let mut output = String::new();
        self.visualize_node(ROOT, &mut output);
        output
    }

    fn visualize_node(&self, id: NodeId, output: &mut String) {
        let node = &self.nodes[id];
        let indent = "  ".repeat(node.depth);
        let action_str = match &node.action {
            Some(action) => format!("{:?}", action),
            None => "Root".to_string(),
        };

        output.push_str(&format!(
            "{}{} (visits: {}, value: {:.3})\n",
            indent,
            action_str,
            node.visits,
            node.average_reward().unwrap_or(0.0)
        ));

        for child in self.children(id) {
            self.visualize_node(child, output);
        }
    }
}
