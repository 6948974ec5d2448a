//! # mcts-uct
//!
//! A generic Monte Carlo Tree Search (MCTS) engine using the UCT selection rule.
//!
//! The engine searches any perfect-information decision process with two
//! signed outcomes: the caller implements [`GameState`], and the engine grows
//! a search tree from a given state and returns the most promising action.
//!
//! ## Features
//!
//! - Generic over the decision process and its action type
//! - Wall-clock or fixed-iteration budgets
//! - Pluggable rollout policies (random playout, heuristics, mixtures, closures)
//! - A concurrent engine that batches rollouts across a worker pool while a
//!   single coordinator owns every tree update
//! - Seedable randomness for reproducible searches
//! - Search statistics and tree visualization
//!
//! ## Basic Usage
//!
//! ```
//! use mcts_uct::{GameState, MCTSConfig, Player, MCTS};
//!
//! // Players alternately add 1 or 2 to a running total; whoever reaches 4 wins.
//! #[derive(Clone, Debug)]
//! struct RaceToFour {
//!     total: u8,
//!     player: Player,
//! }
//!
//! impl GameState for RaceToFour {
//!     type Action = u8;
//!
//!     fn get_current_player(&self) -> Player {
//!         self.player
//!     }
//!
//!     fn get_possible_actions(&self) -> Vec<u8> {
//!         (1..=2).filter(|step| self.total + step <= 4).collect()
//!     }
//!
//!     fn take_action(&self, step: &u8) -> Self {
//!         RaceToFour {
//!             total: self.total + step,
//!             player: self.player.opponent(),
//!         }
//!     }
//!
//!     fn is_terminal(&self) -> bool {
//!         self.total == 4
//!     }
//!
//!     fn get_reward(&self) -> f64 {
//!         // The player who just moved reached 4
//!         -self.player.sign()
//!     }
//! }
//!
//! fn main() -> Result<(), mcts_uct::MCTSError> {
//!     let config = MCTSConfig::default()
//!         .with_iteration_limit(500)
//!         .with_seed(11);
//!
//!     let mut mcts = MCTS::new(config)?;
//!     let start = RaceToFour { total: 0, player: Player::Maximizer };
//!
//!     // Taking 1 leaves the opponent on 1, from where we can always reach 4
//!     assert_eq!(mcts.search(start)?, 1);
//!     println!("{}", mcts.get_statistics().summary());
//!     Ok(())
//! }
//! ```
//!
//! ## How It Works
//!
//! Every round runs four phases:
//!
//! 1. **Selection**: starting at the root, descend through fully expanded
//!    nodes by their UCT score, seen from the player to move at each node.
//! 2. **Expansion**: at the first node with an untried action, create the child
//!    for the first such action in the order the state lists them.
//! 3. **Simulation**: estimate the new node's value with the rollout policy.
//! 4. **Backpropagation**: add one visit and the reward to every node from the
//!    new one up to the root.
//!
//! Rewards are stored from the maximizer's perspective; the sign of the player
//! to move is applied only while ranking children. When the budget is spent,
//! the root's child with the best signed average reward is chosen.
//!
//! ## Concurrent Search
//!
//! [`ParallelMCTS`] selects one node per worker, rolls the batch out on a
//! rayon thread pool against private copies of the states, waits for all of
//! them, then backpropagates the rewards on the calling thread. With one
//! worker and the same seed it builds exactly the tree [`MCTS`] builds.

pub mod config;
pub mod game_state;
pub mod mcts;
pub mod parallel;
pub mod policy;
pub mod stats;
pub mod tree;
pub mod utils;

pub use config::{MCTSConfig, SearchBudget};
pub use game_state::{Action, GameState, Player};
pub use mcts::{SearchOutcome, MCTS};
pub use parallel::ParallelMCTS;
pub use policy::{HeuristicRollout, MixtureRollout, RandomRollout, RolloutPolicy, UCTPolicy};
pub use stats::SearchStatistics;
pub use tree::{MCTSNode, NodeId, SearchTree, ROOT};

/// Error types for the MCTS engines
#[derive(thiserror::Error, Debug)]
pub enum MCTSError {
    /// Both a time limit and an iteration limit were configured
    #[error("Conflicting budget: cannot have both a time limit and an iteration limit")]
    ConflictingBudget,

    /// Neither a time limit nor an iteration limit was configured
    #[error("Missing budget: must have either a time limit or an iteration limit")]
    MissingBudget,

    /// The iteration limit is below 1
    #[error("Invalid iteration limit {0}: must be at least 1")]
    InvalidIterationLimit(usize),

    /// The concurrent engine was configured with a time limit
    #[error("Incompatible budget type: concurrent search requires an iteration limit")]
    IncompatibleBudget,

    /// The concurrent engine was configured with no workers
    #[error("Invalid worker count {0}: must be at least 1")]
    InvalidWorkerCount(usize),

    /// A non-terminal state reported no legal actions
    #[error("Non-terminal state has no actions")]
    NoPossibleActions,

    /// The search was asked to start from a terminal state
    #[error("Cannot search from a terminal state")]
    TerminalRoot,

    /// A node marked fully expanded had no child to descend into
    #[error("Fully expanded node {0} has no children")]
    ChildlessNode(NodeId),

    /// The search ended without a child at the root
    #[error("Search finished without expanding the root")]
    EmptyTree,

    /// A rollout policy failed or returned a reward that is not finite
    #[error("Rollout failed: {0}")]
    RolloutFailed(String),

    /// A rollout panicked
    #[error("Worker {slot} failed: {message}")]
    WorkerFailed {
        /// Slot of the failed rollout within its batch (always 0 for sequential search)
        slot: usize,
        /// Panic message of the worker
        message: String,
    },

    /// The worker pool could not be created
    #[error("Could not build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Result type for MCTS operations
pub type Result<T> = std::result::Result<T, MCTSError>;
