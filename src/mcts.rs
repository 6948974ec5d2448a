//! Sequential implementation of the Monte Carlo Tree Search algorithm
//!
//! This module contains the single-threaded engine, orchestrating the four
//! phases of selection, expansion, simulation, and backpropagation. The
//! selection/expansion and final-decision steps are shared with the
//! concurrent engine in [`crate::parallel`].

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use log::{debug, warn};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    config::{MCTSConfig, SearchBudget},
    game_state::GameState,
    policy::{
        selection::UCTPolicy,
        simulation::{RandomRollout, RolloutPolicy},
    },
    stats::SearchStatistics,
    tree::{NodeId, SearchTree, ROOT},
    MCTSError, Result,
};

/// The result of a search, with the statistics behind the chosen action
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome<A> {
    /// The action chosen at the root
    pub action: A,

    /// Average reward of the child reached through `action`
    pub expected_reward: f64,

    /// Visits of the child reached through `action`
    pub visits: u64,
}

/// Creates the engine's random number generator
pub(crate) fn engine_rng(config: &MCTSConfig) -> StdRng {
    match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Derives the private generator handed to one rollout
pub(crate) fn rollout_rng(rng: &mut StdRng) -> StdRng {
    StdRng::seed_from_u64(rng.gen())
}

/// Creates a fresh tree for `initial_state`, refusing terminal roots
pub(crate) fn new_tree<S: GameState>(initial_state: S) -> Result<SearchTree<S>> {
    if initial_state.is_terminal() {
        return Err(MCTSError::TerminalRoot);
    }
    Ok(SearchTree::new(initial_state))
}

/// Selection and expansion: walks down from the root and returns the node to roll out
///
/// A non-terminal node that still has untried actions is expanded and the new
/// child is returned. A fully expanded node is descended by UCT once all its
/// children carry at least one visit, and uniformly at random before that, so
/// UCT never scores a child without visits.
pub(crate) fn select_node<S: GameState, R: Rng + ?Sized>(
    tree: &mut SearchTree<S>,
    policy: &UCTPolicy,
    rng: &mut R,
) -> Result<NodeId> {
    let mut node = ROOT;

    while !tree.node(node).is_terminal {
        if !tree.node(node).is_fully_expanded() {
            return tree.expand(node);
        }

        let next = if tree.all_children_visited(node) {
            tree.best_child(node, policy, rng)
        } else {
            policy.select_random_child(tree, node, rng)
        };

        node = next.ok_or(MCTSError::ChildlessNode(node))?;
    }

    Ok(node)
}

/// Runs one rollout for `slot` of a batch
///
/// A panicking policy becomes [`MCTSError::WorkerFailed`] and a reward that
/// is NaN or infinite becomes [`MCTSError::RolloutFailed`], so neither can
/// reach the tree.
pub(crate) fn guarded_rollout<S: GameState>(
    policy: &dyn RolloutPolicy<S>,
    slot: usize,
    state: &S,
    rng: &mut StdRng,
) -> Result<f64> {
    let reward = match panic::catch_unwind(AssertUnwindSafe(|| policy.rollout(state, rng))) {
        Ok(reward) => reward?,
        Err(payload) => {
            return Err(MCTSError::WorkerFailed {
                slot,
                message: panic_message(payload.as_ref()),
            })
        }
    };

    if !reward.is_finite() {
        return Err(MCTSError::RolloutFailed(format!("non-finite reward {}", reward)));
    }
    Ok(reward)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "rollout panicked".to_string()
    }
}

/// Picks the root's best child by pure exploitation
pub(crate) fn decide<S: GameState, R: Rng + ?Sized>(
    tree: &SearchTree<S>,
    rng: &mut R,
) -> Result<SearchOutcome<S::Action>> {
    let best = tree
        .best_child(ROOT, &UCTPolicy::greedy(), rng)
        .ok_or(MCTSError::EmptyTree)?;
    let child = tree.node(best);

    let action = child.action.clone().ok_or(MCTSError::EmptyTree)?;
    let expected_reward = child.average_reward().ok_or(MCTSError::EmptyTree)?;

    Ok(SearchOutcome {
        action,
        expected_reward,
        visits: child.visits(),
    })
}

/// The sequential Monte Carlo Tree Search engine
///
/// Every call to [`search`](MCTS::search) grows a brand new tree from the
/// given state, runs rounds until the configured budget is spent, and returns
/// the action leading to the root's best child.
///
/// # Example
///
/// ```
/// use mcts_uct::{GameState, MCTSConfig, Player, MCTS};
///
/// // Pick a number; 2 is the only winning choice.
/// #[derive(Clone)]
/// struct PickOne(Option<u8>);
///
/// impl GameState for PickOne {
///     type Action = u8;
///
///     fn get_current_player(&self) -> Player { Player::Maximizer }
///     fn get_possible_actions(&self) -> Vec<u8> { vec![1, 2, 3] }
///     fn take_action(&self, action: &u8) -> Self { PickOne(Some(*action)) }
///     fn is_terminal(&self) -> bool { self.0.is_some() }
///     fn get_reward(&self) -> f64 { if self.0 == Some(2) { 1.0 } else { 0.0 } }
/// }
///
/// fn main() -> Result<(), mcts_uct::MCTSError> {
///     let config = MCTSConfig::default().with_iteration_limit(100).with_seed(3);
///     let mut mcts = MCTS::new(config)?;
///
///     let outcome = mcts.search_with_details(PickOne(None))?;
///     assert_eq!(outcome.action, 2);
///     assert_eq!(outcome.expected_reward, 1.0);
///     Ok(())
/// }
/// ```
pub struct MCTS<S: GameState> {
    /// Configuration for the search
    config: MCTSConfig,

    /// The validated budget of every search
    budget: SearchBudget,

    /// Policy for descending fully expanded nodes
    selection_policy: UCTPolicy,

    /// Policy for estimating the value of newly reached states
    rollout_policy: Box<dyn RolloutPolicy<S>>,

    /// Source of all randomness in the search
    rng: StdRng,

    /// Statistics gathered during the last search
    statistics: SearchStatistics,
}

impl<S: GameState + 'static> MCTS<S> {
    /// Creates a new engine from a configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error unless exactly one of the time limit and
    /// the iteration limit is set, and the iteration limit is at least 1.
    pub fn new(config: MCTSConfig) -> Result<Self> {
        let budget = config.budget()?;

        Ok(MCTS {
            selection_policy: UCTPolicy::new(config.exploration_constant),
            rollout_policy: Box::new(RandomRollout::new()),
            rng: engine_rng(&config),
            statistics: SearchStatistics::new(),
            budget,
            config,
        })
    }

    /// Sets the rollout policy to use
    pub fn with_rollout_policy<P: RolloutPolicy<S> + 'static>(mut self, policy: P) -> Self {
        self.rollout_policy = Box::new(policy);
        self
    }

    /// Replaces the engine's random number generator
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// Returns the configuration of this engine
    pub fn config(&self) -> &MCTSConfig {
        &self.config
    }

    /// Runs the search and returns the best action
    pub fn search(&mut self, initial_state: S) -> Result<S::Action> {
        self.search_with_details(initial_state)
            .map(|outcome| outcome.action)
    }

    /// Runs the search and returns the best action with its expected reward
    pub fn search_with_details(&mut self, initial_state: S) -> Result<SearchOutcome<S::Action>> {
        let tree = self.build_tree(initial_state)?;
        decide(&tree, &mut self.rng)
    }

    /// Runs the search and returns the tree it built
    ///
    /// The tree belongs to the caller; the next call starts from a new root.
    pub fn build_tree(&mut self, initial_state: S) -> Result<SearchTree<S>> {
        let mut tree = new_tree(initial_state)?;
        let mut statistics = SearchStatistics::new();

        debug!(
            "Starting search: budget={:?}, exploration_constant={}",
            self.budget, self.selection_policy.exploration_constant
        );

        let start_time = Instant::now();

        match self.budget {
            SearchBudget::Iterations(iterations) => {
                for _ in 0..iterations {
                    self.execute_round(&mut tree)?;
                }
                statistics.iterations = iterations;
            }
            SearchBudget::Time(limit) => {
                let deadline = start_time + limit;
                loop {
                    if Instant::now() >= deadline {
                        if statistics.iterations > 0 {
                            break;
                        }
                        warn!("Time budget of {:?} elapsed before the first round", limit);
                    }

                    self.execute_round(&mut tree)?;
                    statistics.iterations += 1;
                }
                statistics.stopped_by_time = true;
            }
        }

        statistics.batches = statistics.iterations;
        statistics.total_time = start_time.elapsed();
        statistics.record_tree(&tree);
        debug!("{}", statistics.summary());
        self.statistics = statistics;

        Ok(tree)
    }

    /// Execute a single round of the MCTS algorithm
    fn execute_round(&mut self, tree: &mut SearchTree<S>) -> Result<()> {
        // 1. Selection and expansion
        let node = select_node(tree, &self.selection_policy, &mut self.rng)?;

        // 2. Simulation
        let mut rng = rollout_rng(&mut self.rng);
        let reward = guarded_rollout(&*self.rollout_policy, 0, &tree.node(node).state, &mut rng)?;

        // 3. Backpropagation
        tree.backpropagate(node, reward);

        Ok(())
    }

    /// Returns the statistics of the last search
    pub fn get_statistics(&self) -> &SearchStatistics {
        &self.statistics
    }
}
