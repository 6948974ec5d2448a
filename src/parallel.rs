//! Concurrent Monte Carlo Tree Search
//!
//! The concurrent engine runs rollouts in batches. For every batch the
//! coordinator (the thread calling `search`) selects one node per worker slot,
//! hands each worker a private copy of that node's state, waits for the whole
//! batch on a rayon thread pool, and then backpropagates the rewards one by
//! one. Workers never see the tree, so the tree needs no locking: the
//! coordinator is its only writer.

use std::time::Instant;

use log::{debug, trace};
use rand::rngs::StdRng;
use rayon::prelude::*;

use crate::{
    config::MCTSConfig,
    game_state::GameState,
    mcts::{decide, engine_rng, guarded_rollout, new_tree, rollout_rng, select_node, SearchOutcome},
    policy::{
        selection::UCTPolicy,
        simulation::{RandomRollout, RolloutPolicy},
    },
    stats::SearchStatistics,
    tree::SearchTree,
    Result,
};

/// One rollout handed to a worker: its slot, a private state copy and its own rng
struct RolloutJob<S> {
    slot: usize,
    state: S,
    rng: StdRng,
}

/// The batched multi-worker Monte Carlo Tree Search engine
///
/// Only iteration budgets are supported: the budget is split into batches of
/// `workers` rollouts, with a smaller final batch when it does not divide
/// evenly.
///
/// # Example
///
/// ```
/// use mcts_uct::{GameState, MCTSConfig, ParallelMCTS, Player};
///
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
///     let config = MCTSConfig::default()
///         .with_iteration_limit(100)
///         .with_workers(4)
///         .with_seed(3);
///     let mut mcts = ParallelMCTS::new(config)?;
///
///     assert_eq!(mcts.search(PickOne(None))?, 2);
///     Ok(())
/// }
/// ```
pub struct ParallelMCTS<S: GameState> {
    config: MCTSConfig,

    iterations: usize,

    workers: usize,

    selection_policy: UCTPolicy,

    rollout_policy: Box<dyn RolloutPolicy<S>>,

    rng: StdRng,

    pool: rayon::ThreadPool,

    statistics: SearchStatistics,
}

impl<S: GameState + 'static> ParallelMCTS<S> {
    /// Creates a new engine and its worker pool
    ///
    /// # Errors
    ///
    /// Besides the budget errors of [`MCTS::new`](crate::MCTS::new), returns
    /// [`crate::MCTSError::IncompatibleBudget`] for a time limit and
    /// [`crate::MCTSError::InvalidWorkerCount`] for zero workers. No worker thread
    /// is started in either case.
    pub fn new(config: MCTSConfig) -> Result<Self> {
        let (iterations, workers) = config.parallel_budget()?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|index| format!("mcts-worker-{}", index))
            .build()?;

        Ok(ParallelMCTS {
            selection_policy: UCTPolicy::new(config.exploration_constant),
            rollout_policy: Box::new(RandomRollout::new()),
            rng: engine_rng(&config),
            statistics: SearchStatistics::new(),
            iterations,
            workers,
            pool,
            config,
        })
    }

    /// Sets the rollout policy to use
    pub fn with_rollout_policy<P: RolloutPolicy<S> + 'static>(mut self, policy: P) -> Self {
        self.rollout_policy = Box::new(policy);
        self
    }

    /// Replaces the coordinator's random number generator
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
    pub fn build_tree(&mut self, initial_state: S) -> Result<SearchTree<S>> {
        let mut tree = new_tree(initial_state)?;
        let mut statistics = SearchStatistics::new();
        statistics.workers = self.workers;

        debug!(
            "Starting parallel search: iterations={}, workers={}, exploration_constant={}",
            self.iterations, self.workers, self.selection_policy.exploration_constant
        );

        let start_time = Instant::now();
        let mut remaining = self.iterations;

        while remaining > 0 {
            let batch_size = remaining.min(self.workers);
            self.execute_batch(&mut tree, batch_size)?;

            remaining -= batch_size;
            statistics.iterations += batch_size;
            statistics.batches += 1;
            trace!(
                "Batch {} done: {} rollouts, {} nodes",
                statistics.batches,
                batch_size,
                tree.len()
            );
        }

        statistics.total_time = start_time.elapsed();
        statistics.record_tree(&tree);
        debug!("{}", statistics.summary());
        self.statistics = statistics;

        Ok(tree)
    }

    /// Selects, rolls out and backpropagates one batch of `batch_size` rounds
    fn execute_batch(&mut self, tree: &mut SearchTree<S>, batch_size: usize) -> Result<()> {
        // Fan out: pick one node per slot on the coordinator
        let mut nodes = Vec::with_capacity(batch_size);
        let mut jobs = Vec::with_capacity(batch_size);
        for slot in 0..batch_size {
            let node = select_node(tree, &self.selection_policy, &mut self.rng)?;
            jobs.push(RolloutJob {
                slot,
                state: tree.node(node).state.clone(),
                rng: rollout_rng(&mut self.rng),
            });
            nodes.push(node);
        }

        // Barrier: every worker finishes before any result is used
        let policy: &dyn RolloutPolicy<S> = &*self.rollout_policy;
        let outcomes: Vec<Result<(usize, f64)>> = self.pool.install(|| {
            jobs.into_par_iter()
                .map(|job| run_rollout(policy, job))
                .collect()
        });

        // Fan in: all tree writes happen here, one reward at a time
        let rewards = outcomes.into_iter().collect::<Result<Vec<_>>>()?;
        for (slot, reward) in rewards {
            tree.backpropagate(nodes[slot], reward);
        }

        Ok(())
    }

    /// Returns the statistics of the last search
    pub fn get_statistics(&self) -> &SearchStatistics {
        &self.statistics
    }
}

/// Runs one worker's rollout and tags the reward with its slot
fn run_rollout<S: GameState>(
    policy: &dyn RolloutPolicy<S>,
    job: RolloutJob<S>,
) -> Result<(usize, f64)> {
    let RolloutJob {
        slot,
        state,
        mut rng,
    } = job;

    guarded_rollout(policy, slot, &state, &mut rng).map(|reward| (slot, reward))
}
