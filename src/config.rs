//! Configuration options for the MCTS engines
//!
//! This module defines the parameters that control a search: its budget, the
//! exploration constant, the number of workers and the random seed.

use std::time::Duration;

use crate::{MCTSError, Result};

/// How long a search runs
///
/// Exactly one kind of budget is in effect for an engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchBudget {
    /// Run rounds until the wall-clock deadline has passed
    Time(Duration),

    /// Run exactly this many rounds
    Iterations(usize),
}

/// Configuration for the MCTS engines
///
/// Use the builder methods to create a configuration. It is validated when an
/// engine is constructed and again whenever a search starts.
///
/// # Example
///
/// ```
/// use mcts_uct::{MCTSConfig, SearchBudget};
///
/// let config = MCTSConfig::default()
///     .with_exploration_constant(1.0)
///     .with_iteration_limit(10_000)
///     .with_workers(4)
///     .with_seed(7);
///
/// assert_eq!(config.budget().unwrap(), SearchBudget::Iterations(10_000));
/// assert_eq!(config.parallel_budget().unwrap(), (10_000, 4));
/// ```
#[derive(Debug, Clone)]
pub struct MCTSConfig {
    /// Wall-clock time each search may take
    pub time_limit: Option<Duration>,

    /// Number of rounds each search runs
    pub iteration_limit: Option<usize>,

    /// Exploration constant for UCT
    ///
    /// Higher values favor exploration of less-visited nodes.
    /// The standard value is sqrt(2).
    pub exploration_constant: f64,

    /// Rollouts per batch in the concurrent engine
    pub workers: usize,

    /// Seed for the engine's random number generator
    ///
    /// `None` seeds from system entropy.
    pub seed: Option<u64>,
}

impl Default for MCTSConfig {
    fn default() -> Self {
        MCTSConfig {
            time_limit: None,
            iteration_limit: None,
            exploration_constant: std::f64::consts::SQRT_2,
            workers: 1,
            seed: None,
        }
    }
}

impl MCTSConfig {
    /// Sets the time each search may take
    pub fn with_time_limit(mut self, duration: Duration) -> Self {
        self.time_limit = Some(duration);
        self
    }

    /// Sets the number of rounds each search runs
    pub fn with_iteration_limit(mut self, iterations: usize) -> Self {
        self.iteration_limit = Some(iterations);
        self
    }

    /// Sets the exploration constant
    pub fn with_exploration_constant(mut self, constant: f64) -> Self {
        self.exploration_constant = constant;
        self
    }

    /// Sets the number of concurrent rollout workers
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Seeds the engine's random number generator
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates the configured limits and returns the single budget in effect
    pub fn budget(&self) -> Result<SearchBudget> {
        match (self.time_limit, self.iteration_limit) {
            (Some(_), Some(_)) => Err(MCTSError::ConflictingBudget),
            (None, None) => Err(MCTSError::MissingBudget),
            (Some(duration), None) => Ok(SearchBudget::Time(duration)),
            (None, Some(0)) => Err(MCTSError::InvalidIterationLimit(0)),
            (None, Some(iterations)) => Ok(SearchBudget::Iterations(iterations)),
        }
    }

    /// Validates the configuration for the concurrent engine
    ///
    /// Returns the iteration budget and the worker count.
    pub fn parallel_budget(&self) -> Result<(usize, usize)> {
        let iterations = match self.budget()? {
            SearchBudget::Iterations(iterations) => iterations,
            SearchBudget::Time(_) => return Err(MCTSError::IncompatibleBudget),
        };
        if self.workers == 0 {
            return Err(MCTSError::InvalidWorkerCount(self.workers));
        }
        Ok((iterations, self.workers))
    }
}
