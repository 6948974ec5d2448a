//! Per-search statistics
//!
//! Both engines fill in a fresh [`SearchStatistics`] on every search. The
//! sequential engine counts each round as its own batch; the concurrent
//! engine counts one batch per fan-out of at most `workers` rollouts.

use std::time::Duration;

use crate::{game_state::GameState, tree::SearchTree};

/// What the last search did and how long it took
#[derive(Debug, Clone)]
pub struct SearchStatistics {
    /// Rounds completed, which equals the root's visit count
    pub iterations: usize,

    /// Batches run; the last one is short when `workers` does not divide `iterations`
    pub batches: usize,

    /// Upper bound on rollouts per batch (1 for sequential search)
    pub workers: usize,

    /// Wall-clock time from the first selection to the last backpropagation
    pub total_time: Duration,

    /// Nodes in the finished tree, root included
    pub tree_size: usize,

    /// Depth of the deepest node, the root being at depth 0
    pub max_depth: usize,

    /// Whether the search ended because its time budget ran out
    pub stopped_by_time: bool,
}

impl SearchStatistics {
    /// Statistics of a search that has not run a round yet
    pub fn new() -> Self {
        SearchStatistics {
            iterations: 0,
            batches: 0,
            workers: 1,
            total_time: Duration::from_secs(0),
            tree_size: 1,
            max_depth: 0,
            stopped_by_time: false,
        }
    }

    /// Records the shape of the finished tree
    pub(crate) fn record_tree<S: GameState>(&mut self, tree: &SearchTree<S>) {
        self.tree_size = tree.len();
        self.max_depth = tree.max_depth();
    }

    /// Mean wall-clock microseconds per round, batch overhead included
    pub fn avg_time_per_iteration_us(&self) -> f64 {
        if self.iterations == 0 {
            return 0.0;
        }
        self.total_time.as_micros() as f64 / self.iterations as f64
    }

    /// Rounds per second of wall-clock time
    pub fn iterations_per_second(&self) -> f64 {
        if self.total_time.as_secs_f64() <= 0.0 {
            return 0.0;
        }
        self.iterations as f64 / self.total_time.as_secs_f64()
    }

    /// Multi-line report, logged at debug level after every search
    pub fn summary(&self) -> String {
        format!(
            "MCTS Search Statistics:\n\
             - Iterations: {}\n\
             - Batches: {} ({} workers)\n\
             - Total time: {:.3} seconds\n\
             - Tree size: {} nodes\n\
             - Max depth: {}\n\
             - Avg time per iteration: {:.3} µs\n\
             - Iterations per second: {:.1}\n\
             - Stopped by time: {}",
            self.iterations,
            self.batches,
            self.workers,
            self.total_time.as_secs_f64(),
            self.tree_size,
            self.max_depth,
            self.avg_time_per_iteration_us(),
            self.iterations_per_second(),
            self.stopped_by_time
        )
    }
}

impl Default for SearchStatistics {
    fn default() -> Self {
        Self::new()
    }
}
