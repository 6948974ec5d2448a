//! Policies for the phases of the MCTS algorithm
//!
//! - Selection: how to choose which child to descend into
//! - Simulation: how to estimate the value of a newly reached state

pub mod selection;
pub mod simulation;

pub use selection::UCTPolicy;
pub use simulation::{HeuristicRollout, MixtureRollout, RandomRollout, RolloutPolicy};
