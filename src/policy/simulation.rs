//! Rollout policies for the MCTS algorithm
//!
//! A rollout policy estimates the value of a state, usually by playing it out
//! to the end. Rollouts operate on a state value only: they never see the tree,
//! which is what lets the concurrent engine run them on worker threads.

use rand::{seq::SliceRandom, Rng, RngCore};

use crate::{game_state::GameState, MCTSError, Result};

/// Trait for policies that estimate the value of a state
///
/// Implementations must be pure with respect to the search: the only inputs
/// are the state and the random number generator handed in by the engine.
/// Returning an error aborts the whole search. Both engines treat a panic
/// the same way and report it as [`MCTSError::WorkerFailed`], and a NaN or
/// infinite reward as [`MCTSError::RolloutFailed`].
///
/// Any `Fn(&S, &mut dyn RngCore) -> Result<f64>` closure is a rollout policy.
pub trait RolloutPolicy<S: GameState>: Send + Sync {
    /// Estimates the reward of `state`, from the maximizer's perspective
    fn rollout(&self, state: &S, rng: &mut dyn RngCore) -> Result<f64>;
}

impl<S, F> RolloutPolicy<S> for F
where
    S: GameState,
    F: Fn(&S, &mut dyn RngCore) -> Result<f64> + Send + Sync,
{
    fn rollout(&self, state: &S, rng: &mut dyn RngCore) -> Result<f64> {
        self(state, rng)
    }
}

/// Random rollout policy
///
/// Plays uniformly random legal actions until the state is terminal and
/// returns its reward. This is the default policy of both engines.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomRollout;

impl RandomRollout {
    /// Creates a new random policy
    pub fn new() -> Self {
        RandomRollout
    }
}

impl<S: GameState> RolloutPolicy<S> for RandomRollout {
    fn rollout(&self, state: &S, rng: &mut dyn RngCore) -> Result<f64> {
        let mut current = state.clone();

        while !current.is_terminal() {
            let actions = current.get_possible_actions();
            let action = actions.choose(rng).ok_or(MCTSError::NoPossibleActions)?;
            current = current.take_action(action);
        }

        Ok(current.get_reward())
    }
}

/// Heuristic rollout policy
///
/// Evaluates non-terminal states with a caller-supplied heuristic instead of
/// playing them out. Terminal states still report their true reward.
#[derive(Debug, Clone)]
pub struct HeuristicRollout<F> {
    heuristic: F,
}

impl<F> HeuristicRollout<F> {
    /// Creates a new heuristic policy with the given function
    pub fn new(heuristic: F) -> Self {
        HeuristicRollout { heuristic }
    }
}

impl<S, F> RolloutPolicy<S> for HeuristicRollout<F>
where
    S: GameState,
    F: Fn(&S) -> f64 + Send + Sync,
{
    fn rollout(&self, state: &S, _rng: &mut dyn RngCore) -> Result<f64> {
        if state.is_terminal() {
            return Ok(state.get_reward());
        }

        Ok((self.heuristic)(state))
    }
}

/// Mixture rollout policy
///
/// Picks one of several policies for each rollout, with probability
/// proportional to its weight.
pub struct MixtureRollout<S: GameState> {
    policies: Vec<(Box<dyn RolloutPolicy<S>>, f64)>,
}

impl<S: GameState> std::fmt::Debug for MixtureRollout<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MixtureRollout")
            .field("policies_count", &self.policies.len())
            .finish()
    }
}

impl<S: GameState> MixtureRollout<S> {
    /// Creates a new mixture policy
    pub fn new() -> Self {
        MixtureRollout {
            policies: Vec::new(),
        }
    }

    /// Adds a policy with the given weight
    ///
    /// Non-positive weights are ignored.
    pub fn add_policy<P: RolloutPolicy<S> + 'static>(mut self, policy: P, weight: f64) -> Self {
        if weight > 0.0 {
            self.policies.push((Box::new(policy), weight));
        }
        self
    }
}

impl<S: GameState> Default for MixtureRollout<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: GameState> RolloutPolicy<S> for MixtureRollout<S> {
    fn rollout(&self, state: &S, rng: &mut dyn RngCore) -> Result<f64> {
        let Some((last, _)) = self.policies.last() else {
            return RandomRollout.rollout(state, rng);
        };

        let total: f64 = self.policies.iter().map(|(_, weight)| *weight).sum();
        let r: f64 = rng.gen_range(0.0..total);

        let mut cumulative = 0.0;
        for (policy, weight) in &self.policies {
            cumulative += weight;
            if r < cumulative {
                return policy.rollout(state, rng);
            }
        }

        // Rounding left r just past the final bound
        last.rollout(state, rng)
    }
}
