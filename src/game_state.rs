//! Traits defining the decision process searched by MCTS.
//!
//! The [`GameState`] trait is the only interface a caller has to implement. Any
//! perfect-information process with two signed outcomes (a maximizer and a
//! minimizer) can be searched.

use std::fmt::Debug;
use std::hash::Hash;

/// Marker trait for actions that can be taken in a game
///
/// Two actions taken from the same state must compare equal (and hash equally)
/// if and only if they lead down the same branch of the tree.
pub trait Action: Clone + Debug + Eq + Hash + Send + Sync {}

impl<T> Action for T where T: Clone + Debug + Eq + Hash + Send + Sync {}

/// The side to move in a given state
///
/// Rewards are always reported from the maximizer's point of view. The player
/// only decides in which direction a node's children are ranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Player {
    /// Prefers larger rewards
    Maximizer,
    /// Prefers smaller rewards
    Minimizer,
}

impl Player {
    /// Returns `+1.0` for the maximizer and `-1.0` for the minimizer
    pub fn sign(self) -> f64 {
        match self {
            Player::Maximizer => 1.0,
            Player::Minimizer => -1.0,
        }
    }

    /// Returns the other player
    pub fn opponent(self) -> Self {
        match self {
            Player::Maximizer => Player::Minimizer,
            Player::Minimizer => Player::Maximizer,
        }
    }
}

/// Trait defining the decision process interface required for MCTS
///
/// States must be cheap enough to clone: the concurrent engine hands every
/// worker its own private copy of the state it rolls out.
pub trait GameState: Clone + Send + Sync {
    /// The type of actions that can be taken in this game
    type Action: Action;

    /// Returns the player whose turn it is in this state
    fn get_current_player(&self) -> Player;

    /// Returns the legal actions from this state, in a stable order
    ///
    /// Must be non-empty for every non-terminal state. A non-terminal state
    /// without actions aborts the search with
    /// [`MCTSError::NoPossibleActions`](crate::MCTSError::NoPossibleActions).
    ///
    /// # Example
    ///
    /// ```
    /// # use mcts_uct::{GameState, Player};
    /// # #[derive(Clone)]
    /// # struct MyGame { /* ... */ }
    /// # impl GameState for MyGame {
    /// # type Action = u8;
    /// # fn get_current_player(&self) -> Player { Player::Maximizer }
    /// fn get_possible_actions(&self) -> Vec<u8> {
    ///     // Return all valid moves in the current position
    ///     vec![0, 1, 2]
    /// }
    /// # fn take_action(&self, _action: &u8) -> Self { self.clone() }
    /// # fn is_terminal(&self) -> bool { false }
    /// # fn get_reward(&self) -> f64 { 0.0 }
    /// # }
    /// ```
    fn get_possible_actions(&self) -> Vec<Self::Action>;

    /// Returns the state that results from taking `action`
    ///
    /// This must not modify `self`: the search explores many continuations
    /// from the same state.
    fn take_action(&self, action: &Self::Action) -> Self;

    /// Returns true if no further actions can be taken
    fn is_terminal(&self) -> bool;

    /// Returns the reward of a terminal state
    ///
    /// Only called on terminal states. Larger values favor the maximizer.
    fn get_reward(&self) -> f64;
}
