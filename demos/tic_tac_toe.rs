//! Tic-Tac-Toe demo for the MCTS engines
//!
//! X is played by the sequential engine, O by the concurrent engine. Set
//! `RUST_LOG=debug` to see the search statistics of every move.

use std::fmt;

use mcts_uct::{GameState, MCTSConfig, ParallelMCTS, Player, MCTS};

fn main() -> Result<(), mcts_uct::MCTSError> {
    // Initialize logging
    env_logger::init();

    println!("MCTS Tic-Tac-Toe Demo");
    println!("=====================");
    println!();

    let mut game = TicTacToe::new();

    let sequential_config = MCTSConfig::default().with_iteration_limit(10_000);
    let parallel_config = MCTSConfig::default()
        .with_iteration_limit(10_000)
        .with_workers(4);

    let mut x_engine = MCTS::new(sequential_config)?;
    let mut o_engine = ParallelMCTS::new(parallel_config)?;

    while !game.is_terminal() {
        println!("{}", game);

        let outcome = match game.current_player {
            Player::Maximizer => x_engine.search_with_details(game.clone())?,
            Player::Minimizer => o_engine.search_with_details(game.clone())?,
        };

        println!(
            "{} plays row {}, col {} (expected reward {:.3} over {} visits)",
            symbol(Some(game.current_player)),
            outcome.action / 3,
            outcome.action % 3,
            outcome.expected_reward,
            outcome.visits
        );
        println!();

        game = game.take_action(&outcome.action);
    }

    println!("{}", game);
    match game.get_winner() {
        Some(winner) => println!("{} wins!", symbol(Some(winner))),
        None => println!("It's a draw!"),
    }

    Ok(())
}

fn symbol(cell: Option<Player>) -> &'static str {
    match cell {
        Some(Player::Maximizer) => "X",
        Some(Player::Minimizer) => "O",
        None => ".",
    }
}

/// Tic-Tac-Toe game state
#[derive(Clone, Debug)]
struct TicTacToe {
    board: [Option<Player>; 9],
    current_player: Player,
    moves_played: usize,
}

impl TicTacToe {
    fn new() -> Self {
        TicTacToe {
            board: [None; 9],
            current_player: Player::Maximizer,
            moves_played: 0,
        }
    }

    fn get_winner(&self) -> Option<Player> {
        const LINES: [[usize; 3]; 8] = [
            [0, 1, 2],
            [3, 4, 5],
            [6, 7, 8],
            [0, 3, 6],
            [1, 4, 7],
            [2, 5, 8],
            [0, 4, 8],
            [2, 4, 6],
        ];

        for [a, b, c] in LINES {
            if self.board[a].is_some()
                && self.board[a] == self.board[b]
                && self.board[a] == self.board[c]
            {
                return self.board[a];
            }
        }

        None
    }
}

impl GameState for TicTacToe {
    type Action = usize;

    fn get_current_player(&self) -> Player {
        self.current_player
    }

    fn get_possible_actions(&self) -> Vec<usize> {
        (0..9).filter(|&i| self.board[i].is_none()).collect()
    }

    fn take_action(&self, index: &usize) -> Self {
        let mut new_state = self.clone();
        new_state.board[*index] = Some(self.current_player);
        new_state.moves_played = self.moves_played + 1;
        new_state.current_player = self.current_player.opponent();
        new_state
    }

    fn is_terminal(&self) -> bool {
        self.get_winner().is_some() || self.moves_played == 9
    }

    fn get_reward(&self) -> f64 {
        // X wins: +1, O wins: -1, draw: 0
        self.get_winner().map_or(0.0, Player::sign)
    }
}

impl fmt::Display for TicTacToe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  0 1 2")?;
        for row in 0..3 {
            write!(f, "{} ", row)?;
            for col in 0..3 {
                write!(f, "{} ", symbol(self.board[row * 3 + col]))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
