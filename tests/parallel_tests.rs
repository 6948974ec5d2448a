use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use mcts_uct::{
    GameState, HeuristicRollout, MCTSConfig, MCTSError, NodeId, ParallelMCTS, Player, RolloutPolicy,
    SearchTree, MCTS, ROOT,
};
use rand::RngCore;

// Players alternately take 1..=3 counters from a pile; taking the last one wins.
#[derive(Clone, Debug)]
struct Nim {
    pile: u8,
    player: Player,
}

impl Nim {
    fn new(pile: u8) -> Self {
        Nim {
            pile,
            player: Player::Maximizer,
        }
    }
}

impl GameState for Nim {
    type Action = u8;

    fn get_current_player(&self) -> Player {
        self.player
    }

    fn get_possible_actions(&self) -> Vec<u8> {
        (1..=3).filter(|&take| take <= self.pile).collect()
    }

    fn take_action(&self, take: &u8) -> Self {
        Nim {
            pile: self.pile - take,
            player: self.player.opponent(),
        }
    }

    fn is_terminal(&self) -> bool {
        self.pile == 0
    }

    fn get_reward(&self) -> f64 {
        // The player who just moved took the last counter
        self.player.opponent().sign()
    }
}

#[derive(Clone, Debug)]
struct TwoDoors {
    opened: Option<char>,
}

impl GameState for TwoDoors {
    type Action = char;

    fn get_current_player(&self) -> Player {
        Player::Maximizer
    }

    fn get_possible_actions(&self) -> Vec<char> {
        vec!['A', 'B']
    }

    fn take_action(&self, action: &char) -> Self {
        TwoDoors {
            opened: Some(*action),
        }
    }

    fn is_terminal(&self) -> bool {
        self.opened.is_some()
    }

    fn get_reward(&self) -> f64 {
        match self.opened {
            Some('A') => 1.0,
            _ => 0.0,
        }
    }
}

// The root offers two actions, every deeper node four; play stops at depth 3
#[derive(Clone, Debug)]
struct Wide {
    depth: u8,
}

impl GameState for Wide {
    type Action = u8;

    fn get_current_player(&self) -> Player {
        Player::Maximizer
    }

    fn get_possible_actions(&self) -> Vec<u8> {
        if self.depth == 0 {
            vec![0, 1]
        } else {
            (0..4).collect()
        }
    }

    fn take_action(&self, _action: &u8) -> Self {
        Wide {
            depth: self.depth + 1,
        }
    }

    fn is_terminal(&self) -> bool {
        self.depth >= 3
    }

    fn get_reward(&self) -> f64 {
        0.0
    }
}

/// Collects (depth-first) action, visits and total reward of every node
fn snapshot(tree: &SearchTree<Nim>, id: NodeId, out: &mut Vec<(Option<u8>, u64, f64)>) {
    let node = tree.node(id);
    out.push((node.action, node.visits(), node.total_reward()));
    for child in tree.children(id) {
        snapshot(tree, child, out);
    }
}

#[test]
fn test_parallel_finds_winning_move() {
    // From 5, taking 1 leaves the opponent a multiple of 4
    let config = MCTSConfig::default()
        .with_iteration_limit(2_000)
        .with_workers(4)
        .with_seed(8);

    let mut mcts = ParallelMCTS::new(config).unwrap();
    assert_eq!(mcts.search(Nim::new(5)).unwrap(), 1);
}

#[test]
fn test_parallel_pure_exploitation_picks_the_better_door() {
    let config = MCTSConfig::default()
        .with_iteration_limit(100)
        .with_exploration_constant(0.0)
        .with_workers(3);

    let mut mcts = ParallelMCTS::new(config).unwrap();
    let outcome = mcts.search_with_details(TwoDoors { opened: None }).unwrap();

    assert_eq!(outcome.action, 'A');
    assert_eq!(outcome.expected_reward, 1.0);
}

#[test]
fn test_parallel_root_visits_equal_budget() {
    // 10 does not divide by 4: batches of 4, 4 and 2
    let config = MCTSConfig::default()
        .with_iteration_limit(10)
        .with_workers(4)
        .with_seed(2);

    let mut mcts = ParallelMCTS::new(config).unwrap();
    let tree = mcts.build_tree(Nim::new(12)).unwrap();

    assert_eq!(tree.root().visits(), 10);
    let stats = mcts.get_statistics();
    assert_eq!(stats.iterations, 10);
    assert_eq!(stats.batches, 3);
    assert_eq!(stats.workers, 4);
}

#[test]
fn test_single_worker_matches_sequential_search() {
    let config = MCTSConfig::default().with_iteration_limit(400).with_seed(31);

    let mut sequential = MCTS::new(config.clone()).unwrap();
    let mut parallel = ParallelMCTS::new(config.with_workers(1)).unwrap();

    let sequential_tree = sequential.build_tree(Nim::new(9)).unwrap();
    let parallel_tree = parallel.build_tree(Nim::new(9)).unwrap();

    let mut expected = Vec::new();
    let mut actual = Vec::new();
    snapshot(&sequential_tree, ROOT, &mut expected);
    snapshot(&parallel_tree, ROOT, &mut actual);

    assert_eq!(expected, actual);
}

#[test]
fn test_time_budget_is_incompatible() {
    let config = MCTSConfig::default()
        .with_time_limit(Duration::from_millis(20))
        .with_workers(2);

    let result = ParallelMCTS::<Nim>::new(config);
    assert!(matches!(result, Err(MCTSError::IncompatibleBudget)));
}

#[test]
fn test_zero_workers_rejected() {
    let config = MCTSConfig::default().with_iteration_limit(20).with_workers(0);
    let result = ParallelMCTS::<Nim>::new(config);
    assert!(matches!(result, Err(MCTSError::InvalidWorkerCount(0))));
}

#[test]
fn test_every_rollout_runs_exactly_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let policy = move |state: &Nim, _rng: &mut dyn RngCore| -> mcts_uct::Result<f64> {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(if state.pile % 4 == 0 { 1.0 } else { 0.0 })
    };

    let config = MCTSConfig::default()
        .with_iteration_limit(103)
        .with_workers(8)
        .with_seed(6);
    let mut mcts = ParallelMCTS::new(config).unwrap().with_rollout_policy(policy);
    mcts.search(Nim::new(20)).unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 103);
}

#[test]
fn test_rollout_error_aborts_search() {
    let policy = |state: &Nim, _rng: &mut dyn RngCore| -> mcts_uct::Result<f64> {
        if state.pile < 3 {
            return Err(MCTSError::RolloutFailed(format!("pile {} too small", state.pile)));
        }
        Ok(0.0)
    };

    let config = MCTSConfig::default()
        .with_iteration_limit(200)
        .with_workers(4)
        .with_seed(1);
    let mut mcts = ParallelMCTS::new(config).unwrap().with_rollout_policy(policy);

    assert!(matches!(
        mcts.search(Nim::new(6)),
        Err(MCTSError::RolloutFailed(_))
    ));
}

#[test]
fn test_worker_panic_becomes_error() {
    let policy = HeuristicRollout::new(|state: &Nim| -> f64 {
        if state.pile == 2 {
            panic!("cannot evaluate a pile of two");
        }
        0.0
    });

    let config = MCTSConfig::default()
        .with_iteration_limit(200)
        .with_workers(4)
        .with_seed(12);
    let mut mcts = ParallelMCTS::new(config).unwrap().with_rollout_policy(policy);

    match mcts.search(Nim::new(4)) {
        Err(MCTSError::WorkerFailed { message, .. }) => {
            assert!(message.contains("pile of two"));
        }
        other => panic!("expected a worker failure, got {:?}", other),
    }
}

#[test]
fn test_rollouts_receive_private_state_copies() {
    struct PileRecorder;

    impl RolloutPolicy<Nim> for PileRecorder {
        fn rollout(&self, state: &Nim, rng: &mut dyn RngCore) -> mcts_uct::Result<f64> {
            let mut local = state.clone();
            // Playing on the copy must not leak into the tree
            while !local.is_terminal() {
                let take = 1 + (rng.next_u32() % 3) as u8;
                local = local.take_action(&take.min(local.pile));
            }
            Ok(local.get_reward())
        }
    }

    let config = MCTSConfig::default()
        .with_iteration_limit(64)
        .with_workers(4)
        .with_seed(3);
    let mut mcts = ParallelMCTS::new(config).unwrap().with_rollout_policy(PileRecorder);
    let tree = mcts.build_tree(Nim::new(7)).unwrap();

    assert_eq!(tree.root().state.pile, 7);
    for child in tree.children(ROOT) {
        let node = tree.node(child);
        assert_eq!(node.state.pile, 7 - node.action.unwrap());
    }
}

#[test]
fn test_unvisited_children_are_descended_at_random_within_a_batch() {
    // Slots 0 and 1 expand the root. Slots 2 to 5 find the root fully
    // expanded with both children still unvisited, and must pick one at random.
    let mut both_subtrees_grew = 0;

    for seed in 0..20 {
        let config = MCTSConfig::default()
            .with_iteration_limit(6)
            .with_workers(6)
            .with_seed(seed);
        let mut mcts = ParallelMCTS::new(config).unwrap();
        let tree = mcts.build_tree(Wide { depth: 0 }).unwrap();

        assert_eq!(tree.root().visits(), 6);
        assert_eq!(mcts.get_statistics().batches, 1);

        let grandchildren: Vec<usize> = tree
            .children(ROOT)
            .map(|child| tree.children(child).count())
            .collect();
        assert_eq!(grandchildren.len(), 2);
        assert_eq!(grandchildren.iter().sum::<usize>(), 4, "seed {}", seed);

        if grandchildren.iter().all(|&count| count > 0) {
            both_subtrees_grew += 1;
        }
    }

    assert!(
        both_subtrees_grew > 0,
        "the later slots of a batch never spread over both root children"
    );
}

#[test]
fn test_non_finite_reward_aborts_search() {
    let policy = |_state: &Wide, _rng: &mut dyn RngCore| -> mcts_uct::Result<f64> { Ok(f64::NAN) };

    let config = MCTSConfig::default()
        .with_iteration_limit(20)
        .with_workers(4)
        .with_seed(5);
    let mut mcts = ParallelMCTS::new(config).unwrap().with_rollout_policy(policy);

    match mcts.search(Wide { depth: 0 }) {
        Err(MCTSError::RolloutFailed(message)) => assert!(message.contains("non-finite")),
        other => panic!("expected a rollout failure, got {:?}", other),
    }
}
