use mcts_uct::{GameState, Player, SearchTree, UCTPolicy, ROOT};
use rand::{rngs::StdRng, SeedableRng};

/// Simple game state for testing
#[derive(Clone, Debug)]
struct TestGameState {
    player: Player,
    actions: Vec<u8>,
}

impl GameState for TestGameState {
    type Action = u8;

    fn get_current_player(&self) -> Player {
        self.player
    }

    fn get_possible_actions(&self) -> Vec<u8> {
        self.actions.clone()
    }

    fn take_action(&self, _action: &u8) -> Self {
        TestGameState {
            player: self.player.opponent(),
            actions: vec![0],
        }
    }

    fn is_terminal(&self) -> bool {
        false
    }

    fn get_reward(&self) -> f64 {
        0.0
    }
}

// Create a tree with specific statistics for policy testing
fn create_test_tree(player: Player) -> SearchTree<TestGameState> {
    let mut tree = SearchTree::new(TestGameState {
        player,
        actions: vec![0, 1, 2],
    });

    let high = tree.expand(ROOT).unwrap();
    let low = tree.expand(ROOT).unwrap();
    let rare = tree.expand(ROOT).unwrap();

    // Child 0: high value (0.9), many visits
    for _ in 0..50 {
        tree.backpropagate(high, 0.9);
    }
    // Child 1: low value (0.1), many visits
    for _ in 0..45 {
        tree.backpropagate(low, 0.1);
    }
    // Child 2: medium value (0.5), few visits
    for _ in 0..5 {
        tree.backpropagate(rare, 0.5);
    }

    tree
}

#[test]
fn test_uct_policy_exploitation() {
    let tree = create_test_tree(Player::Maximizer);
    let mut rng = StdRng::seed_from_u64(0);

    let selected = UCTPolicy::new(0.0).select_child(&tree, ROOT, &mut rng);
    assert_eq!(selected, tree.child(ROOT, &0), "Should select highest value child");
}

#[test]
fn test_uct_policy_exploitation_for_minimizer() {
    let tree = create_test_tree(Player::Minimizer);
    let mut rng = StdRng::seed_from_u64(0);

    let selected = UCTPolicy::new(0.0).select_child(&tree, ROOT, &mut rng);
    assert_eq!(selected, tree.child(ROOT, &1), "Minimizer prefers the lowest value");
}

#[test]
fn test_uct_policy_exploration() {
    let tree = create_test_tree(Player::Maximizer);
    let mut rng = StdRng::seed_from_u64(0);

    let selected = UCTPolicy::new(10.0).select_child(&tree, ROOT, &mut rng);
    assert_eq!(
        selected,
        tree.child(ROOT, &2),
        "Should select least visited child with high exploration"
    );
}

#[test]
fn test_uct_scores_match_formula() {
    let tree = create_test_tree(Player::Maximizer);
    let policy = UCTPolicy::default();
    let rare = tree.child(ROOT, &2).unwrap();

    let expected = 0.5 + std::f64::consts::SQRT_2 * ((100f64).ln() / 5.0).sqrt();
    assert!((policy.score(&tree, ROOT, rare) - expected).abs() < 1e-9);
}

#[test]
fn test_first_visit_has_no_exploration_bonus() {
    // Parent with a single visit: ln(1) = 0, so only the average counts
    let mut tree = SearchTree::new(TestGameState {
        player: Player::Maximizer,
        actions: vec![0],
    });
    let child = tree.expand(ROOT).unwrap();
    tree.backpropagate(child, 0.25);

    let score = UCTPolicy::new(5.0).score(&tree, ROOT, child);
    assert!(score.is_finite());
    assert!((score - 0.25).abs() < 1e-12);
}
