//! Arithmetic helpers for the UCT selection rule
//!
//! Rewards are stored from the maximizer's perspective, so the exploitation
//! term is multiplied by the sign of the player to move at the parent.

/// Calculates the signed exploitation term for UCT
///
/// This is the average reward of the child, seen from the parent's player.
pub fn exploitation_term(sign: f64, total_reward: f64, visits: u64) -> f64 {
    if visits == 0 {
        return 0.0;
    }
    sign * total_reward / visits as f64
}

/// Natural logarithm of a visit count, clamped so that it is never negative
///
/// Counts of 0 and 1 both map to 0.
pub fn guarded_ln(visits: u64) -> f64 {
    (visits.max(1) as f64).ln()
}

/// Calculates the exploration term for UCT
///
/// This is the term that encourages exploration of less-visited nodes.
pub fn exploration_term(parent_visits: u64, child_visits: u64, exploration_constant: f64) -> f64 {
    if child_visits == 0 {
        return f64::INFINITY;
    }
    if exploration_constant == 0.0 {
        return 0.0;
    }

    exploration_constant * (guarded_ln(parent_visits) / child_visits as f64).sqrt()
}

/// Calculates the UCT score of a child
///
/// ```text
/// score = sign * total_reward / visits + c * sqrt(ln(parent_visits) / visits)
/// ```
pub fn uct_value(
    sign: f64,
    total_reward: f64,
    visits: u64,
    parent_visits: u64,
    exploration_constant: f64,
) -> f64 {
    if visits == 0 {
        return f64::INFINITY;
    }

    exploitation_term(sign, total_reward, visits)
        + exploration_term(parent_visits, visits, exploration_constant)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guarded_ln_never_negative() {
        assert_eq!(guarded_ln(0), 0.0);
        assert_eq!(guarded_ln(1), 0.0);
        assert!((guarded_ln(10) - 10f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_exploration_term_is_finite_for_small_parents() {
        assert_eq!(exploration_term(0, 3, 1.4), 0.0);
        assert_eq!(exploration_term(1, 1, 1.4), 0.0);
        assert!(exploration_term(0, 0, 1.4).is_infinite());
    }

    #[test]
    fn test_uct_value_applies_sign() {
        let max = uct_value(1.0, 3.0, 4, 10, 0.0);
        let min = uct_value(-1.0, 3.0, 4, 10, 0.0);
        assert!((max - 0.75).abs() < 1e-12);
        assert!((min + 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_uct_value_exploration_bonus() {
        let c = std::f64::consts::SQRT_2;
        let value = uct_value(1.0, 1.0, 2, 8, c);
        let expected = 0.5 + c * (8f64.ln() / 2.0).sqrt();
        assert!((value - expected).abs() < 1e-12);
    }
}
