//! Capital reallocation weights
//!
//! Kelly-style weighting: each agent's weight is proportional to its edge
//! (expected value per trade) divided by its average loss, capped so no
//! single agent concentrates the book.

use std::collections::HashMap;

use rust_decimal::Decimal;

/// Performance stats for one agent over the lookback window
#[derive(Debug, Clone, Copy)]
pub struct AgentStats {
    /// Fraction of winning trades, 0-1
    pub win_rate: Decimal,
    /// Average winning trade P&L
    pub avg_win: Decimal,
    /// Average losing trade magnitude (positive)
    pub avg_loss: Decimal,
}

impl AgentStats {
    /// Expected value per trade
    pub fn edge(&self) -> Decimal {
        self.win_rate * self.avg_win - (Decimal::ONE - self.win_rate) * self.avg_loss
    }

    /// Unnormalized weight candidate: positive edge per unit of loss risk.
    /// An agent with no recorded losses is weighted by its raw edge.
    fn weight_candidate(&self) -> Decimal {
        let edge = self.edge().max(Decimal::ZERO);
        if self.avg_loss > Decimal::ZERO {
            edge / self.avg_loss
        } else {
            edge
        }
    }
}

/// Compute normalized allocation weights, sum exactly 1
///
/// Weights are capped at `max_allocation` with the excess redistributed
/// proportionally among uncapped agents. When no agent has positive edge,
/// or when the cap is infeasible for the agent count, weights fall back to
/// an equal split.
pub fn compute_weights(
    stats: &HashMap<String, AgentStats>,
    max_allocation: Decimal,
) -> HashMap<String, Decimal> {
    if stats.is_empty() {
        return HashMap::new();
    }

    let n = Decimal::from(stats.len());
    let equal = Decimal::ONE / n;

    // A cap below the equal split cannot sum to 1
    let cap = max_allocation.max(equal);

    let candidates: HashMap<&String, Decimal> = stats
        .iter()
        .map(|(id, s)| (id, s.weight_candidate()))
        .collect();

    let total: Decimal = candidates.values().copied().sum();
    if total <= Decimal::ZERO {
        return stats.keys().map(|id| (id.clone(), equal)).collect();
    }

    let mut weights: HashMap<String, Decimal> = candidates
        .into_iter()
        .map(|(id, w)| (id.clone(), w / total))
        .collect();

    // Iteratively clamp and redistribute until no weight exceeds the cap.
    // Terminates within n iterations: each pass fixes at least one agent.
    for _ in 0..stats.len() {
        let excess: Decimal = weights
            .values()
            .filter(|w| **w > cap)
            .map(|w| *w - cap)
            .sum();
        if excess.is_zero() {
            break;
        }

        let uncapped_total: Decimal = weights.values().filter(|w| **w < cap).copied().sum();
        let uncapped_count = weights.values().filter(|w| **w < cap).count();
        if uncapped_count == 0 {
            break;
        }

        for w in weights.values_mut() {
            if *w > cap {
                *w = cap;
            } else if *w < cap {
                if uncapped_total > Decimal::ZERO {
                    *w += excess * (*w / uncapped_total);
                } else {
                    // Zero-weight remainders: spread the excess equally
                    *w += excess / Decimal::from(uncapped_count);
                }
            }
        }
    }

    weights
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn stats(win_rate: Decimal, avg_win: Decimal, avg_loss: Decimal) -> AgentStats {
        AgentStats {
            win_rate,
            avg_win,
            avg_loss,
        }
    }

    fn sum(weights: &HashMap<String, Decimal>) -> Decimal {
        weights.values().copied().sum()
    }

    #[test]
    fn test_edge_formula() {
        // 0.6 * 200 - 0.4 * 100 = 80
        let s = stats(dec!(0.6), dec!(200), dec!(100));
        assert_eq!(s.edge(), dec!(80));
    }

    #[test]
    fn test_negative_edge_gets_zero_candidate() {
        let s = stats(dec!(0.3), dec!(100), dec!(200));
        assert!(s.edge() < dec!(0));
        assert_eq!(s.weight_candidate(), dec!(0));
    }

    #[test]
    fn test_weights_sum_to_one() {
        let mut input = HashMap::new();
        input.insert("a".to_string(), stats(dec!(0.6), dec!(200), dec!(100)));
        input.insert("b".to_string(), stats(dec!(0.55), dec!(150), dec!(100)));
        input.insert("c".to_string(), stats(dec!(0.5), dec!(120), dec!(100)));

        let weights = compute_weights(&input, dec!(0.40));
        assert!((sum(&weights) - dec!(1)).abs() < dec!(0.0000001));
    }

    #[test]
    fn test_stronger_edge_gets_more_capital() {
        let mut input = HashMap::new();
        input.insert("strong".to_string(), stats(dec!(0.7), dec!(200), dec!(100)));
        input.insert("weak".to_string(), stats(dec!(0.52), dec!(110), dec!(100)));
        input.insert("mid".to_string(), stats(dec!(0.6), dec!(150), dec!(100)));

        let weights = compute_weights(&input, dec!(0.9));
        assert!(weights["strong"] > weights["mid"]);
        assert!(weights["mid"] > weights["weak"]);
    }

    #[test]
    fn test_cap_and_redistribution() {
        let mut input = HashMap::new();
        // One dominant agent would take nearly everything uncapped
        input.insert("dominant".to_string(), stats(dec!(0.9), dec!(500), dec!(50)));
        input.insert("b".to_string(), stats(dec!(0.55), dec!(110), dec!(100)));
        input.insert("c".to_string(), stats(dec!(0.55), dec!(110), dec!(100)));

        let weights = compute_weights(&input, dec!(0.40));
        assert!(weights["dominant"] <= dec!(0.40) + dec!(0.0000001));
        assert!((sum(&weights) - dec!(1)).abs() < dec!(0.0000001));
        // Redistributed excess lands on the others proportionally
        assert!(weights["b"] > dec!(0.25));
    }

    #[test]
    fn test_no_positive_edge_equal_split() {
        let mut input = HashMap::new();
        input.insert("a".to_string(), stats(dec!(0.3), dec!(50), dec!(100)));
        input.insert("b".to_string(), stats(dec!(0.2), dec!(80), dec!(100)));

        let weights = compute_weights(&input, dec!(0.40));
        assert_eq!(weights["a"], dec!(0.5));
        assert_eq!(weights["b"], dec!(0.5));
    }

    #[test]
    fn test_zero_loss_agent_uses_raw_edge() {
        let mut input = HashMap::new();
        input.insert("perfect".to_string(), stats(dec!(1), dec!(100), dec!(0)));
        input.insert("normal".to_string(), stats(dec!(0.6), dec!(200), dec!(100)));

        let weights = compute_weights(&input, dec!(0.9));
        assert!(weights["perfect"] > dec!(0));
        assert!((sum(&weights) - dec!(1)).abs() < dec!(0.0000001));
    }

    #[test]
    fn test_infeasible_cap_falls_back_to_equal() {
        let mut input = HashMap::new();
        input.insert("a".to_string(), stats(dec!(0.9), dec!(500), dec!(50)));
        input.insert("b".to_string(), stats(dec!(0.51), dec!(101), dec!(100)));

        // 40% cap cannot hold for two agents; effective cap is 50%
        let weights = compute_weights(&input, dec!(0.40));
        assert_eq!(weights["a"], dec!(0.5));
        assert!((sum(&weights) - dec!(1)).abs() < dec!(0.0000001));
    }

    #[test]
    fn test_empty_input() {
        let weights = compute_weights(&HashMap::new(), dec!(0.40));
        assert!(weights.is_empty());
    }

    #[test]
    fn test_single_agent_gets_everything() {
        let mut input = HashMap::new();
        input.insert("solo".to_string(), stats(dec!(0.6), dec!(200), dec!(100)));

        let weights = compute_weights(&input, dec!(0.40));
        assert_eq!(weights["solo"], dec!(1));
    }
}
