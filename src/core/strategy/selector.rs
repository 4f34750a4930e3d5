//! Strategy Selector: maker/taker/hybrid decision table (spec §4.4).

use rust_decimal_macros::dec;

use crate::core::domain::Price;

/// Execution mode chosen for an opportunity's dual-side dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStrategy {
    /// Passive limit orders one tick below the observed ask, both sides.
    Maker,
    /// Cross the ask immediately on both sides.
    Taker,
    /// Passive on the thinner-liquidity side, cross the other.
    Hybrid,
}

/// Decision inputs carried alongside a detected opportunity.
#[derive(Debug, Clone, Copy)]
pub struct SelectionInput {
    pub seconds_to_expiry: i64,
    pub margin: Price,
    pub combined_cost: Price,
}

impl SelectionInput {
    #[must_use]
    pub fn can_absorb_fees(&self, taker_fee_rate: Price) -> bool {
        self.margin > (self.combined_cost * taker_fee_rate) * dec!(2)
    }
}

/// Pure decision-table lookup; no I/O, no mutable state.
#[must_use]
pub fn select_strategy(input: &SelectionInput, taker_fee_rate: Price) -> ExecutionStrategy {
    let can_absorb = input.can_absorb_fees(taker_fee_rate);

    match input.seconds_to_expiry {
        s if s > 120 => ExecutionStrategy::Maker,
        60..=120 if can_absorb => ExecutionStrategy::Hybrid,
        60..=120 => ExecutionStrategy::Maker,
        30..=59 if can_absorb => ExecutionStrategy::Taker,
        30..=59 => ExecutionStrategy::Hybrid,
        _ => ExecutionStrategy::Taker,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn input(seconds: i64, margin: Price, combined_cost: Price) -> SelectionInput {
        SelectionInput {
            seconds_to_expiry: seconds,
            margin,
            combined_cost,
        }
    }

    #[test]
    fn scenario_e_hybrid_when_absorbing_fees_in_60_to_120_window() {
        let input = input(90, dec!(0.04), dec!(0.96));
        assert!(input.can_absorb_fees(dec!(0.015)));
        assert_eq!(select_strategy(&input, dec!(0.015)), ExecutionStrategy::Hybrid);
    }

    #[test]
    fn long_horizon_is_always_maker() {
        let input = input(121, dec!(0.50), dec!(0.50));
        assert_eq!(select_strategy(&input, dec!(0.015)), ExecutionStrategy::Maker);
        let input = input(999, dec!(0.001), dec!(0.99));
        assert_eq!(select_strategy(&input, dec!(0.015)), ExecutionStrategy::Maker);
    }

    #[test]
    fn mid_window_without_fee_coverage_is_maker() {
        let input = input(100, dec!(0.001), dec!(0.99));
        assert!(!input.can_absorb_fees(dec!(0.015)));
        assert_eq!(select_strategy(&input, dec!(0.015)), ExecutionStrategy::Maker);
    }

    #[test]
    fn short_window_with_fee_coverage_is_taker() {
        let input = input(45, dec!(0.04), dec!(0.96));
        assert_eq!(select_strategy(&input, dec!(0.015)), ExecutionStrategy::Taker);
    }

    #[test]
    fn short_window_without_fee_coverage_is_hybrid() {
        let input = input(45, dec!(0.001), dec!(0.99));
        assert_eq!(select_strategy(&input, dec!(0.015)), ExecutionStrategy::Hybrid);
    }

    #[test]
    fn imminent_expiry_is_always_taker() {
        let input = input(10, dec!(0.001), dec!(0.99));
        assert_eq!(select_strategy(&input, dec!(0.015)), ExecutionStrategy::Taker);
        let input = input(0, dec!(0.5), dec!(0.5));
        assert_eq!(select_strategy(&input, dec!(0.015)), ExecutionStrategy::Taker);
    }

    #[test]
    fn boundary_at_exactly_120_seconds_uses_mid_window_rule() {
        let input = input(120, dec!(0.04), dec!(0.96));
        assert_eq!(select_strategy(&input, dec!(0.015)), ExecutionStrategy::Hybrid);
    }

    #[test]
    fn boundary_at_exactly_60_seconds_uses_mid_window_rule() {
        let input = input(60, dec!(0.001), dec!(0.99));
        assert_eq!(select_strategy(&input, dec!(0.015)), ExecutionStrategy::Maker);
    }

    #[test]
    fn boundary_at_exactly_30_seconds_uses_short_window_rule() {
        let input = input(30, dec!(0.04), dec!(0.96));
        assert_eq!(select_strategy(&input, dec!(0.015)), ExecutionStrategy::Taker);
    }
}
