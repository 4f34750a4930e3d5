//! A detected cross-outcome arbitrage opportunity.

use std::time::Instant;

use super::id::{MarketId, TokenId};
use super::money::{Price, Volume};

/// A paired-ladder-walk result: buying `pairs` units of each token locks in
/// `per_pair_profit` per pair at resolution.
///
/// Invariant (checked by [`Opportunity::check_invariants`]):
/// `up_avg_price + down_avg_price + per_pair_profit == 1` within `1e-6`,
/// `per_pair_profit >= min_margin`, `pairs >= 1`.
#[derive(Debug, Clone)]
pub struct Opportunity {
    pub market: MarketId,
    pub up_token: TokenId,
    pub down_token: TokenId,
    pub up_avg_price: Price,
    pub down_avg_price: Price,
    pub pairs: Volume,
    pub per_pair_profit: Price,
    pub fee_rate_assumed: Price,
    pub detected_at_monotonic: Instant,
}

impl Opportunity {
    /// Whether the reported prices and profit satisfy the unit-value
    /// identity and the basic sizing invariants.
    #[must_use]
    pub fn check_invariants(&self, min_margin: Price) -> bool {
        use rust_decimal::Decimal;
        use rust_decimal_macros::dec;

        let sum = self.up_avg_price + self.down_avg_price + self.per_pair_profit;
        let diff = (sum - Decimal::ONE).abs();
        diff <= dec!(0.000001) && self.per_pair_profit >= min_margin && self.pairs >= Decimal::ONE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn opp(up: Price, down: Price, profit: Price, pairs: Volume) -> Opportunity {
        Opportunity {
            market: MarketId::from("m"),
            up_token: TokenId::from("u"),
            down_token: TokenId::from("d"),
            up_avg_price: up,
            down_avg_price: down,
            pairs,
            per_pair_profit: profit,
            fee_rate_assumed: dec!(0),
            detected_at_monotonic: Instant::now(),
        }
    }

    #[test]
    fn invariants_hold_for_scenario_a() {
        let o = opp(dec!(0.48), dec!(0.48), dec!(0.04), dec!(100));
        assert!(o.check_invariants(dec!(0.01)));
    }

    #[test]
    fn invariants_reject_below_min_margin() {
        let o = opp(dec!(0.50), dec!(0.495), dec!(0.005), dec!(10));
        assert!(!o.check_invariants(dec!(0.01)));
    }

    #[test]
    fn invariants_reject_broken_unit_identity() {
        let o = opp(dec!(0.50), dec!(0.50), dec!(0.10), dec!(10));
        assert!(!o.check_invariants(dec!(0.01)));
    }
}
