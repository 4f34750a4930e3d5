//! Market-maker passive two-sided quotes.

use std::time::Instant;

use super::id::MarketId;
use super::money::Price;

/// A posted pair of passive limit orders improving both best bids by one
/// tick. At most one active `Quote` exists per market at any instant
/// (enforced by [`crate::core::service::market_maker::MarketMaker`], not by
/// this type itself).
#[derive(Debug, Clone)]
pub struct Quote {
    pub market: MarketId,
    pub up_price: Price,
    pub down_price: Price,
    pub exchange_order_ids: Vec<String>,
    pub posted_at_monotonic: Instant,
}

impl Quote {
    /// Whether both new candidate prices are within `threshold` of this
    /// quote's posted prices, meaning no requote is needed.
    #[must_use]
    pub fn within_requote_threshold(&self, new_up: Price, new_down: Price, threshold: Price) -> bool {
        (new_up - self.up_price).abs() < threshold && (new_down - self.down_price).abs() < threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn quote(up: Price, down: Price) -> Quote {
        Quote {
            market: MarketId::from("m"),
            up_price: up,
            down_price: down,
            exchange_order_ids: vec!["o1".into(), "o2".into()],
            posted_at_monotonic: Instant::now(),
        }
    }

    #[test]
    fn scenario_f_small_diffs_stay_within_threshold() {
        let q = quote(dec!(0.42), dec!(0.53));
        assert!(q.within_requote_threshold(dec!(0.425), dec!(0.530), dec!(0.01)));
    }

    #[test]
    fn diff_at_or_above_threshold_requires_requote() {
        let q = quote(dec!(0.42), dec!(0.53));
        assert!(!q.within_requote_threshold(dec!(0.43), dec!(0.53), dec!(0.01)));
    }
}
