//! Arbitrage Detector: paired ask-ladder walk (spec §4.3).

use std::time::{Duration, Instant};

use rust_decimal::Decimal;

use crate::core::domain::{Book, Level, Opportunity, Price};

/// Thresholds the walk is evaluated against. `fee_rate` is resolved by the
/// caller before detection: `TAKER_FEE_RATE` for the default taker
/// assumption, or zero if the caller already knows this opportunity will
/// be executed maker-side.
#[derive(Debug, Clone, Copy)]
pub struct DetectorConfig {
    pub min_margin: Price,
    pub max_staleness: Duration,
    pub fee_rate: Price,
}

/// Walk both ask ladders to find the maximum run of matched pairs whose
/// per-pair net (after `fee_rate`) still clears `min_margin`.
///
/// Returns `None` on any precondition failure: either book stale, either
/// ask side empty, or no profitable pairs found before a ladder exhausts.
#[must_use]
pub fn detect_arbitrage(up: &Book, down: &Book, config: &DetectorConfig) -> Option<Opportunity> {
    if up.is_stale(config.max_staleness) || down.is_stale(config.max_staleness) {
        return None;
    }

    let up_asks = up.asks();
    let down_asks = down.asks();
    if up_asks.is_empty() || down_asks.is_empty() {
        return None;
    }

    let best_up = up_asks[0];
    let best_down = down_asks[0];
    if best_up.price() > Decimal::new(99, 2) || best_down.price() > Decimal::new(99, 2) {
        return None;
    }
    // Fast reject: no level of slack left even before walking. Strictly
    // greater-than so the exact boundary (sum == 1 - min_margin) still
    // reaches the walk below, where the fee-aware net check is the real
    // arbiter of whether a zero-fee pair clears the margin.
    if best_up.price() + best_down.price() > Decimal::ONE - config.min_margin {
        return None;
    }

    let mut iu = 0usize;
    let mut id = 0usize;
    let mut ru = up_asks[0].size();
    let mut rd = down_asks[0].size();

    let mut total_pairs = Decimal::ZERO;
    let mut wu = Decimal::ZERO;
    let mut wd = Decimal::ZERO;

    loop {
        if iu >= up_asks.len() || id >= down_asks.len() {
            break;
        }
        let price_u = up_asks[iu].price();
        let price_d = down_asks[id].price();
        let fee = (price_u + price_d) * config.fee_rate;
        let net = Decimal::ONE - price_u - price_d - fee;

        if net < config.min_margin {
            // Tie-break: advance Up on equal price, keeping the walk
            // deterministic for identical test vectors.
            if price_u <= price_d {
                iu += 1;
                if iu < up_asks.len() {
                    ru = up_asks[iu].size();
                }
            } else {
                id += 1;
                if id < down_asks.len() {
                    rd = down_asks[id].size();
                }
            }
            continue;
        }

        let pairs = ru.min(rd);
        total_pairs += pairs;
        wu += pairs * price_u;
        wd += pairs * price_d;
        ru -= pairs;
        rd -= pairs;

        if ru.is_zero() {
            iu += 1;
            if iu < up_asks.len() {
                ru = up_asks[iu].size();
            }
        }
        if rd.is_zero() {
            id += 1;
            if id < down_asks.len() {
                rd = down_asks[id].size();
            }
        }
    }

    if total_pairs.is_zero() {
        return None;
    }

    let up_avg_price = wu / total_pairs;
    let down_avg_price = wd / total_pairs;
    let per_pair_profit = Decimal::ONE - up_avg_price - down_avg_price;

    if per_pair_profit < config.min_margin {
        return None;
    }

    Some(Opportunity {
        market: up.market().clone(),
        up_token: up.token().clone(),
        down_token: down.token().clone(),
        up_avg_price,
        down_avg_price,
        pairs: total_pairs,
        per_pair_profit,
        fee_rate_assumed: config.fee_rate,
        detected_at_monotonic: Instant::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::{MarketId, TokenId};
    use rust_decimal_macros::dec;

    fn book_with_asks(token: &str, market: &str, asks: Vec<Level>) -> Book {
        let mut book = Book::new(TokenId::from(token), MarketId::from(market));
        book.apply_snapshot(vec![], asks, None);
        book
    }

    fn config(min_margin: Price, fee_rate: Price) -> DetectorConfig {
        DetectorConfig {
            min_margin,
            max_staleness: Duration::from_secs(3),
            fee_rate,
        }
    }

    #[test]
    fn scenario_a_clean_single_level_arb() {
        let up = book_with_asks("up", "m", vec![Level::new(dec!(0.48), dec!(100))]);
        let down = book_with_asks("down", "m", vec![Level::new(dec!(0.48), dec!(100))]);

        let opp = detect_arbitrage(&up, &down, &config(dec!(0.01), dec!(0))).unwrap();
        assert_eq!(opp.up_avg_price, dec!(0.48));
        assert_eq!(opp.down_avg_price, dec!(0.48));
        assert_eq!(opp.pairs, dec!(100));
        assert_eq!(opp.per_pair_profit, dec!(0.04));
    }

    #[test]
    fn scenario_b_ladder_walk() {
        let up = book_with_asks(
            "up",
            "m",
            vec![Level::new(dec!(0.45), dec!(50)), Level::new(dec!(0.47), dec!(200))],
        );
        let down = book_with_asks(
            "down",
            "m",
            vec![Level::new(dec!(0.50), dec!(30)), Level::new(dec!(0.52), dec!(200))],
        );

        let opp = detect_arbitrage(&up, &down, &config(dec!(0.01), dec!(0))).unwrap();
        assert_eq!(opp.pairs, dec!(230));
        assert_eq!(opp.up_avg_price.round_dp(4), dec!(0.4657));
        assert_eq!(opp.down_avg_price.round_dp(4), dec!(0.5174));
        assert_eq!(opp.per_pair_profit.round_dp(4), dec!(0.0170));
    }

    #[test]
    fn scenario_c_margin_evaporates_with_fee() {
        let up = book_with_asks("up", "m", vec![Level::new(dec!(0.495), dec!(100))]);
        let down = book_with_asks("down", "m", vec![Level::new(dec!(0.495), dec!(100))]);

        assert!(detect_arbitrage(&up, &down, &config(dec!(0.01), dec!(0.015))).is_none());
    }

    #[test]
    fn scenario_d_stale_book_yields_no_opportunity() {
        let mut up = book_with_asks("up", "m", vec![Level::new(dec!(0.45), dec!(100))]);
        up.mark_stale();
        let down = book_with_asks("down", "m", vec![Level::new(dec!(0.45), dec!(100))]);

        assert!(detect_arbitrage(&up, &down, &config(dec!(0.01), dec!(0))).is_none());
    }

    #[test]
    fn empty_ask_side_yields_no_opportunity() {
        let mut up = Book::new(TokenId::from("up"), MarketId::from("m"));
        up.apply_snapshot(vec![], vec![], None);
        let down = book_with_asks("down", "m", vec![Level::new(dec!(0.45), dec!(100))]);

        assert!(detect_arbitrage(&up, &down, &config(dec!(0.01), dec!(0))).is_none());
    }

    #[test]
    fn boundary_exact_threshold_emits_only_when_fee_free() {
        // best_ask_up + best_ask_down == 1 - MIN_MARGIN exactly: with no
        // fee the per-pair net lands exactly at MIN_MARGIN, which still
        // clears (net < min_margin is false), so an Opportunity is emitted.
        let up = book_with_asks("up", "m", vec![Level::new(dec!(0.495), dec!(10))]);
        let down = book_with_asks("down", "m", vec![Level::new(dec!(0.495), dec!(10))]);

        let opp = detect_arbitrage(&up, &down, &config(dec!(0.01), dec!(0))).unwrap();
        assert_eq!(opp.pairs, dec!(10));
        assert_eq!(opp.per_pair_profit, dec!(0.01));

        // With a nonzero fee the same boundary prices net below margin.
        assert!(detect_arbitrage(&up, &down, &config(dec!(0.01), dec!(0.015))).is_none());
    }

    #[test]
    fn idempotence_unchanged_books_yield_identical_opportunity() {
        let up = book_with_asks("up", "m", vec![Level::new(dec!(0.45), dec!(50)), Level::new(dec!(0.47), dec!(200))]);
        let down = book_with_asks("down", "m", vec![Level::new(dec!(0.50), dec!(30)), Level::new(dec!(0.52), dec!(200))]);
        let cfg = config(dec!(0.01), dec!(0));

        let first = detect_arbitrage(&up, &down, &cfg).unwrap();
        let second = detect_arbitrage(&up, &down, &cfg).unwrap();
        assert_eq!(first.pairs, second.pairs);
        assert_eq!(first.up_avg_price, second.up_avg_price);
        assert_eq!(first.down_avg_price, second.down_avg_price);
        assert_eq!(first.per_pair_profit, second.per_pair_profit);
    }
}
