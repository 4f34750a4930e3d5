//! Per-token order book with sorted ladders and staleness tracking.

use std::time::{Duration, Instant};

use super::id::{MarketId, TokenId};
use super::money::{Price, Volume};

/// Which outcome of a binary market a token represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Up,
    Down,
}

impl Side {
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
        }
    }
}

/// One price level in a ladder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Level {
    price: Price,
    size: Volume,
}

impl Level {
    #[must_use]
    pub const fn new(price: Price, size: Volume) -> Self {
        Self { price, size }
    }

    #[must_use]
    pub const fn price(&self) -> Price {
        self.price
    }

    #[must_use]
    pub const fn size(&self) -> Volume {
        self.size
    }
}

/// Per-token book: sorted ask/bid ladders plus freshness metadata.
///
/// Invariants enforced by construction and by every mutator: no duplicate
/// prices, zero-size levels are absent, bids sorted strictly descending,
/// asks sorted strictly ascending.
#[derive(Debug, Clone)]
pub struct Book {
    token: TokenId,
    market: MarketId,
    bids: Vec<Level>,
    asks: Vec<Level>,
    last_update: Instant,
    last_sequence: Option<String>,
    stale: bool,
}

impl Book {
    /// Create an empty book, initially marked stale until the first
    /// snapshot arrives (spec §4.1: deltas before the first snapshot are
    /// discarded, and a freshly (re)registered book has no confirmed state).
    #[must_use]
    pub fn new(token: TokenId, market: MarketId) -> Self {
        Self {
            token,
            market,
            bids: Vec::new(),
            asks: Vec::new(),
            last_update: Instant::now(),
            last_sequence: None,
            stale: true,
        }
    }

    #[must_use]
    pub const fn token(&self) -> &TokenId {
        &self.token
    }

    #[must_use]
    pub const fn market(&self) -> &MarketId {
        &self.market
    }

    #[must_use]
    pub fn bids(&self) -> &[Level] {
        &self.bids
    }

    #[must_use]
    pub fn asks(&self) -> &[Level] {
        &self.asks
    }

    #[must_use]
    pub fn best_bid(&self) -> Option<Level> {
        self.bids.first().copied()
    }

    #[must_use]
    pub fn best_ask(&self) -> Option<Level> {
        self.asks.first().copied()
    }

    #[must_use]
    pub const fn last_update(&self) -> Instant {
        self.last_update
    }

    /// Explicitly mark the book stale, e.g. after a feed reconnect, until
    /// the next snapshot arrives.
    pub fn mark_stale(&mut self) {
        self.stale = true;
    }

    /// Whether the book's age exceeds `max_staleness`, or it has never
    /// received a snapshot.
    #[must_use]
    pub fn is_stale(&self, max_staleness: Duration) -> bool {
        self.stale || self.last_update.elapsed() > max_staleness
    }

    /// Replace both ladders wholesale (spec §4.1 `BookSnapshot`).
    pub fn apply_snapshot(&mut self, bids: Vec<Level>, asks: Vec<Level>, sequence: Option<String>) {
        self.bids = Self::sorted_bids(bids);
        self.asks = Self::sorted_asks(asks);
        self.last_update = Instant::now();
        self.last_sequence = sequence;
        self.stale = false;
    }

    /// Apply an incremental delta (spec §4.1 `PriceChange`): each entry sets
    /// the level to the given size, or removes it if size is zero. Ignored
    /// entirely if no snapshot has been applied yet.
    pub fn apply_delta(&mut self, bid_changes: &[Level], ask_changes: &[Level], sequence: Option<String>) {
        if self.stale {
            // Deltas before the first snapshot are discarded (spec §4.1).
            return;
        }
        for level in bid_changes {
            Self::upsert(&mut self.bids, *level, true);
        }
        for level in ask_changes {
            Self::upsert(&mut self.asks, *level, false);
        }
        self.last_update = Instant::now();
        if sequence.is_some() {
            self.last_sequence = sequence;
        }
    }

    fn upsert(ladder: &mut Vec<Level>, level: Level, descending: bool) {
        let pos = ladder.iter().position(|l| l.price == level.price);
        if level.size.is_zero() {
            if let Some(idx) = pos {
                ladder.remove(idx);
            }
            return;
        }
        match pos {
            Some(idx) => ladder[idx] = level,
            None => {
                let insert_at = if descending {
                    ladder.partition_point(|l| l.price > level.price)
                } else {
                    ladder.partition_point(|l| l.price < level.price)
                };
                ladder.insert(insert_at, level);
            }
        }
    }

    fn sorted_bids(mut levels: Vec<Level>) -> Vec<Level> {
        levels.retain(|l| !l.size.is_zero());
        levels.sort_by(|a, b| b.price.cmp(&a.price));
        levels
    }

    fn sorted_asks(mut levels: Vec<Level>) -> Vec<Level> {
        levels.retain(|l| !l.size.is_zero());
        levels.sort_by(|a, b| a.price.cmp(&b.price));
        levels
    }

    /// True if bids are strictly descending, asks strictly ascending, no
    /// zero-size levels, and (when both sides present) best_bid < best_ask.
    #[must_use]
    pub fn check_invariants(&self) -> bool {
        let strictly_sorted = |levels: &[Level], descending: bool| {
            levels.windows(2).all(|w| {
                if descending {
                    w[0].price > w[1].price
                } else {
                    w[0].price < w[1].price
                }
            })
        };
        let no_zero = |levels: &[Level]| levels.iter().all(|l| !l.size.is_zero());

        let bids_ok = strictly_sorted(&self.bids, true) && no_zero(&self.bids);
        let asks_ok = strictly_sorted(&self.asks, false) && no_zero(&self.asks);
        let crossed_ok = match (self.best_bid(), self.best_ask()) {
            (Some(b), Some(a)) => b.price() < a.price(),
            _ => true,
        };
        bids_ok && asks_ok && crossed_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn book() -> Book {
        Book::new(TokenId::from("tok"), MarketId::from("mkt"))
    }

    #[test]
    fn new_book_is_stale_until_snapshot() {
        let b = book();
        assert!(b.is_stale(Duration::from_secs(3600)));
    }

    #[test]
    fn snapshot_replaces_ladders_and_sorts() {
        let mut b = book();
        b.apply_snapshot(
            vec![Level::new(dec!(0.40), dec!(10)), Level::new(dec!(0.45), dec!(5))],
            vec![Level::new(dec!(0.55), dec!(7)), Level::new(dec!(0.50), dec!(3))],
            Some("h1".into()),
        );
        assert_eq!(b.bids()[0].price(), dec!(0.45));
        assert_eq!(b.bids()[1].price(), dec!(0.40));
        assert_eq!(b.asks()[0].price(), dec!(0.50));
        assert_eq!(b.asks()[1].price(), dec!(0.55));
        assert!(!b.is_stale(Duration::from_secs(3600)));
        assert!(b.check_invariants());
    }

    #[test]
    fn delta_before_snapshot_is_discarded() {
        let mut b = book();
        b.apply_delta(&[], &[Level::new(dec!(0.5), dec!(10))], None);
        assert!(b.asks().is_empty());
    }

    #[test]
    fn delta_upserts_and_removes() {
        let mut b = book();
        b.apply_snapshot(vec![], vec![Level::new(dec!(0.50), dec!(10))], None);

        b.apply_delta(&[], &[Level::new(dec!(0.48), dec!(20))], None);
        assert_eq!(b.asks()[0].price(), dec!(0.48));
        assert_eq!(b.asks()[1].price(), dec!(0.50));

        b.apply_delta(&[], &[Level::new(dec!(0.50), dec!(0))], None);
        assert_eq!(b.asks().len(), 1);
        assert_eq!(b.asks()[0].price(), dec!(0.48));
    }

    #[test]
    fn snapshot_then_delta_matches_consolidated_snapshot() {
        let mut via_delta = book();
        via_delta.apply_snapshot(vec![], vec![Level::new(dec!(0.50), dec!(10))], None);
        via_delta.apply_delta(
            &[],
            &[Level::new(dec!(0.50), dec!(0)), Level::new(dec!(0.47), dec!(30))],
            None,
        );

        let mut via_snapshot = book();
        via_snapshot.apply_snapshot(vec![], vec![Level::new(dec!(0.47), dec!(30))], None);

        assert_eq!(via_delta.asks().len(), via_snapshot.asks().len());
        assert_eq!(via_delta.asks()[0].price(), via_snapshot.asks()[0].price());
        assert_eq!(via_delta.asks()[0].size(), via_snapshot.asks()[0].size());
    }

    #[test]
    fn mark_stale_forces_staleness_regardless_of_age() {
        let mut b = book();
        b.apply_snapshot(vec![], vec![Level::new(dec!(0.5), dec!(1))], None);
        assert!(!b.is_stale(Duration::from_secs(3600)));
        b.mark_stale();
        assert!(b.is_stale(Duration::from_secs(3600)));
    }

    #[test]
    fn invariants_catch_crossed_book() {
        let mut b = book();
        b.apply_snapshot(
            vec![Level::new(dec!(0.60), dec!(1))],
            vec![Level::new(dec!(0.50), dec!(1))],
            None,
        );
        // best_bid (0.60) >= best_ask (0.50): crossed, invariant should fail.
        assert!(!b.check_invariants());
    }
}
