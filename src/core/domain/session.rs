//! Process-wide session state: bankroll, running statistics, shutdown flag.

use rust_decimal::Decimal;

use super::money::Price;

/// Running counters accumulated over the life of a session.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionStats {
    pub opportunities_detected: u64,
    pub opportunities_executed: u64,
    pub stale_skips: u64,
    pub orders_rejected: u64,
    /// Count of feed shard reconnects, i.e. `FeedTransient` recoveries
    /// (spec §7: "counted").
    pub feed_reconnects: u64,
    pub total_pairs_matched: Decimal,
    pub total_cost: Decimal,
    pub total_profit: Decimal,
}

impl SessionStats {
    #[must_use]
    pub fn win_rate(&self) -> Decimal {
        if self.opportunities_detected == 0 {
            return Decimal::ZERO;
        }
        Decimal::from(self.opportunities_executed) / Decimal::from(self.opportunities_detected)
    }

    #[must_use]
    pub fn net_profit(&self) -> Decimal {
        self.total_profit
    }

    /// Return on capital deployed, or zero if nothing was ever spent.
    #[must_use]
    pub fn roi(&self) -> Decimal {
        if self.total_cost.is_zero() {
            return Decimal::ZERO;
        }
        self.total_profit / self.total_cost
    }
}

/// A snapshot of the Session Supervisor's mutable state: bankroll,
/// statistics, and the cooperative shutdown flag. The live, lock-guarded
/// copy is owned by `app::supervisor::Supervisor`; this type is the plain
/// data shape it guards.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub bankroll: Price,
    pub stats: SessionStats,
    pub running: bool,
}

impl SessionState {
    #[must_use]
    pub const fn new(starting_bankroll: Price) -> Self {
        Self {
            bankroll: starting_bankroll,
            stats: SessionStats {
                opportunities_detected: 0,
                opportunities_executed: 0,
                stale_skips: 0,
                orders_rejected: 0,
                feed_reconnects: 0,
                total_pairs_matched: Decimal::ZERO,
                total_cost: Decimal::ZERO,
                total_profit: Decimal::ZERO,
            },
            running: true,
        }
    }

    /// Apply a completed execution: debit cost, credit matched-pair payout.
    pub fn apply_execution(&mut self, matched_pairs: Decimal, total_cost: Decimal) {
        self.bankroll += matched_pairs - total_cost;
        self.stats.opportunities_executed += 1;
        self.stats.total_pairs_matched += matched_pairs;
        self.stats.total_cost += total_cost;
        self.stats.total_profit += matched_pairs - total_cost;
    }
}
