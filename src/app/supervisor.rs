//! Session Supervisor (spec §4.7): owns bankroll, running statistics, and
//! the cooperative shutdown flag. Mutated only here and by the Submitter on
//! a successful fill (via [`Supervisor::record_execution`]); every other
//! component only reads a snapshot.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::info;

use crate::core::domain::{Price, SessionState, SessionStats};

/// Lock-guarded [`SessionState`] plus the atomic shutdown flag observed by
/// every cooperative task. Broken out from `SessionState` itself (spec §9
/// "cyclic reference between Submitter and Session" design note): the
/// Submitter and Market-Maker receive an `Arc<Supervisor>` at construction
/// rather than reaching back into the orchestrator that owns them.
pub struct Supervisor {
    state: Mutex<SessionState>,
    running: AtomicBool,
}

impl Supervisor {
    #[must_use]
    pub fn new(starting_bankroll: Price) -> Self {
        Self {
            state: Mutex::new(SessionState::new(starting_bankroll)),
            running: AtomicBool::new(true),
        }
    }

    #[must_use]
    pub fn bankroll(&self) -> Price {
        self.state.lock().bankroll
    }

    #[must_use]
    pub fn stats(&self) -> SessionStats {
        self.state.lock().stats
    }

    /// Record a completed execution: debit cost, credit matched-pair
    /// payout, bump counters. `dry_run` executions still update the
    /// in-memory bankroll for simulation stats, per spec §6.
    pub fn record_execution(&self, matched_pairs: Price, total_cost: Price) {
        self.state.lock().apply_execution(matched_pairs, total_cost);
    }

    pub fn record_opportunity_detected(&self) {
        self.state.lock().stats.opportunities_detected += 1;
    }

    pub fn record_stale_skip(&self) {
        self.state.lock().stats.stale_skips += 1;
    }

    pub fn record_order_rejected(&self) {
        self.state.lock().stats.orders_rejected += 1;
    }

    /// Bulk variant used when an [`Execution`](crate::core::domain::Execution)
    /// completes with more than one failed suborder.
    pub fn record_orders_rejected(&self, count: usize) {
        self.state.lock().stats.orders_rejected += count as u64;
    }

    /// Count a `FeedTransient` recovery (spec §7): a feed shard reconnected
    /// after an idle timeout or a closed socket.
    pub fn record_feed_reconnect(&self) {
        self.state.lock().stats.feed_reconnects += 1;
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Observed cooperatively between feed messages, scan cycles, and
    /// before each submission (spec §5 "cancellation").
    pub fn request_shutdown(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    /// Final session summary (spec §7 "user-visible behavior"): counts,
    /// P&L, and ROI, logged once on shutdown.
    pub fn log_summary(&self) {
        let state = self.state.lock();
        info!(
            bankroll = %state.bankroll,
            opportunities_detected = state.stats.opportunities_detected,
            opportunities_executed = state.stats.opportunities_executed,
            stale_skips = state.stats.stale_skips,
            orders_rejected = state.stats.orders_rejected,
            feed_reconnects = state.stats.feed_reconnects,
            total_pairs_matched = %state.stats.total_pairs_matched,
            total_cost = %state.stats.total_cost,
            net_profit = %state.stats.net_profit(),
            win_rate = %state.stats.win_rate(),
            roi = %state.stats.roi(),
            "session summary"
        );
    }
}
