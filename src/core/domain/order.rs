//! Order plans, submission results, and execution accounting.

use std::time::Duration;

use super::book::Side;
use super::id::TokenId;
use super::money::{Price, Volume};

/// Execution mode for a single planned order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderMode {
    /// Passive limit order resting on the book.
    Maker,
    /// Order that crosses the spread immediately.
    Taker,
}

/// One order to place against a single token, at a single price.
#[derive(Debug, Clone)]
pub struct PlannedOrder {
    pub side: Side,
    pub token: TokenId,
    pub price: Price,
    pub size: Volume,
    pub mode: OrderMode,
}

/// The full split order plan for one captured opportunity.
///
/// Invariant: total planned spend per side never exceeds that side's
/// budget, and each suborder's size never exceeds the ladder level it was
/// sized against.
#[derive(Debug, Clone, Default)]
pub struct OrderPlan {
    orders: Vec<PlannedOrder>,
}

impl OrderPlan {
    #[must_use]
    pub const fn new() -> Self {
        Self { orders: Vec::new() }
    }

    pub fn push(&mut self, order: PlannedOrder) {
        self.orders.push(order);
    }

    #[must_use]
    pub fn orders(&self) -> &[PlannedOrder] {
        &self.orders
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    #[must_use]
    pub fn for_side(&self, side: Side) -> impl Iterator<Item = &PlannedOrder> {
        self.orders.iter().filter(move |o| o.side == side)
    }

    /// Total planned spend (price * size) for one side.
    #[must_use]
    pub fn side_spend(&self, side: Side) -> Price {
        self.for_side(side).map(|o| o.price * o.size).sum()
    }
}

/// Outcome of submitting one [`PlannedOrder`].
#[derive(Debug, Clone)]
pub struct OrderResult {
    pub success: bool,
    pub exchange_order_id: Option<String>,
    pub filled_size: Volume,
    pub filled_cost: Price,
    pub latency: Duration,
    pub mode: OrderMode,
    pub error: Option<String>,
}

impl OrderResult {
    #[must_use]
    pub fn failed(mode: OrderMode, error: impl Into<String>) -> Self {
        use rust_decimal::Decimal;
        Self {
            success: false,
            exchange_order_id: None,
            filled_size: Decimal::ZERO,
            filled_cost: Decimal::ZERO,
            latency: Duration::ZERO,
            mode,
            error: Some(error.into()),
        }
    }
}

/// Aggregated accounting for one captured opportunity's dual-side dispatch.
#[derive(Debug, Clone)]
pub struct Execution {
    pub up_results: Vec<OrderResult>,
    pub down_results: Vec<OrderResult>,
}

impl Execution {
    #[must_use]
    pub fn new(up_results: Vec<OrderResult>, down_results: Vec<OrderResult>) -> Self {
        Self { up_results, down_results }
    }

    #[must_use]
    pub fn sum_filled_up(&self) -> Volume {
        self.up_results.iter().map(|r| r.filled_size).sum()
    }

    #[must_use]
    pub fn sum_filled_down(&self) -> Volume {
        self.down_results.iter().map(|r| r.filled_size).sum()
    }

    /// `min(sum_filled_up, sum_filled_down)`: the portion of fills that
    /// actually forms a matched, risk-free pair.
    #[must_use]
    pub fn matched_pairs(&self) -> Volume {
        self.sum_filled_up().min(self.sum_filled_down())
    }

    #[must_use]
    pub fn total_cost(&self) -> Price {
        let up_cost: Price = self.up_results.iter().map(|r| r.filled_cost).sum();
        let down_cost: Price = self.down_results.iter().map(|r| r.filled_cost).sum();
        up_cost + down_cost
    }

    #[must_use]
    pub fn expected_profit(&self) -> Price {
        self.matched_pairs() - self.total_cost()
    }

    /// `|sum_filled_up - sum_filled_down|`: the leftover one-sided position
    /// from partial fills. Never auto-hedged; logged by the submitter.
    #[must_use]
    pub fn imbalance(&self) -> Volume {
        (self.sum_filled_up() - self.sum_filled_down()).abs()
    }

    /// Number of suborders that failed outright (rejected or timed out),
    /// surfaced in session statistics per spec §7.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.up_results.iter().chain(&self.down_results).filter(|r| !r.success).count()
    }
}
