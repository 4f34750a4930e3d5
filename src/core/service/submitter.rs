//! Order Submitter: position sizing, plan construction, and concurrent
//! dispatch (spec §4.5).

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::core::domain::{
    Book, Execution, Level, OrderMode, OrderPlan, OrderResult, Opportunity, PlannedOrder, Price, Side,
};
use crate::core::exchange::traits::OrderApi;
use crate::core::strategy::selector::ExecutionStrategy;

const VENUE_MIN_ORDER_SIZE: Decimal = Decimal::from_parts(5, 0, 0, false, 0);
const BATCH_SIZE: usize = 15;

/// Knobs controlling position sizing and dispatch.
#[derive(Debug, Clone, Copy)]
pub struct SubmitterConfig {
    pub max_bet_size: Price,
    pub max_bankroll_fraction: Price,
    pub max_concurrent_workers: usize,
    pub order_timeout: Duration,
    pub dry_run: bool,
}

impl SubmitterConfig {
    /// Per-side budget: `min(MAX_BET_SIZE, bankroll * MAX_BANKROLL_FRACTION) / 2`.
    #[must_use]
    pub fn side_budget(&self, bankroll: Price) -> Price {
        self.max_bet_size.min(bankroll * self.max_bankroll_fraction) / dec!(2)
    }
}

/// Target suborder size in tokens for a given ask price, following the
/// precomputed distribution: thinner clips near the extremes of the
/// $0-$1 range, fatter clips near the midpoint where the venue typically
/// carries deeper books.
#[must_use]
pub fn target_suborder_size(price: Price) -> Decimal {
    let distance_from_mid = (price - dec!(0.50)).abs();
    if distance_from_mid <= dec!(0.15) {
        dec!(40)
    } else {
        dec!(20)
    }
}

/// Split `side_budget` across `asks`'s levels into suborders, each capped
/// by the level's available size, the price-bucket target, and the
/// remaining budget. Suborders below the venue minimum are dropped.
fn plan_side(side: Side, token: &crate::core::domain::TokenId, asks: &[Level], side_budget: Price, mode: OrderMode) -> Vec<PlannedOrder> {
    let mut remaining_budget = side_budget;
    let mut orders = Vec::new();

    for level in asks {
        if remaining_budget <= Decimal::ZERO {
            break;
        }
        let target = target_suborder_size(level.price());
        let affordable = remaining_budget / level.price();
        let size = level.size().min(target).min(affordable);

        if size < VENUE_MIN_ORDER_SIZE {
            continue;
        }

        remaining_budget -= size * level.price();
        orders.push(PlannedOrder {
            side,
            token: token.clone(),
            price: level.price(),
            size,
            mode,
        });
    }

    orders
}

/// Build the dual-side [`OrderPlan`] for a captured opportunity, given the
/// strategy's chosen execution mode and the current books (used to decide
/// which side is thinner under `Hybrid`).
#[must_use]
pub fn build_plan(
    opportunity: &Opportunity,
    strategy: ExecutionStrategy,
    bankroll: Price,
    up_book: &Book,
    down_book: &Book,
    config: &SubmitterConfig,
) -> OrderPlan {
    let side_budget = config.side_budget(bankroll);

    let (up_mode, down_mode) = match strategy {
        ExecutionStrategy::Maker => (OrderMode::Maker, OrderMode::Maker),
        ExecutionStrategy::Taker => (OrderMode::Taker, OrderMode::Taker),
        ExecutionStrategy::Hybrid => {
            let up_liquidity = up_book.best_ask().map_or(Decimal::ZERO, Level::size);
            let down_liquidity = down_book.best_ask().map_or(Decimal::ZERO, Level::size);
            if up_liquidity <= down_liquidity {
                (OrderMode::Maker, OrderMode::Taker)
            } else {
                (OrderMode::Taker, OrderMode::Maker)
            }
        }
    };

    let up_asks = maker_adjusted_asks(up_book.asks(), up_mode);
    let down_asks = maker_adjusted_asks(down_book.asks(), down_mode);

    let mut plan = OrderPlan::new();
    for order in plan_side(Side::Up, &opportunity.up_token, &up_asks, side_budget, up_mode) {
        plan.push(order);
    }
    for order in plan_side(Side::Down, &opportunity.down_token, &down_asks, side_budget, down_mode) {
        plan.push(order);
    }
    plan
}

/// Maker levels quote one tick below the observed ask; taker levels cross
/// at the ask as observed.
fn maker_adjusted_asks(asks: &[Level], mode: OrderMode) -> Vec<Level> {
    match mode {
        OrderMode::Taker => asks.to_vec(),
        OrderMode::Maker => asks
            .iter()
            .map(|l| Level::new(l.price() - crate::core::domain::TICK, l.size()))
            .collect(),
    }
}

/// Dispatches an [`OrderPlan`] against the venue's [`OrderApi`], bounding
/// concurrency with a semaphore and collecting results as they arrive.
pub struct OrderSubmitter {
    api: Arc<dyn OrderApi>,
    semaphore: Arc<Semaphore>,
    config: SubmitterConfig,
}

impl OrderSubmitter {
    #[must_use]
    pub fn new(api: Arc<dyn OrderApi>, config: SubmitterConfig) -> Self {
        let workers = config.max_concurrent_workers.max(4);
        Self {
            api,
            semaphore: Arc::new(Semaphore::new(workers)),
            config,
        }
    }

    /// Submit every suborder in `plan` concurrently (bounded by the worker
    /// semaphore) and assemble the resulting [`Execution`]. Logs, but does
    /// not auto-hedge, when the two sides' fills imbalance by 5+ tokens.
    pub async fn submit(&self, plan: &OrderPlan) -> Execution {
        let up_orders = plan.for_side(Side::Up).cloned().collect();
        let down_orders = plan.for_side(Side::Down).cloned().collect();
        let (up_results, down_results) =
            tokio::join!(self.dispatch_side(up_orders), self.dispatch_side(down_orders));

        let execution = Execution::new(up_results, down_results);
        if execution.imbalance() >= dec!(5) {
            warn!(
                imbalance = %execution.imbalance(),
                matched_pairs = %execution.matched_pairs(),
                "partial fill left a residual one-sided position; not auto-hedged"
            );
        }
        execution
    }

    async fn dispatch_side(&self, orders: Vec<PlannedOrder>) -> Vec<OrderResult> {
        let mut results = Vec::with_capacity(orders.len());
        for batch in orders.chunks(BATCH_SIZE) {
            let futures = batch.iter().map(|order| self.dispatch_one(order));
            results.extend(join_all(futures).await);
        }
        results
    }

    async fn dispatch_one(&self, order: &PlannedOrder) -> OrderResult {
        if self.config.dry_run {
            return Self::simulate_fill(order);
        }

        let permit = self.semaphore.clone().acquire_owned().await;
        let Ok(_permit) = permit else {
            return OrderResult::failed(order.mode, "submission worker pool closed");
        };

        let start = Instant::now();
        let outcome = timeout(self.config.order_timeout, self.place(order)).await;
        let latency = start.elapsed();

        match outcome {
            Ok(Ok((filled_size, filled_cost, exchange_order_id))) => {
                info!(token = %order.token, %filled_size, latency_ms = latency.as_millis(), "order filled");
                OrderResult {
                    success: true,
                    exchange_order_id,
                    filled_size,
                    filled_cost,
                    latency,
                    mode: order.mode,
                    error: None,
                }
            }
            Ok(Err(e)) => OrderResult::failed(order.mode, e.to_string()),
            Err(_) => OrderResult::failed(order.mode, "order submission timed out"),
        }
    }

    async fn place(&self, order: &PlannedOrder) -> crate::error::Result<(crate::core::domain::Volume, Price, Option<String>)> {
        match order.mode {
            OrderMode::Maker => {
                let placed = self
                    .api
                    .create_and_post_limit(&order.token, order.price, order.size, order.mode)
                    .await?;
                // A resting maker order is not yet filled; sizing/cost are
                // realized later via the exchange order id, which callers
                // reconcile out of band. Report zero fill here.
                Ok((Decimal::ZERO, Decimal::ZERO, Some(placed.order_id)))
            }
            OrderMode::Taker => {
                let filled = self
                    .api
                    .create_and_post_market(&order.token, order.price * order.size)
                    .await?;
                Ok((filled.filled_size, filled.filled_cost, Some(filled.order_id)))
            }
        }
    }

    fn simulate_fill(order: &PlannedOrder) -> OrderResult {
        OrderResult {
            success: true,
            exchange_order_id: Some(format!("dry-run-{}-{}", order.token, order.price)),
            filled_size: order.size,
            filled_cost: order.size * order.price,
            latency: Duration::from_millis(1),
            mode: order.mode,
            error: None,
        }
    }
}
