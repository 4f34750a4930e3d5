//! Venue-facing port traits: feed, order API, and market catalog.
//!
//! Concrete adapters live under [`crate::core::exchange::clob`]; everything
//! above this module talks only to these traits, so a second venue is a
//! second adapter module, not a rewrite of the detector/submitter stack.

use async_trait::async_trait;

use crate::core::domain::{BinaryMarket, Level, OrderMode, TokenId};
use crate::error::{Error, Result};

/// One decoded event off the streaming market-data channel.
#[derive(Debug, Clone)]
pub enum MarketEvent {
    /// Full ladder replacement for one token.
    BookSnapshot {
        token: TokenId,
        bids: Vec<Level>,
        asks: Vec<Level>,
        sequence: Option<String>,
    },
    /// Incremental ladder update for one token.
    PriceChange {
        token: TokenId,
        bids_delta: Vec<Level>,
        asks_delta: Vec<Level>,
        sequence: Option<String>,
    },
    /// Informational last-trade print; carries no book mutation.
    Trade { token: TokenId, price: crate::core::domain::Price, size: crate::core::domain::Volume },
    /// The underlying transport dropped. Callers should reconnect.
    Disconnected { reason: String },
}

/// A single sharded connection (or its reconnecting wrapper) to the
/// venue's streaming market-data channel.
#[async_trait]
pub trait MarketDataFeed: Send {
    /// Establish the transport connection. Idempotent: calling while
    /// already connected reconnects.
    async fn connect(&mut self) -> Result<()>;

    /// Subscribe to the given tokens, replacing any prior subscription on
    /// this connection.
    async fn subscribe(&mut self, tokens: &[TokenId]) -> Result<()>;

    /// Await the next event. Returns `None` only when the caller should
    /// stop polling this feed entirely (not on a recoverable disconnect,
    /// which surfaces as `MarketEvent::Disconnected`).
    async fn next_event(&mut self) -> Option<MarketEvent>;

    fn exchange_name(&self) -> &'static str;
}

/// Read-only snapshot access to the venue's active market list.
#[async_trait]
pub trait MarketCatalog: Send + Sync {
    async fn active_markets(&self) -> Result<Vec<BinaryMarket>>;
}

/// Order placement and cancellation against the venue's order API.
#[async_trait]
pub trait OrderApi: Send + Sync {
    /// Post a resting limit order. `mode` determines whether it is tagged
    /// maker (the common case for this call) for fee accounting.
    async fn create_and_post_limit(
        &self,
        token: &TokenId,
        price: crate::core::domain::Price,
        size: crate::core::domain::Volume,
        mode: OrderMode,
    ) -> Result<PlacedOrder>;

    /// Post a market order sized by notional amount; crosses the spread
    /// immediately (fill-or-kill).
    async fn create_and_post_market(
        &self,
        token: &TokenId,
        notional: crate::core::domain::Price,
    ) -> Result<FilledOrder>;

    async fn cancel(&self, order_id: &str) -> Result<()>;

    async fn cancel_all(&self) -> Result<()>;
}

/// Result of a resting limit-order placement: venue has accepted it, not
/// yet filled.
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub order_id: String,
}

/// Result of a market order, already filled (or partially) at post time.
#[derive(Debug, Clone)]
pub struct FilledOrder {
    pub order_id: String,
    pub filled_size: crate::core::domain::Volume,
    pub filled_cost: crate::core::domain::Price,
}

/// Convenience for mapping a venue HTTP status into the feed/order error
/// taxonomy: permanent-looking 4xx outcomes are rejections, 5xx/timeouts
/// are transient and left to the caller's retry policy.
#[must_use]
pub fn is_order_rejection(status: u16) -> bool {
    (400..500).contains(&status)
}

#[must_use]
pub fn connection_error(reason: impl Into<String>) -> Error {
    Error::Connection(reason.into())
}
