//! Reconnecting decorator for any [`MarketDataFeed`].
//!
//! Wraps a single sharded connection with the reconnect policy from the
//! feed client design: bounded 1-2s backoff (no exponential growth needed
//! at this scale), automatic resubscription of the tracked token set, and
//! a stale-until-next-snapshot signal surfaced to the caller so the
//! Orderbook Store can mark affected books stale across the gap.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::traits::{MarketDataFeed, MarketEvent};
use crate::core::domain::TokenId;
use crate::error::Result;

const MIN_BACKOFF_MS: u64 = 1000;
const MAX_BACKOFF_MS: u64 = 2000;

/// Wraps `inner` with reconnect-on-disconnect and resubscribe-after-reconnect
/// behavior. `next_event` never returns a bare `Disconnected` event to the
/// caller; it reconnects internally and instead emits a synthetic
/// `Disconnected` once per reconnect so the orchestrator can mark the
/// affected books stale, then keeps streaming.
pub struct ReconnectingFeed<F: MarketDataFeed> {
    inner: F,
    subscribed: Vec<TokenId>,
    connected: bool,
    reconnect_count: u64,
}

impl<F: MarketDataFeed> ReconnectingFeed<F> {
    #[must_use]
    pub const fn new(inner: F) -> Self {
        Self {
            inner,
            subscribed: Vec::new(),
            connected: false,
            reconnect_count: 0,
        }
    }

    #[must_use]
    pub fn reconnect_count(&self) -> u64 {
        self.reconnect_count
    }

    async fn backoff() {
        let delay_ms = rand::thread_rng().gen_range(MIN_BACKOFF_MS..=MAX_BACKOFF_MS);
        sleep(Duration::from_millis(delay_ms)).await;
    }

    async fn reconnect(&mut self) -> Result<()> {
        Self::backoff().await;
        self.inner.connect().await?;
        if !self.subscribed.is_empty() {
            debug!(tokens = self.subscribed.len(), "resubscribing after reconnect");
            self.inner.subscribe(&self.subscribed).await?;
        }
        self.connected = true;
        self.reconnect_count += 1;
        Ok(())
    }
}

#[async_trait]
impl<F: MarketDataFeed> MarketDataFeed for ReconnectingFeed<F> {
    async fn connect(&mut self) -> Result<()> {
        self.inner.connect().await?;
        self.connected = true;
        Ok(())
    }

    async fn subscribe(&mut self, tokens: &[TokenId]) -> Result<()> {
        self.subscribed = tokens.to_vec();
        self.inner.subscribe(tokens).await
    }

    async fn next_event(&mut self) -> Option<MarketEvent> {
        loop {
            if !self.connected {
                match self.reconnect().await {
                    Ok(()) => {
                        info!(exchange = self.inner.exchange_name(), "feed reconnected");
                        return Some(MarketEvent::Disconnected {
                            reason: "reconnected, affected books are stale until next snapshot".into(),
                        });
                    }
                    Err(e) => {
                        warn!(error = %e, "reconnect attempt failed, retrying");
                        continue;
                    }
                }
            }

            match self.inner.next_event().await {
                Some(MarketEvent::Disconnected { reason }) => {
                    warn!(reason = %reason, "feed connection lost, reconnecting");
                    self.connected = false;
                    continue;
                }
                Some(event) => return Some(event),
                None => {
                    warn!("feed stream ended unexpectedly, reconnecting");
                    self.connected = false;
                    continue;
                }
            }
        }
    }

    fn exchange_name(&self) -> &'static str {
        self.inner.exchange_name()
    }
}
