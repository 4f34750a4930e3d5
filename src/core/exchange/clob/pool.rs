//! Shards a token fleet across multiple feed connections.
//!
//! At most `tokens_per_connection` tokens ride one connection (default 450,
//! spec §4.1); larger fleets get one task per shard, each independently
//! reconnecting, merged into a single event stream via an unbounded
//! `mpsc` channel.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::core::domain::TokenId;
use crate::core::exchange::reconnecting::ReconnectingFeed;
use crate::core::exchange::traits::MarketEvent;

use super::websocket::ClobFeed;

/// Owns one tokio task per feed shard and merges their events.
pub struct FeedPool {
    rx: mpsc::UnboundedReceiver<MarketEvent>,
    shard_count: usize,
}

impl FeedPool {
    /// Partition `tokens` into shards of at most `tokens_per_connection`,
    /// spawn one connection task per shard against `url`, and start
    /// streaming immediately. `idle_timeout` is forwarded to each shard's
    /// [`ClobFeed`], which reconnects on its own once that long passes
    /// without a message (spec §4.1, §5).
    pub fn spawn(url: &str, tokens: Vec<TokenId>, tokens_per_connection: usize, idle_timeout: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let shards: Vec<Vec<TokenId>> = tokens
            .chunks(tokens_per_connection.max(1))
            .map(<[TokenId]>::to_vec)
            .collect();
        let shard_count = shards.len();

        for (shard_id, shard_tokens) in shards.into_iter().enumerate() {
            let url = url.to_string();
            let tx = tx.clone();
            tokio::spawn(async move {
                let feed = ClobFeed::new(url, idle_timeout);
                let mut feed = ReconnectingFeed::new(feed);

                if let Err(e) = feed.connect().await {
                    error!(shard_id, error = %e, "shard failed initial connect");
                    return;
                }
                if let Err(e) = feed.subscribe(&shard_tokens).await {
                    error!(shard_id, error = %e, "shard failed initial subscribe");
                    return;
                }
                debug!(shard_id, tokens = shard_tokens.len(), "feed shard subscribed");

                loop {
                    match feed.next_event().await {
                        Some(event) => {
                            if tx.send(event).is_err() {
                                debug!(shard_id, "pool receiver dropped, shard exiting");
                                break;
                            }
                        }
                        None => {
                            warn!(shard_id, "feed shard ended unexpectedly");
                            break;
                        }
                    }
                }
            });
        }

        Self { rx, shard_count }
    }

    #[must_use]
    pub const fn shard_count(&self) -> usize {
        self.shard_count
    }

    /// Await the next event from any shard.
    pub async fn next_event(&mut self) -> Option<MarketEvent> {
        self.rx.recv().await
    }
}
