//! Market catalog client (spec §6): active `BinaryMarket` discovery.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::core::domain::{BinaryMarket, MarketId, TokenId};
use crate::core::exchange::traits::MarketCatalog;
use crate::error::Result;

pub struct ClobMarketCatalog {
    client: reqwest::Client,
    base_url: String,
}

impl ClobMarketCatalog {
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    market_id: String,
    up_token: String,
    down_token: String,
    expiry_unix: i64,
}

#[async_trait]
impl MarketCatalog for ClobMarketCatalog {
    async fn active_markets(&self) -> Result<Vec<BinaryMarket>> {
        let entries: Vec<CatalogEntry> = self
            .client
            .get(format!("{}/markets/active", self.base_url))
            .send()
            .await?
            .json()
            .await?;

        let markets = entries
            .into_iter()
            .map(|e| {
                let expiry = Utc
                    .timestamp_opt(e.expiry_unix, 0)
                    .single()
                    .unwrap_or_else(Utc::now);
                BinaryMarket::new(
                    MarketId::from(e.market_id),
                    TokenId::from(e.up_token),
                    TokenId::from(e.down_token),
                    expiry,
                )
            })
            .collect::<Vec<_>>();

        debug!(count = markets.len(), "fetched active markets");
        Ok(markets)
    }
}
