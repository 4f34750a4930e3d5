//! Wire DTOs for the venue's streaming market-data channel (spec §6).
//!
//! Prices and sizes travel as JSON strings on the wire; this module is the
//! one seam where they get parsed onto the `Decimal` grid the rest of the
//! stack uses.

use serde::{Deserialize, Serialize};

use crate::core::domain::{Level, TokenId};

#[derive(Debug, Serialize)]
pub struct SubscribeMessage {
    pub assets_ids: Vec<String>,
    #[serde(rename = "type")]
    pub msg_type: String,
}

impl SubscribeMessage {
    #[must_use]
    pub fn new(asset_ids: Vec<String>) -> Self {
        Self {
            assets_ids: asset_ids,
            msg_type: "market".into(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "event_type")]
pub enum WsMessage {
    #[serde(rename = "book")]
    Book(BookMessage),

    #[serde(rename = "price_change")]
    PriceChange(PriceChangeMessage),

    #[serde(rename = "last_trade_price")]
    LastTradePrice(LastTradeMessage),

    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
pub struct WirePriceLevel {
    pub price: String,
    pub size: String,
}

impl WirePriceLevel {
    /// Parse into a domain `Level`, discarding entries with malformed
    /// decimal fields rather than failing the whole frame.
    #[must_use]
    pub fn parse(&self) -> Option<Level> {
        Some(Level::new(self.price.parse().ok()?, self.size.parse().ok()?))
    }
}

#[must_use]
pub fn parse_levels(levels: &[WirePriceLevel]) -> Vec<Level> {
    levels.iter().filter_map(WirePriceLevel::parse).collect()
}

#[derive(Debug, Deserialize)]
pub struct BookMessage {
    pub asset_id: String,
    #[serde(default)]
    pub bids: Vec<WirePriceLevel>,
    #[serde(default)]
    pub asks: Vec<WirePriceLevel>,
    pub hash: Option<String>,
}

impl BookMessage {
    #[must_use]
    pub fn token(&self) -> TokenId {
        TokenId::from(self.asset_id.clone())
    }
}

#[derive(Debug, Deserialize)]
pub struct PriceChangeMessage {
    pub asset_id: String,
    #[serde(default)]
    pub bids: Vec<WirePriceLevel>,
    #[serde(default)]
    pub asks: Vec<WirePriceLevel>,
}

impl PriceChangeMessage {
    #[must_use]
    pub fn token(&self) -> TokenId {
        TokenId::from(self.asset_id.clone())
    }
}

#[derive(Debug, Deserialize)]
pub struct LastTradeMessage {
    pub asset_id: String,
    pub price: String,
    pub size: String,
}
