//! Maps every registered token back to its `BinaryMarket`, so a single
//! book-update notification (which only carries a `TokenId`) can be routed
//! to the right paired-ladder walk.
//!
//! Grounded on the teacher's `MarketRegistry` (`orderbook/registry.rs`):
//! a token-to-market index plus the flat list of markets it was built from.

use std::collections::HashMap;

use crate::core::domain::{BinaryMarket, MarketId, TokenId};

pub struct MarketRegistry {
    token_to_market: HashMap<TokenId, MarketId>,
    markets: HashMap<MarketId, BinaryMarket>,
}

impl MarketRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            token_to_market: HashMap::new(),
            markets: HashMap::new(),
        }
    }

    /// Register a market's two outcome tokens. Idempotent: re-registering
    /// an already-known market replaces it.
    pub fn register(&mut self, market: BinaryMarket) {
        self.token_to_market.insert(market.up_token().clone(), market.market_id().clone());
        self.token_to_market.insert(market.down_token().clone(), market.market_id().clone());
        self.markets.insert(market.market_id().clone(), market);
    }

    #[must_use]
    pub fn market_for_token(&self, token: &TokenId) -> Option<&BinaryMarket> {
        self.token_to_market.get(token).and_then(|id| self.markets.get(id))
    }

    #[must_use]
    pub fn market(&self, id: &MarketId) -> Option<&BinaryMarket> {
        self.markets.get(id)
    }

    #[must_use]
    pub fn markets(&self) -> impl Iterator<Item = &BinaryMarket> {
        self.markets.values()
    }

    #[must_use]
    pub fn is_registered(&self, id: &MarketId) -> bool {
        self.markets.contains_key(id)
    }

    #[must_use]
    pub fn all_tokens(&self) -> Vec<TokenId> {
        self.token_to_market.keys().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.markets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }
}

impl Default for MarketRegistry {
    fn default() -> Self {
        Self::new()
    }
}
