//! Binary market definition: one expiry, two outcome tokens.

use chrono::{DateTime, Utc};

use super::id::{MarketId, TokenId};

/// A single 5- or 15-minute binary crypto price market, with its paired
/// Up and Down outcome tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMarket {
    market_id: MarketId,
    up_token: TokenId,
    down_token: TokenId,
    expiry: DateTime<Utc>,
}

impl BinaryMarket {
    #[must_use]
    pub const fn new(market_id: MarketId, up_token: TokenId, down_token: TokenId, expiry: DateTime<Utc>) -> Self {
        Self {
            market_id,
            up_token,
            down_token,
            expiry,
        }
    }

    #[must_use]
    pub const fn market_id(&self) -> &MarketId {
        &self.market_id
    }

    #[must_use]
    pub const fn up_token(&self) -> &TokenId {
        &self.up_token
    }

    #[must_use]
    pub const fn down_token(&self) -> &TokenId {
        &self.down_token
    }

    #[must_use]
    pub const fn expiry(&self) -> DateTime<Utc> {
        self.expiry
    }

    /// Seconds remaining until expiry, as of `now`. Negative once expired.
    #[must_use]
    pub fn seconds_to_expiry(&self, now: DateTime<Utc>) -> i64 {
        (self.expiry - now).num_seconds()
    }

    /// Whether `token` belongs to this market, and if so which side it is.
    #[must_use]
    pub fn side_of(&self, token: &TokenId) -> Option<super::book::Side> {
        if token == &self.up_token {
            Some(super::book::Side::Up)
        } else if token == &self.down_token {
            Some(super::book::Side::Down)
        } else {
            None
        }
    }
}
