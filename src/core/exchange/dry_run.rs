//! No-op [`OrderApi`] decorator used when the process runs in dry-run mode.
//!
//! The Submitter already short-circuits before touching an `OrderApi` when
//! `dry_run` is set (see `SubmitterConfig::dry_run`), but the Market-Maker
//! calls `create_and_post_limit` unconditionally to post its resting quotes.
//! Wrapping the live adapter with this type keeps both services honoring
//! the same dry-run contract without a second branch inside the maker.

use async_trait::async_trait;
use tracing::debug;

use crate::core::domain::{OrderMode, Price, TokenId, Volume};
use crate::core::exchange::traits::{FilledOrder, OrderApi, PlacedOrder};
use crate::error::Result;

#[derive(Debug, Default)]
pub struct DryRunOrderApi;

#[async_trait]
impl OrderApi for DryRunOrderApi {
    async fn create_and_post_limit(
        &self,
        token: &TokenId,
        price: Price,
        size: Volume,
        _mode: OrderMode,
    ) -> Result<PlacedOrder> {
        let order_id = format!("dry-run-{token}-{price}");
        debug!(%order_id, %size, "dry run: synthesized limit order");
        Ok(PlacedOrder { order_id })
    }

    async fn create_and_post_market(&self, token: &TokenId, notional: Price) -> Result<FilledOrder> {
        let order_id = format!("dry-run-{token}-{notional}");
        debug!(%order_id, %notional, "dry run: synthesized market order");
        Ok(FilledOrder {
            order_id,
            filled_size: notional,
            filled_cost: notional,
        })
    }

    async fn cancel(&self, order_id: &str) -> Result<()> {
        debug!(order_id, "dry run: synthesized cancel");
        Ok(())
    }

    async fn cancel_all(&self) -> Result<()> {
        debug!("dry run: synthesized cancel_all");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn limit_order_is_synthesized() {
        let api = DryRunOrderApi;
        let placed = api
            .create_and_post_limit(&TokenId::from("t1"), dec!(0.45), dec!(10), OrderMode::Maker)
            .await
            .unwrap();
        assert!(placed.order_id.starts_with("dry-run-"));
    }

    #[tokio::test]
    async fn cancel_all_always_succeeds() {
        let api = DryRunOrderApi;
        assert!(api.cancel_all().await.is_ok());
    }
}
