//! Order API client (spec §6): limit/market order placement and cancellation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::domain::{OrderMode, Price, TokenId, Volume};
use crate::core::exchange::traits::{is_order_rejection, FilledOrder, OrderApi, PlacedOrder};
use crate::error::{Error, Result};

/// Reqwest-backed client for the venue's order placement endpoints.
pub struct ClobOrderApi {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl ClobOrderApi {
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: String, api_key: String) -> Self {
        Self { client, base_url, api_key }
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder.bearer_auth(&self.api_key)
    }
}

#[derive(Debug, Serialize)]
struct LimitOrderRequest<'a> {
    token_id: &'a str,
    price: String,
    size: String,
    side: &'static str,
    order_type: &'static str,
    time_in_force: &'static str,
}

#[derive(Debug, Serialize)]
struct MarketOrderRequest<'a> {
    token_id: &'a str,
    notional_amount: String,
    side: &'static str,
    order_type: &'static str,
    time_in_force: &'static str,
}

#[derive(Debug, Deserialize)]
struct LimitOrderResponse {
    order_id: String,
}

#[derive(Debug, Deserialize)]
struct MarketOrderResponse {
    order_id: String,
    filled_size: String,
    filled_cost: String,
}

#[async_trait]
impl OrderApi for ClobOrderApi {
    async fn create_and_post_limit(
        &self,
        token: &TokenId,
        price: Price,
        size: Volume,
        mode: OrderMode,
    ) -> Result<PlacedOrder> {
        let body = LimitOrderRequest {
            token_id: token.as_str(),
            price: price.to_string(),
            size: size.to_string(),
            side: "BUY",
            order_type: match mode {
                OrderMode::Maker => "LIMIT",
                OrderMode::Taker => "LIMIT_IOC",
            },
            time_in_force: "GTC",
        };

        let resp = self
            .authed(self.client.post(format!("{}/order", self.base_url)))
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            if is_order_rejection(status.as_u16()) {
                warn!(status = status.as_u16(), body = %text, "limit order rejected");
                return Err(Error::OrderRejected(text));
            }
            return Err(Error::Execution(format!("limit order failed ({status}): {text}")));
        }

        let parsed: LimitOrderResponse = resp.json().await?;
        info!(order_id = %parsed.order_id, token = %token, "limit order posted");
        Ok(PlacedOrder { order_id: parsed.order_id })
    }

    async fn create_and_post_market(&self, token: &TokenId, notional: Price) -> Result<FilledOrder> {
        let body = MarketOrderRequest {
            token_id: token.as_str(),
            notional_amount: notional.to_string(),
            side: "BUY",
            order_type: "MARKET",
            time_in_force: "FOK",
        };

        let resp = self
            .authed(self.client.post(format!("{}/order", self.base_url)))
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            if is_order_rejection(status.as_u16()) {
                warn!(status = status.as_u16(), body = %text, "market order rejected");
                return Err(Error::OrderRejected(text));
            }
            return Err(Error::Execution(format!("market order failed ({status}): {text}")));
        }

        let parsed: MarketOrderResponse = resp.json().await?;
        let filled_size = parsed
            .filled_size
            .parse()
            .map_err(|_| Error::Execution("malformed filled_size in order response".into()))?;
        let filled_cost = parsed
            .filled_cost
            .parse()
            .map_err(|_| Error::Execution("malformed filled_cost in order response".into()))?;

        info!(order_id = %parsed.order_id, token = %token, %filled_size, "market order filled");
        Ok(FilledOrder {
            order_id: parsed.order_id,
            filled_size,
            filled_cost,
        })
    }

    async fn cancel(&self, order_id: &str) -> Result<()> {
        let resp = self
            .authed(self.client.delete(format!("{}/order/{order_id}", self.base_url)))
            .send()
            .await?;
        if !resp.status().is_success() {
            warn!(order_id, status = resp.status().as_u16(), "cancel request failed");
        }
        Ok(())
    }

    async fn cancel_all(&self) -> Result<()> {
        let resp = self
            .authed(self.client.delete(format!("{}/orders", self.base_url)))
            .send()
            .await?;
        if !resp.status().is_success() {
            warn!(status = resp.status().as_u16(), "cancel_all request failed");
        }
        Ok(())
    }
}
