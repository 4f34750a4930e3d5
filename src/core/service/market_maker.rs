//! Market-Maker: passive two-sided quoting (spec §4.6, optional subsystem).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::core::domain::{quantize, Book, MarketId, OrderMode, Price, Quote};
use crate::core::exchange::traits::OrderApi;
use crate::error::Result;

/// Knobs controlling quote computation, requote throttling, and the
/// concurrency cap.
#[derive(Debug, Clone, Copy)]
pub struct MarketMakerConfig {
    pub enabled: bool,
    pub quote_size: Price,
    pub min_margin: Price,
    pub requote_threshold: Price,
    pub max_markets: usize,
    pub max_staleness: Duration,
}

/// Maintains at most `max_markets` concurrent passive two-sided quotes,
/// improving both best bids by one tick whenever the resulting bid-sum
/// clears `min_margin`.
pub struct MarketMaker {
    api: Arc<dyn OrderApi>,
    config: MarketMakerConfig,
    quotes: RwLock<HashMap<MarketId, Quote>>,
}

impl MarketMaker {
    #[must_use]
    pub fn new(api: Arc<dyn OrderApi>, config: MarketMakerConfig) -> Self {
        Self {
            api,
            config,
            quotes: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn active_quote_count(&self) -> usize {
        self.quotes.read().len()
    }

    #[must_use]
    pub fn active_quote(&self, market: &MarketId) -> Option<Quote> {
        self.quotes.read().get(market).cloned()
    }

    /// React to a book update for one side of `market`. No-op if disabled,
    /// either book is stale, either best bid is missing, the computed
    /// margin doesn't clear the floor, or the new prices are within the
    /// requote threshold of the currently posted quote.
    pub async fn on_book_update(&self, market: &MarketId, up_book: &Book, down_book: &Book) -> Result<()> {
        if !self.config.enabled {
            return Ok(());
        }
        if up_book.is_stale(self.config.max_staleness) || down_book.is_stale(self.config.max_staleness) {
            return Ok(());
        }

        let Some(up_bid) = up_book.best_bid() else { return Ok(()) };
        let Some(down_bid) = down_book.best_bid() else { return Ok(()) };
        if up_bid.price() <= Decimal::ZERO || down_bid.price() <= Decimal::ZERO {
            return Ok(());
        }

        let our_up_bid = quantize(up_bid.price() + crate::core::domain::TICK);
        let our_down_bid = quantize(down_bid.price() + crate::core::domain::TICK);

        if Decimal::ONE - (our_up_bid + our_down_bid) < self.config.min_margin {
            return Ok(());
        }

        let existing = self.quotes.read().get(market).cloned();
        if let Some(prior) = &existing {
            if prior.within_requote_threshold(our_up_bid, our_down_bid, self.config.requote_threshold) {
                debug!(%market, "quote within requote threshold, no action");
                return Ok(());
            }
        } else if self.active_quote_count() >= self.config.max_markets {
            debug!(%market, "market-maker at capacity, ignoring new market");
            return Ok(());
        }

        if let Some(prior) = existing {
            self.cancel_quote(&prior).await;
        }

        let up_token = up_book.token().clone();
        let down_token = down_book.token().clone();

        let up_order = self
            .api
            .create_and_post_limit(&up_token, our_up_bid, self.config.quote_size, OrderMode::Maker)
            .await?;
        let down_order = self
            .api
            .create_and_post_limit(&down_token, our_down_bid, self.config.quote_size, OrderMode::Maker)
            .await?;

        let quote = Quote {
            market: market.clone(),
            up_price: our_up_bid,
            down_price: our_down_bid,
            exchange_order_ids: vec![up_order.order_id, down_order.order_id],
            posted_at_monotonic: Instant::now(),
        };
        info!(%market, up = %our_up_bid, down = %our_down_bid, "posted market-maker quote");
        self.quotes.write().insert(market.clone(), quote);

        Ok(())
    }

    async fn cancel_quote(&self, quote: &Quote) {
        for order_id in &quote.exchange_order_ids {
            if let Err(e) = self.api.cancel(order_id).await {
                warn!(order_id, error = %e, "failed to cancel market-maker order");
            }
        }
    }

    /// Cancel every active quote. Called by the supervisor on shutdown.
    pub async fn cancel_all(&self) {
        let quotes: Vec<Quote> = self.quotes.write().drain().map(|(_, q)| q).collect();
        for quote in &quotes {
            self.cancel_quote(quote).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::{Level, TokenId};
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingApi {
        posts: AtomicUsize,
        cancels: AtomicUsize,
    }

    #[async_trait]
    impl OrderApi for CountingApi {
        async fn create_and_post_limit(
            &self,
            _token: &TokenId,
            _price: Price,
            _size: crate::core::domain::Volume,
            _mode: OrderMode,
        ) -> Result<crate::core::exchange::traits::PlacedOrder> {
            let n = self.posts.fetch_add(1, Ordering::SeqCst);
            Ok(crate::core::exchange::traits::PlacedOrder {
                order_id: format!("o{n}"),
            })
        }

        async fn create_and_post_market(
            &self,
            _token: &TokenId,
            _notional: Price,
        ) -> Result<crate::core::exchange::traits::FilledOrder> {
            unreachable!()
        }

        async fn cancel(&self, _order_id: &str) -> Result<()> {
            self.cancels.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn cancel_all(&self) -> Result<()> {
            Ok(())
        }
    }

    fn book_with_bid(token: &str, bid: Price) -> Book {
        let mut book = Book::new(TokenId::from(token), MarketId::from("m"));
        book.apply_snapshot(vec![Level::new(bid, dec!(100))], vec![], None);
        book
    }

    fn config() -> MarketMakerConfig {
        MarketMakerConfig {
            enabled: true,
            quote_size: dec!(20),
            min_margin: dec!(0.01),
            requote_threshold: dec!(0.01),
            max_markets: 5,
            max_staleness: Duration::from_secs(3),
        }
    }

    #[tokio::test]
    async fn posts_quote_when_margin_clears_floor() {
        let api = Arc::new(CountingApi { posts: AtomicUsize::new(0), cancels: AtomicUsize::new(0) });
        let mm = MarketMaker::new(api.clone(), config());
        let market = MarketId::from("m");

        let up = book_with_bid("up", dec!(0.40));
        let down = book_with_bid("down", dec!(0.40));
        mm.on_book_update(&market, &up, &down).await.unwrap();

        assert_eq!(mm.active_quote_count(), 1);
        assert_eq!(api.posts.load(Ordering::SeqCst), 2);
        let quote = mm.active_quote(&market).unwrap();
        assert_eq!(quote.up_price, dec!(0.41));
        assert_eq!(quote.down_price, dec!(0.41));
    }

    #[tokio::test]
    async fn scenario_f_small_diff_does_not_requote() {
        let api = Arc::new(CountingApi { posts: AtomicUsize::new(0), cancels: AtomicUsize::new(0) });
        let mm = MarketMaker::new(api.clone(), config());
        let market = MarketId::from("m");

        mm.quotes.write().insert(
            market.clone(),
            Quote {
                market: market.clone(),
                up_price: dec!(0.42),
                down_price: dec!(0.53),
                exchange_order_ids: vec!["o1".into(), "o2".into()],
                posted_at_monotonic: Instant::now(),
            },
        );

        // best bids such that our_up=0.425->quantized 0.43? use bids that produce exactly 0.425/0.530 before quantize.
        let up = book_with_bid("up", dec!(0.415));
        let down = book_with_bid("down", dec!(0.52));
        mm.on_book_update(&market, &up, &down).await.unwrap();

        assert_eq!(api.posts.load(Ordering::SeqCst), 0);
        assert_eq!(api.cancels.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn rejects_when_margin_below_floor() {
        let api = Arc::new(CountingApi { posts: AtomicUsize::new(0), cancels: AtomicUsize::new(0) });
        let mm = MarketMaker::new(api.clone(), config());
        let market = MarketId::from("m");

        let up = book_with_bid("up", dec!(0.495));
        let down = book_with_bid("down", dec!(0.495));
        mm.on_book_update(&market, &up, &down).await.unwrap();

        assert_eq!(mm.active_quote_count(), 0);
    }

    #[tokio::test]
    async fn caps_concurrently_quoted_markets() {
        let api = Arc::new(CountingApi { posts: AtomicUsize::new(0), cancels: AtomicUsize::new(0) });
        let mut cfg = config();
        cfg.max_markets = 1;
        let mm = MarketMaker::new(api.clone(), cfg);

        let up = book_with_bid("up", dec!(0.40));
        let down = book_with_bid("down", dec!(0.40));
        mm.on_book_update(&MarketId::from("m1"), &up, &down).await.unwrap();
        mm.on_book_update(&MarketId::from("m2"), &up, &down).await.unwrap();

        assert_eq!(mm.active_quote_count(), 1);
    }

    #[tokio::test]
    async fn cancel_all_clears_every_quote() {
        let api = Arc::new(CountingApi { posts: AtomicUsize::new(0), cancels: AtomicUsize::new(0) });
        let mm = MarketMaker::new(api.clone(), config());

        let up = book_with_bid("up", dec!(0.40));
        let down = book_with_bid("down", dec!(0.40));
        mm.on_book_update(&MarketId::from("m1"), &up, &down).await.unwrap();
        assert_eq!(mm.active_quote_count(), 1);

        mm.cancel_all().await;
        assert_eq!(mm.active_quote_count(), 0);
        assert_eq!(api.cancels.load(Ordering::SeqCst), 2);
    }
}
