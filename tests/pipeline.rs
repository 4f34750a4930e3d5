//! End-to-end exercise of the Orderbook Store -> Detector -> Selector ->
//! Submitter pipeline, without the network-facing venue adapters.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use duoedge::core::domain::{Level, MarketId, OrderMode, Price, TokenId, Volume};
use duoedge::core::exchange::traits::{FilledOrder, OrderApi, PlacedOrder};
use duoedge::core::service::{build_plan, OrderSubmitter, SubmitterConfig};
use duoedge::core::store::OrderbookStore;
use duoedge::core::strategy::{detect_arbitrage, select_strategy, DetectorConfig, SelectionInput};
use rust_decimal_macros::dec;

struct RecordingOrderApi {
    posted: std::sync::atomic::AtomicUsize,
}

#[async_trait]
impl OrderApi for RecordingOrderApi {
    async fn create_and_post_limit(
        &self,
        _token: &TokenId,
        _price: Price,
        _size: Volume,
        _mode: OrderMode,
    ) -> duoedge::error::Result<PlacedOrder> {
        unreachable!("this scenario always crosses the spread as a taker")
    }

    async fn create_and_post_market(&self, token: &TokenId, notional: Price) -> duoedge::error::Result<FilledOrder> {
        self.posted.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(FilledOrder {
            order_id: format!("fill-{token}"),
            filled_size: notional / dec!(0.48),
            filled_cost: notional,
        })
    }

    async fn cancel(&self, _order_id: &str) -> duoedge::error::Result<()> {
        Ok(())
    }

    async fn cancel_all(&self) -> duoedge::error::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn clean_arbitrage_is_detected_planned_and_submitted() {
    let store = OrderbookStore::new(16);
    let market = MarketId::from("btc-5m-1234");
    let up = TokenId::from("up-token");
    let down = TokenId::from("down-token");
    store.register(up.clone(), market.clone());
    store.register(down.clone(), market.clone());

    store.apply_snapshot(&up, vec![], vec![Level::new(dec!(0.48), dec!(100))], None);
    store.apply_snapshot(&down, vec![], vec![Level::new(dec!(0.48), dec!(100))], None);

    let (up_book, down_book) = store.get_pair(&up, &down);
    let (up_book, down_book) = (up_book.unwrap(), down_book.unwrap());

    let detector_config = DetectorConfig {
        min_margin: dec!(0.01),
        max_staleness: Duration::from_secs(3),
        fee_rate: dec!(0.015),
    };
    let opportunity = detect_arbitrage(&up_book, &down_book, &detector_config).expect("clean arb should be found");
    assert_eq!(opportunity.pairs, dec!(100));

    let selection = SelectionInput {
        seconds_to_expiry: 20,
        margin: opportunity.per_pair_profit,
        combined_cost: opportunity.up_avg_price + opportunity.down_avg_price,
    };
    let strategy = select_strategy(&selection, dec!(0.015));
    assert_eq!(strategy, duoedge::core::strategy::ExecutionStrategy::Taker);

    let submitter_config = SubmitterConfig {
        max_bet_size: dec!(50),
        max_bankroll_fraction: dec!(0.05),
        max_concurrent_workers: 4,
        order_timeout: Duration::from_secs(10),
        dry_run: false,
    };
    let plan = build_plan(&opportunity, strategy, dec!(1000), &up_book, &down_book, &submitter_config);
    assert!(!plan.is_empty());

    let api = Arc::new(RecordingOrderApi { posted: std::sync::atomic::AtomicUsize::new(0) });
    let submitter = OrderSubmitter::new(api.clone(), submitter_config);
    let execution = submitter.submit(&plan).await;

    assert!(execution.matched_pairs() > rust_decimal::Decimal::ZERO);
    assert!(api.posted.load(std::sync::atomic::Ordering::SeqCst) > 0);
}

#[test]
fn stale_book_never_reaches_the_detector() {
    let store = OrderbookStore::new(16);
    let market = MarketId::from("m");
    let up = TokenId::from("u");
    let down = TokenId::from("d");
    store.register(up.clone(), market.clone());
    store.register(down.clone(), market.clone());
    store.apply_snapshot(&up, vec![], vec![Level::new(dec!(0.45), dec!(100))], None);
    store.apply_snapshot(&down, vec![], vec![Level::new(dec!(0.45), dec!(100))], None);

    store.mark_all_stale();

    let (up_book, down_book) = store.get_pair(&up, &down);
    let (up_book, down_book) = (up_book.unwrap(), down_book.unwrap());
    let config = DetectorConfig {
        min_margin: dec!(0.01),
        max_staleness: Duration::from_secs(3),
        fee_rate: dec!(0),
    };
    assert!(detect_arbitrage(&up_book, &down_book, &config).is_none());
}

#[test]
fn market_registry_round_trips_a_refreshed_catalog() {
    use duoedge::app::MarketRegistry;
    use duoedge::core::domain::BinaryMarket;

    let mut registry = MarketRegistry::new();
    let expiry = Utc::now() + chrono::Duration::minutes(5);
    registry.register(BinaryMarket::new(
        MarketId::from("m1"),
        TokenId::from("m1-up"),
        TokenId::from("m1-down"),
        expiry,
    ));

    assert_eq!(registry.len(), 1);
    let found = registry.market_for_token(&TokenId::from("m1-up")).expect("token should resolve");
    assert_eq!(found.market_id(), &MarketId::from("m1"));
}
