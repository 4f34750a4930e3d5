//! Wires the venue ports, the Orderbook Store, and the strategy/service
//! layer into the running process: fetch the active market list, stream
//! books, detect and dispatch arbitrage, and optionally quote passively.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use parking_lot::RwLock;
use tokio::sync::Semaphore;
use tokio::time::interval;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::config::Config;
use crate::app::registry::MarketRegistry;
use crate::app::supervisor::Supervisor;
use crate::core::domain::{MarketId, TokenId};
use crate::core::exchange::clob::{ClobMarketCatalog, ClobOrderApi, FeedPool};
use crate::core::exchange::traits::{MarketCatalog, MarketEvent, OrderApi};
use crate::core::exchange::DryRunOrderApi;
use crate::core::service::{build_plan, MarketMaker, MarketMakerConfig, OrderSubmitter, SubmitterConfig};
use crate::core::store::OrderbookStore;
use crate::core::strategy::{detect_arbitrage, select_strategy, DetectorConfig, SelectionInput};
use crate::error::{Error, Result};

const OPPORTUNITY_WORKER_PERMITS: usize = 8;
const NOTIFICATION_CAPACITY: usize = 4096;

/// Top-level running process. Owns every long-lived component and drives
/// the event loop in [`App::run`].
pub struct App {
    config: Arc<Config>,
    store: Arc<OrderbookStore>,
    registry: Arc<RwLock<MarketRegistry>>,
    supervisor: Arc<Supervisor>,
    submitter: Arc<OrderSubmitter>,
    submitter_config: SubmitterConfig,
    market_maker: Option<Arc<MarketMaker>>,
    catalog: Arc<dyn MarketCatalog>,
    opportunity_permits: Arc<Semaphore>,
}

impl App {
    /// Build every component from `config`. Performs no I/O beyond client
    /// construction; the first network call is the catalog fetch in
    /// [`App::run`].
    pub fn bootstrap(config: Config) -> Result<Self> {
        let config = Arc::new(config);
        let http_client = reqwest::Client::new();

        let catalog: Arc<dyn MarketCatalog> = Arc::new(ClobMarketCatalog::new(
            http_client.clone(),
            config.network.api_url.clone(),
        ));

        let order_api: Arc<dyn OrderApi> = if config.dry_run {
            Arc::new(DryRunOrderApi)
        } else {
            let api_key = config
                .api_key
                .clone()
                .ok_or_else(|| Error::Config(crate::error::ConfigError::MissingCredentials))?;
            Arc::new(ClobOrderApi::new(http_client, config.network.api_url.clone(), api_key))
        };

        let supervisor = Arc::new(Supervisor::new(config.trading.starting_bankroll));

        let submitter_config = SubmitterConfig {
            max_bet_size: config.trading.max_bet_size,
            max_bankroll_fraction: config.trading.max_bankroll_fraction,
            max_concurrent_workers: config.submission.max_concurrent_workers,
            order_timeout: Duration::from_secs(config.submission.order_timeout_secs),
            dry_run: config.dry_run,
        };
        let submitter = Arc::new(OrderSubmitter::new(order_api.clone(), submitter_config));

        let market_maker = config.market_maker.enabled.then(|| {
            Arc::new(MarketMaker::new(
                order_api.clone(),
                MarketMakerConfig {
                    enabled: config.market_maker.enabled,
                    quote_size: config.market_maker.quote_size,
                    min_margin: config.market_maker.min_margin,
                    requote_threshold: config.market_maker.requote_threshold,
                    max_markets: config.market_maker.max_markets,
                    max_staleness: Duration::from_millis(config.trading.max_book_staleness_ms),
                },
            ))
        });

        Ok(Self {
            store: Arc::new(OrderbookStore::new(NOTIFICATION_CAPACITY)),
            registry: Arc::new(RwLock::new(MarketRegistry::new())),
            supervisor,
            submitter,
            submitter_config,
            market_maker,
            catalog,
            opportunity_permits: Arc::new(Semaphore::new(OPPORTUNITY_WORKER_PERMITS)),
            config,
        })
    }

    /// Fetch the active market list, register up to `max_markets` of them,
    /// and (re)seed the Orderbook Store. Safe to call again on the refresh
    /// tick; newly discovered markets are simply added.
    async fn refresh_markets(&self) -> Result<Vec<TokenId>> {
        let markets = self.catalog.active_markets().await?;
        let mut registry = self.registry.write();
        let mut tokens = Vec::new();

        for market in markets.into_iter().take(self.config.max_markets) {
            if registry.is_registered(market.market_id()) {
                continue;
            }
            self.store.register(market.up_token().clone(), market.market_id().clone());
            self.store.register(market.down_token().clone(), market.market_id().clone());
            tokens.push(market.up_token().clone());
            tokens.push(market.down_token().clone());
            registry.register(market);
        }

        info!(total_markets = registry.len(), new_tokens = tokens.len(), "market catalog refreshed");
        Ok(tokens)
    }

    /// Drive the process until cooperatively shut down or the feed becomes
    /// unrecoverable. Returns `Err(Error::FeedUnrecoverable)` when every
    /// shard has been silent for longer than `feed.unrecoverable_secs`,
    /// which `main` maps to exit code 2.
    pub async fn run(self) -> Result<()> {
        let initial_tokens = self.refresh_markets().await?;
        if initial_tokens.is_empty() {
            warn!("no active markets at startup; feed pool will idle until the next refresh");
        }

        let idle_timeout = Duration::from_secs(self.config.feed.idle_timeout_secs);
        let mut feed_pool = FeedPool::spawn(
            &self.config.network.ws_url,
            initial_tokens,
            self.config.feed.tokens_per_connection,
            idle_timeout,
        );
        info!(shards = feed_pool.shard_count(), "feed pool started");

        let mut store_rx = self.store.subscribe();
        let mut refresh_tick = interval(Duration::from_secs(self.config.feed.market_refresh_secs));
        let mut liveness_tick = interval(Duration::from_secs(1));
        let unrecoverable_timeout = Duration::from_secs(self.config.feed.unrecoverable_secs);
        let mut last_event_at = Instant::now();
        let outcome: Result<()>;

        loop {
            if !self.supervisor.is_running() {
                info!("shutdown requested, draining in-flight work");
                outcome = Ok(());
                break;
            }

            tokio::select! {
                event = feed_pool.next_event() => {
                    match event {
                        Some(event) => {
                            last_event_at = Instant::now();
                            self.handle_market_event(event);
                        }
                        None => {
                            error!("all feed shards ended; feed is unrecoverable");
                            outcome = Err(Error::FeedUnrecoverable("every feed shard task exited".into()));
                            break;
                        }
                    }
                }
                update = store_rx.recv() => {
                    match update {
                        Ok(update) => self.handle_book_update(update.market, update.token).await,
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(skipped, "orchestrator lagged behind book update stream");
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => unreachable!("store outlives the orchestrator"),
                    }
                }
                _ = refresh_tick.tick() => {
                    if let Err(e) = self.refresh_markets().await {
                        warn!(error = %e, "market refresh failed, keeping current catalog");
                    }
                }
                _ = liveness_tick.tick() => {
                    // Per-shard idle timeouts are enforced inside `ClobFeed`
                    // itself (spec §4.1, §5): a silent shard reconnects on
                    // its own and surfaces a `Disconnected` event, which
                    // `handle_market_event` already turns into a
                    // mark-all-stale. This tick is purely the last-resort
                    // check for total feed death.
                    let idle_for = last_event_at.elapsed();
                    if idle_for > unrecoverable_timeout {
                        error!(idle_secs = idle_for.as_secs(), "feed silent past the unrecoverable threshold");
                        outcome = Err(Error::FeedUnrecoverable(format!(
                            "no feed events for {}s",
                            idle_for.as_secs()
                        )));
                        break;
                    }
                }
            }
        }

        self.shutdown().await;
        outcome
    }

    fn handle_market_event(&self, event: MarketEvent) {
        match event {
            MarketEvent::BookSnapshot { token, bids, asks, sequence } => {
                self.store.apply_snapshot(&token, bids, asks, sequence);
            }
            MarketEvent::PriceChange { token, bids_delta, asks_delta, sequence } => {
                self.store.apply_delta(&token, bids_delta, asks_delta, sequence);
            }
            MarketEvent::Trade { .. } => {
                // Informational only; no book mutation (spec §4.1).
            }
            MarketEvent::Disconnected { reason } => {
                debug!(%reason, "feed shard signaled a reconnect gap");
                self.supervisor.record_feed_reconnect();
                self.store.mark_all_stale();
            }
        }
    }

    /// React to a single book mutation: look up the market pair, run
    /// detection and (optionally) market-making, and dispatch any captured
    /// opportunity. Back-pressure: if every worker permit is taken, the
    /// opportunity is dropped rather than queued (spec §5).
    async fn handle_book_update(&self, market: MarketId, _changed_token: TokenId) {
        let Some(binary_market) = self.registry.read().market(&market).cloned() else {
            return;
        };

        let (up_book, down_book) = self.store.get_pair(binary_market.up_token(), binary_market.down_token());
        let (Some(up_book), Some(down_book)) = (up_book, down_book) else {
            return;
        };

        let max_staleness = Duration::from_millis(self.config.trading.max_book_staleness_ms);
        if up_book.is_stale(max_staleness) || down_book.is_stale(max_staleness) {
            self.supervisor.record_stale_skip();
            return;
        }

        if let Some(market_maker) = &self.market_maker {
            if let Err(e) = market_maker.on_book_update(&market, &up_book, &down_book).await {
                warn!(%market, error = %e, "market-maker quote update failed");
            }
        }

        let detector_config = DetectorConfig {
            min_margin: self.config.trading.min_profit_margin,
            max_staleness,
            fee_rate: self.config.trading.taker_fee_rate,
        };

        let Some(opportunity) = detect_arbitrage(&up_book, &down_book, &detector_config) else {
            return;
        };
        self.supervisor.record_opportunity_detected();

        let Ok(permit) = self.opportunity_permits.clone().try_acquire_owned() else {
            debug!(%market, "opportunity worker pool saturated, dropping opportunity");
            return;
        };

        let correlation_id = Uuid::new_v4();
        let seconds_to_expiry = binary_market.seconds_to_expiry(Utc::now());
        let selection = SelectionInput {
            seconds_to_expiry,
            margin: opportunity.per_pair_profit,
            combined_cost: opportunity.up_avg_price + opportunity.down_avg_price,
        };
        let strategy = select_strategy(&selection, self.config.trading.taker_fee_rate);

        info!(
            %correlation_id,
            %market,
            pairs = %opportunity.pairs,
            per_pair_profit = %opportunity.per_pair_profit,
            ?strategy,
            "arbitrage opportunity captured"
        );

        let submitter = self.submitter.clone();
        let supervisor = self.supervisor.clone();
        let bankroll = supervisor.bankroll();
        let plan = build_plan(
            &opportunity,
            strategy,
            bankroll,
            &up_book,
            &down_book,
            &self.submitter_config,
        );

        if plan.is_empty() {
            drop(permit);
            return;
        }

        tokio::spawn(async move {
            let _permit = permit;
            let execution = submitter.submit(&plan).await;
            supervisor.record_execution(execution.matched_pairs(), execution.total_cost());
            let failed = execution.failed_count();
            if failed > 0 {
                supervisor.record_orders_rejected(failed);
            }
            info!(
                %correlation_id,
                matched_pairs = %execution.matched_pairs(),
                total_cost = %execution.total_cost(),
                "opportunity dispatch complete"
            );
        });
    }

    /// Cancel outstanding market-maker quotes, log the session summary, and
    /// return. Outstanding submitter orders are left to their own timeouts;
    /// the spec treats in-flight order submission as non-cancellable once
    /// dispatched.
    async fn shutdown(&self) {
        if let Some(market_maker) = &self.market_maker {
            market_maker.cancel_all().await;
        }
        self.supervisor.log_summary();
    }

    #[must_use]
    pub fn supervisor(&self) -> Arc<Supervisor> {
        self.supervisor.clone()
    }
}
