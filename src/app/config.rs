//! Process-wide configuration: loaded once from a TOML file with
//! environment-variable overrides for secrets, validated at startup, then
//! passed by `Arc` reference to every component (spec §6, §9 "process-wide
//! configuration" design note).

use std::path::Path;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};

use crate::core::domain::Price;
use crate::error::{ConfigError, Result};

/// Network endpoints for the venue's streaming feed, order API, and market
/// catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    pub ws_url: String,
    pub api_url: String,
}

fn default_ws_url() -> String {
    "wss://ws-subscriptions-clob.polymarket.com/ws/market".to_string()
}

fn default_api_url() -> String {
    "https://clob.polymarket.com".to_string()
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            ws_url: default_ws_url(),
            api_url: default_api_url(),
        }
    }
}

/// Detection and sizing thresholds (spec §6).
#[derive(Debug, Clone, Deserialize)]
pub struct TradingConfig {
    #[serde(default = "default_min_profit_margin")]
    pub min_profit_margin: Price,
    #[serde(default = "default_max_bet_size")]
    pub max_bet_size: Price,
    #[serde(default = "default_max_bankroll_fraction")]
    pub max_bankroll_fraction: Price,
    /// Polling fallback interval; unused while the streaming feed is up
    /// (spec §6: "unused in streaming mode; polling fallback only").
    #[serde(default = "default_scan_interval_secs")]
    pub scan_interval_secs: u64,
    #[serde(default = "default_max_book_staleness_ms")]
    pub max_book_staleness_ms: u64,
    #[serde(default = "default_taker_fee_rate")]
    pub taker_fee_rate: Price,
    #[serde(default = "default_maker_fee_rate")]
    pub maker_fee_rate: Price,
    #[serde(default = "default_starting_bankroll")]
    pub starting_bankroll: Price,
}

fn default_min_profit_margin() -> Price {
    dec!(0.01)
}
fn default_max_bet_size() -> Price {
    dec!(50)
}
fn default_max_bankroll_fraction() -> Price {
    dec!(0.05)
}
fn default_scan_interval_secs() -> u64 {
    2
}
fn default_max_book_staleness_ms() -> u64 {
    3000
}
fn default_taker_fee_rate() -> Price {
    dec!(0.015)
}
fn default_maker_fee_rate() -> Price {
    Decimal::ZERO
}
fn default_starting_bankroll() -> Price {
    dec!(500)
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            min_profit_margin: default_min_profit_margin(),
            max_bet_size: default_max_bet_size(),
            max_bankroll_fraction: default_max_bankroll_fraction(),
            scan_interval_secs: default_scan_interval_secs(),
            max_book_staleness_ms: default_max_book_staleness_ms(),
            taker_fee_rate: default_taker_fee_rate(),
            maker_fee_rate: default_maker_fee_rate(),
            starting_bankroll: default_starting_bankroll(),
        }
    }
}

/// Market-maker knobs (spec §4.6, §6).
#[derive(Debug, Clone, Deserialize)]
pub struct MarketMakerSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_mm_quote_size")]
    pub quote_size: Price,
    #[serde(default = "default_mm_min_margin")]
    pub min_margin: Price,
    #[serde(default = "default_mm_requote_threshold")]
    pub requote_threshold: Price,
    #[serde(default = "default_mm_max_markets")]
    pub max_markets: usize,
}

fn default_mm_quote_size() -> Price {
    dec!(20)
}
fn default_mm_min_margin() -> Price {
    dec!(0.01)
}
fn default_mm_requote_threshold() -> Price {
    dec!(0.01)
}
fn default_mm_max_markets() -> usize {
    10
}

impl Default for MarketMakerSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            quote_size: default_mm_quote_size(),
            min_margin: default_mm_min_margin(),
            requote_threshold: default_mm_requote_threshold(),
            max_markets: default_mm_max_markets(),
        }
    }
}

/// Feed sharding and liveness knobs (spec §4.1, §5).
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_tokens_per_connection")]
    pub tokens_per_connection: usize,
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_market_refresh_secs")]
    pub market_refresh_secs: u64,
    /// All feed shards down longer than this triggers exit code 2 (spec §6, §7).
    #[serde(default = "default_unrecoverable_secs")]
    pub unrecoverable_secs: u64,
}

fn default_tokens_per_connection() -> usize {
    crate::core::exchange::clob::DEFAULT_TOKENS_PER_CONNECTION
}
fn default_idle_timeout_secs() -> u64 {
    30
}
fn default_market_refresh_secs() -> u64 {
    30
}
fn default_unrecoverable_secs() -> u64 {
    60
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            tokens_per_connection: default_tokens_per_connection(),
            idle_timeout_secs: default_idle_timeout_secs(),
            market_refresh_secs: default_market_refresh_secs(),
            unrecoverable_secs: default_unrecoverable_secs(),
        }
    }
}

/// Order submission worker pool and timeout knobs (spec §4.5, §5).
#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionConfig {
    #[serde(default = "default_order_timeout_secs")]
    pub order_timeout_secs: u64,
    #[serde(default = "default_max_concurrent_workers")]
    pub max_concurrent_workers: usize,
}

fn default_order_timeout_secs() -> u64 {
    10
}
fn default_max_concurrent_workers() -> usize {
    4
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            order_timeout_secs: default_order_timeout_secs(),
            max_concurrent_workers: default_max_concurrent_workers(),
        }
    }
}

/// `tracing-subscriber` setup knobs, matching the teacher's
/// `app::config::LoggingConfig::init`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "text".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    pub fn init(&self) {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));
        match self.format.as_str() {
            "json" => {
                fmt().json().with_env_filter(filter).init();
            }
            _ => {
                fmt().with_env_filter(filter).init();
            }
        }
    }
}

/// Top-level process configuration. Immutable once loaded; every component
/// receives an `Arc<Config>` (or a narrower config struct built from it) at
/// construction and never mutates it.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub trading: TradingConfig,
    #[serde(default, rename = "market_maker")]
    pub market_maker: MarketMakerSettings,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub submission: SubmissionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// When true, the Submitter synthesizes fills instead of calling the
    /// venue's order API, and live credentials are not required. Defaults
    /// to true, matching the original bot's conservative default.
    #[serde(default = "default_dry_run")]
    pub dry_run: bool,
    /// Maximum number of active markets to register with the Feed Client.
    #[serde(default = "default_max_markets")]
    pub max_markets: usize,
    /// Venue API key, loaded from `VENUE_API_KEY`, never from the config
    /// file. Required unless `dry_run` is set (spec §6, §7 `ConfigInvalid`).
    #[serde(skip)]
    pub api_key: Option<String>,
}

fn default_max_markets() -> usize {
    20
}

fn default_dry_run() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            trading: TradingConfig::default(),
            market_maker: MarketMakerSettings::default(),
            feed: FeedConfig::default(),
            submission: SubmissionConfig::default(),
            logging: LoggingConfig::default(),
            dry_run: true,
            max_markets: default_max_markets(),
            api_key: None,
        }
    }
}

impl Config {
    /// Load from a TOML file, overlay the `VENUE_API_KEY` environment
    /// variable, and validate. A missing config file falls back to
    /// built-in defaults (dry-run friendly for local development); a
    /// malformed one is always fatal.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config: Self = match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => return Err(ConfigError::ReadFile(e).into()),
        };

        config.api_key = std::env::var("VENUE_API_KEY").ok();
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.network.ws_url.is_empty() {
            return Err(ConfigError::MissingField { field: "network.ws_url" }.into());
        }
        if self.network.api_url.is_empty() {
            return Err(ConfigError::MissingField { field: "network.api_url" }.into());
        }
        if self.trading.min_profit_margin <= Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: "trading.min_profit_margin",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.trading.max_bankroll_fraction <= Decimal::ZERO || self.trading.max_bankroll_fraction > Decimal::ONE {
            return Err(ConfigError::InvalidValue {
                field: "trading.max_bankroll_fraction",
                reason: "must be in (0, 1]".to_string(),
            }
            .into());
        }
        if self.market_maker.max_markets == 0 {
            return Err(ConfigError::InvalidValue {
                field: "market_maker.max_markets",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.submission.max_concurrent_workers == 0 {
            return Err(ConfigError::InvalidValue {
                field: "submission.max_concurrent_workers",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if !self.dry_run && self.api_key.is_none() {
            return Err(ConfigError::MissingCredentials);
        }
        Ok(())
    }
}
