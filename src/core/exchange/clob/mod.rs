//! Concrete adapter for the venue's CLOB-style feed, order API, and catalog.

pub mod catalog;
pub mod http;
pub mod messages;
pub mod pool;
pub mod websocket;

pub use catalog::ClobMarketCatalog;
pub use http::ClobOrderApi;
pub use pool::FeedPool;
pub use websocket::ClobFeed;

/// Default maximum tokens per feed connection before the pool opens another
/// shard (spec §4.1).
pub const DEFAULT_TOKENS_PER_CONNECTION: usize = 450;
