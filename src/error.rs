//! Crate-wide error types.
//!
//! Mirrors the error taxonomy from the system design: transient feed/order
//! errors are absorbed by the component that detects them and never reach
//! here as a propagated `Result::Err`; only fatal conditions cross component
//! boundaries as an `Error`.

use thiserror::Error;

/// Configuration load/validation failures. Always fatal at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("missing credentials for live trading (set DRY_RUN=true to run without them)")]
    MissingCredentials,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("not connected: {0}")]
    Connection(String),

    /// Subscribe rejected with a permanent-looking status; the feed shard
    /// that produced it should be marked failed rather than retried.
    #[error("feed subscription rejected: {0}")]
    FeedFatal(String),

    /// All feed shards have been down for longer than the unrecoverable
    /// threshold. The supervisor exits with code 2 on this error.
    #[error("all feed shards unreachable: {0}")]
    FeedUnrecoverable(String),

    #[error("order submission failed: {0}")]
    OrderRejected(String),

    #[error("execution error: {0}")]
    Execution(String),
}

pub type Result<T> = std::result::Result<T, Error>;
