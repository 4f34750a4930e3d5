//! Single WebSocket connection to the venue's streaming market-data channel.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use super::messages::{parse_levels, SubscribeMessage, WsMessage};
use crate::core::domain::TokenId;
use crate::core::exchange::traits::{connection_error, MarketDataFeed, MarketEvent};
use crate::error::Result;

/// One connection to the venue's market-data channel, carrying at most
/// `MAX_TOKENS_PER_CONNECTION` subscriptions (sharding is the caller's
/// responsibility, via [`super::pool::FeedPool`]).
pub struct ClobFeed {
    url: String,
    ws: Option<WebSocketStream<MaybeTlsStream<TcpStream>>>,
    /// Frames may carry an array of events (spec §6); `next_event` hands
    /// them out one at a time, queueing the rest here.
    pending: VecDeque<MarketEvent>,
    /// No message (including a server ping) received within this window
    /// forces a reconnect (spec §4.1 "liveness": "drop and reconnect if no
    /// message received within a configurable idle window").
    idle_timeout: Duration,
}

impl ClobFeed {
    #[must_use]
    pub const fn new(url: String, idle_timeout: Duration) -> Self {
        Self { url, ws: None, pending: VecDeque::new(), idle_timeout }
    }

    /// Decode one raw text frame into zero or more events. A frame may be
    /// a single JSON object or an array of objects; either way each
    /// element is decoded independently so one malformed entry doesn't
    /// drop its siblings.
    fn decode_frame(text: &str) -> VecDeque<MarketEvent> {
        let mut events = VecDeque::new();
        let value: Value = match serde_json::from_str(text) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, raw = %text, "failed to parse feed frame as json");
                return events;
            }
        };

        let items: Vec<&Value> = match &value {
            Value::Array(items) => items.iter().collect(),
            _ => vec![&value],
        };

        for item in items {
            match serde_json::from_value::<WsMessage>(item.clone()) {
                Ok(WsMessage::Book(book)) => {
                    events.push_back(MarketEvent::BookSnapshot {
                        token: book.token(),
                        bids: parse_levels(&book.bids),
                        asks: parse_levels(&book.asks),
                        sequence: book.hash.clone(),
                    });
                }
                Ok(WsMessage::PriceChange(change)) => {
                    events.push_back(MarketEvent::PriceChange {
                        token: change.token(),
                        bids_delta: parse_levels(&change.bids),
                        asks_delta: parse_levels(&change.asks),
                        sequence: None,
                    });
                }
                Ok(WsMessage::LastTradePrice(trade)) => {
                    if let (Ok(price), Ok(size)) = (trade.price.parse(), trade.size.parse()) {
                        events.push_back(MarketEvent::Trade {
                            token: TokenId::from(trade.asset_id.clone()),
                            price,
                            size,
                        });
                    }
                }
                Ok(WsMessage::Unknown) => {}
                Err(e) => {
                    warn!(error = %e, item = %item, "failed to parse feed event");
                }
            }
        }

        events
    }
}

#[async_trait]
impl MarketDataFeed for ClobFeed {
    async fn connect(&mut self) -> Result<()> {
        info!(url = %self.url, "connecting to market data feed");
        let (ws_stream, response) = connect_async(&self.url).await?;
        info!(status = %response.status(), "market data feed connected");
        self.ws = Some(ws_stream);
        Ok(())
    }

    async fn subscribe(&mut self, tokens: &[TokenId]) -> Result<()> {
        let ws = self.ws.as_mut().ok_or_else(|| connection_error("not connected"))?;

        let asset_ids: Vec<String> = tokens.iter().map(|t| t.as_str().to_string()).collect();
        let msg = SubscribeMessage::new(asset_ids.clone());
        let json = serde_json::to_string(&msg)?;

        info!(tokens = asset_ids.len(), "subscribing to assets");
        ws.send(Message::Text(json)).await?;
        Ok(())
    }

    async fn next_event(&mut self) -> Option<MarketEvent> {
        if let Some(event) = self.pending.pop_front() {
            return Some(event);
        }

        let idle_timeout = self.idle_timeout;
        let ws = self.ws.as_mut()?;

        loop {
            let next = match timeout(idle_timeout, ws.next()).await {
                Ok(next) => next,
                Err(_) => {
                    warn!(idle_secs = idle_timeout.as_secs(), "no feed message within the idle window, reconnecting");
                    return Some(MarketEvent::Disconnected {
                        reason: "idle timeout, no messages received".into(),
                    });
                }
            };

            match next? {
                Ok(Message::Text(text)) => {
                    debug!(raw = %text, "received feed message");
                    self.pending = Self::decode_frame(&text);
                    if let Some(event) = self.pending.pop_front() {
                        return Some(event);
                    }
                    continue;
                }
                Ok(Message::Ping(data)) => {
                    debug!("received ping");
                    if ws.send(Message::Pong(data)).await.is_err() {
                        return Some(MarketEvent::Disconnected {
                            reason: "failed to send pong".into(),
                        });
                    }
                }
                Ok(Message::Close(frame)) => {
                    info!(frame = ?frame, "feed closed by server");
                    return Some(MarketEvent::Disconnected {
                        reason: frame.map(|f| f.reason.to_string()).unwrap_or_default(),
                    });
                }
                Ok(_) => continue,
                Err(e) => {
                    return Some(MarketEvent::Disconnected { reason: e.to_string() });
                }
            }
        }
    }

    fn exchange_name(&self) -> &'static str {
        "clob"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_single_object_frame() {
        let raw = r#"{"event_type":"book","asset_id":"tok1","bids":[],"asks":[{"price":"0.48","size":"10"}],"hash":"h1"}"#;
        let events = ClobFeed::decode_frame(raw);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], MarketEvent::BookSnapshot { .. }));
    }

    #[test]
    fn decodes_array_of_events_frame() {
        let raw = r#"[
            {"event_type":"book","asset_id":"tok1","bids":[],"asks":[{"price":"0.48","size":"10"}],"hash":"h1"},
            {"event_type":"last_trade_price","asset_id":"tok1","price":"0.48","size":"5"}
        ]"#;
        let events = ClobFeed::decode_frame(raw);
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], MarketEvent::BookSnapshot { .. }));
        assert!(matches!(events[1], MarketEvent::Trade { .. }));
    }

    #[test]
    fn array_frame_with_one_malformed_entry_keeps_the_rest() {
        let raw = r#"[
            {"event_type":"price_change","asset_id":"tok1","bids":[],"asks":[{"price":"0.48","size":"0"}]},
            {"event_type":"book"}
        ]"#;
        let events = ClobFeed::decode_frame(raw);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn empty_array_frame_yields_no_events() {
        let events = ClobFeed::decode_frame("[]");
        assert!(events.is_empty());
    }
}
