//! Orderbook Store: per-token books, update fan-out, staleness checks.

use std::collections::HashMap;

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::debug;

use crate::core::domain::{Book, Level, MarketId, TokenId};

/// Sent to subscribers after every applied book mutation.
#[derive(Debug, Clone)]
pub struct BookUpdate {
    pub token: TokenId,
    pub market: MarketId,
}

/// Owns every registered token's [`Book`]. Writes are serialized per token
/// by `parking_lot::RwLock`'s write lock; reads may run concurrently with
/// writes to *other* tokens and always observe a fully-applied mutation,
/// never a torn ladder, because each mutation holds the write guard for its
/// full duration.
pub struct OrderbookStore {
    books: RwLock<HashMap<TokenId, Book>>,
    tx: broadcast::Sender<BookUpdate>,
}

impl OrderbookStore {
    #[must_use]
    pub fn new(notification_capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(notification_capacity);
        Self {
            books: RwLock::new(HashMap::new()),
            tx,
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<BookUpdate> {
        self.tx.subscribe()
    }

    /// Register a token's book for the process lifetime. Idempotent; a
    /// second registration for an already-known token is a no-op.
    pub fn register(&self, token: TokenId, market: MarketId) {
        self.books
            .write()
            .entry(token.clone())
            .or_insert_with(|| Book::new(token, market));
    }

    #[must_use]
    pub fn get(&self, token: &TokenId) -> Option<Book> {
        self.books.read().get(token).cloned()
    }

    /// Read two books atomically with respect to each other (a single read
    /// lock acquisition per book; the store does not hold one combined
    /// lock, so the pair may still straddle concurrent writes to the two
    /// different tokens — callers rely on the staleness check, not on
    /// cross-token ordering, per the concurrency model).
    #[must_use]
    pub fn get_pair(&self, up: &TokenId, down: &TokenId) -> (Option<Book>, Option<Book>) {
        let books = self.books.read();
        (books.get(up).cloned(), books.get(down).cloned())
    }

    pub fn apply_snapshot(&self, token: &TokenId, bids: Vec<Level>, asks: Vec<Level>, sequence: Option<String>) {
        let market = {
            let mut books = self.books.write();
            let Some(book) = books.get_mut(token) else {
                debug!(%token, "snapshot for unregistered token, dropped");
                return;
            };
            book.apply_snapshot(bids, asks, sequence);
            book.market().clone()
        };
        let _ = self.tx.send(BookUpdate { token: token.clone(), market });
    }

    pub fn apply_delta(&self, token: &TokenId, bids_delta: Vec<Level>, asks_delta: Vec<Level>, sequence: Option<String>) {
        let market = {
            let mut books = self.books.write();
            let Some(book) = books.get_mut(token) else {
                debug!(%token, "delta for unregistered token, dropped");
                return;
            };
            book.apply_delta(&bids_delta, &asks_delta, sequence);
            book.market().clone()
        };
        let _ = self.tx.send(BookUpdate { token: token.clone(), market });
    }

    /// Mark every registered book stale, e.g. after a feed shard
    /// reconnects without knowing precisely which tokens it served.
    pub fn mark_all_stale(&self) {
        for book in self.books.write().values_mut() {
            book.mark_stale();
        }
    }

    pub fn mark_stale(&self, token: &TokenId) {
        if let Some(book) = self.books.write().get_mut(token) {
            book.mark_stale();
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.books.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
