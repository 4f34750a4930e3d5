//! Pure value types shared across the engine: identifiers, money, books,
//! markets, opportunities, orders, quotes, and session state.

pub mod book;
pub mod id;
pub mod market;
pub mod money;
pub mod opportunity;
pub mod order;
pub mod quote;
pub mod session;

pub use book::{Book, Level, Side};
pub use id::{MarketId, OrderId, TokenId};
pub use market::BinaryMarket;
pub use money::{quantize, Price, Volume, TICK};
pub use opportunity::Opportunity;
pub use order::{Execution, OrderMode, OrderPlan, OrderResult, PlannedOrder};
pub use quote::Quote;
pub use session::{SessionState, SessionStats};
