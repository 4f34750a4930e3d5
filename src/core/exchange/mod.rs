//! Venue-facing ports (traits) and the concrete CLOB adapter that
//! implements them.

pub mod clob;
pub mod dry_run;
pub mod reconnecting;
pub mod traits;

pub use dry_run::DryRunOrderApi;
pub use reconnecting::ReconnectingFeed;
pub use traits::{
    connection_error, is_order_rejection, FilledOrder, MarketCatalog, MarketDataFeed, MarketEvent,
    OrderApi, PlacedOrder,
};
