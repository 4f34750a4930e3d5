//! Cross-cutting services built on top of the domain layer and venue
//! ports: order submission and optional market-making.

pub mod market_maker;
pub mod submitter;

pub use market_maker::{MarketMaker, MarketMakerConfig};
pub use submitter::{build_plan, target_suborder_size, OrderSubmitter, SubmitterConfig};
