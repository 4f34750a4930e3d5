//! Process wiring: configuration, session supervision, and the
//! orchestrator that drives the core library against a live venue.

pub mod config;
pub mod orchestrator;
pub mod registry;
pub mod supervisor;

pub use config::Config;
pub use orchestrator::App;
pub use registry::MarketRegistry;
pub use supervisor::Supervisor;
