pub mod config;
pub mod export;
pub mod models;
pub mod scrapers;

pub use config::ScoutConfig;
pub use models::{ListingRecord, MAKES};
