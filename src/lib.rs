//! Fuel report - fuel cost, idling and speed metrics from trip CSV exports
//!
//! Vendor trip exports are normalized into canonical `TripRecord`s, enriched
//! with derived fuel metrics and aggregated per driver.

pub mod cli;
pub mod columns;
pub mod config;
pub mod credentials;
pub mod error;
pub mod loader;
pub mod metrics;
pub mod output;
pub mod reports;
pub mod types;
pub mod util;

pub use error::{Error, Result};
