//! Block Dashboard Data
//!
//! The two warehouse queries behind the dashboard and the typed results
//! they are shaped into:
//!
//! - [`BlockCounts`]: blocks mined today and in the trailing hour
//! - [`HourlySeries`]: blocks per hour over the trailing 24 hours

mod error;
mod fetch;
pub mod queries;
mod types;

pub use error::{DashboardError, DashboardResult};
pub use fetch::{fetch_block_counts, fetch_hourly_series};
pub use types::{BlockCounts, HourlyCount, HourlySeries};
