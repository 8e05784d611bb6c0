//! Typed dashboard results.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Block counts over two overlapping windows. No ordering holds between
/// the two values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BlockCounts {
    pub blocks_today: u64,
    pub blocks_last_hour: u64,
}

/// Blocks mined within one hour bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HourlyCount {
    /// Start of the hour
    pub hour: DateTime<Utc>,
    pub blocks_count: u64,
}

/// Hour buckets, strictly ascending. Hours without blocks are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HourlySeries {
    pub points: Vec<HourlyCount>,
}

impl HourlySeries {
    pub fn new(points: Vec<HourlyCount>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HourlyCount> {
        self.points.iter()
    }

    /// Sum of all buckets
    pub fn total(&self) -> u64 {
        self.points.iter().map(|p| p.blocks_count).sum()
    }

    /// True when every hour is later than the one before it
    pub fn is_strictly_increasing(&self) -> bool {
        self.points.windows(2).all(|w| w[0].hour < w[1].hour)
    }
}
