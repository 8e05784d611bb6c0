//! Render output types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::dashboard::{BlockCounts, HourlyCount, HourlySeries};

pub const METRIC_BLOCKS_TODAY: &str = "Blocks Mined Today";
pub const METRIC_BLOCKS_LAST_HOUR: &str = "Blocks in Last Hour";
pub const CHART_SUBHEADER: &str = "Blocks per hour (last 24 hours)";

/// A labeled scalar
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricView {
    pub label: String,
    pub value: u64,
}

/// A line chart keyed by the `x` column with values from the `y` column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartView {
    pub x: String,
    pub y: String,
    pub data: Vec<HourlyCount>,
}

/// One fully rendered dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardView {
    pub title: String,
    pub auto_refresh: bool,
    pub auto_refresh_line: String,
    pub metrics: Vec<MetricView>,
    pub subheader: String,
    pub chart: ChartView,
    pub rendered_at: DateTime<Utc>,
}

impl DashboardView {
    pub fn new(
        title: &str,
        auto_refresh: bool,
        counts: BlockCounts,
        series: HourlySeries,
    ) -> Self {
        Self {
            title: title.to_string(),
            auto_refresh,
            auto_refresh_line: format!("Auto Refresh is currently: **{}**", auto_refresh),
            metrics: vec![
                MetricView {
                    label: METRIC_BLOCKS_TODAY.to_string(),
                    value: counts.blocks_today,
                },
                MetricView {
                    label: METRIC_BLOCKS_LAST_HOUR.to_string(),
                    value: counts.blocks_last_hour,
                },
            ],
            subheader: CHART_SUBHEADER.to_string(),
            chart: ChartView {
                x: "hour".to_string(),
                y: "blocks_count".to_string(),
                data: series.points,
            },
            rendered_at: Utc::now(),
        }
    }

    /// Value of a metric by label
    #[cfg(test)]
    pub(crate) fn metric(&self, label: &str) -> Option<u64> {
        self.metrics.iter().find(|m| m.label == label).map(|m| m.value)
    }
}
