//! Query execution and result shaping.

use chrono::{DateTime, NaiveDateTime, Utc};
use std::time::Instant;

use super::queries::{block_counts_sql, hourly_series_sql};
use super::{BlockCounts, DashboardError, DashboardResult, HourlyCount, HourlySeries};
use crate::warehouse::{ResultSet, Warehouse};

/// Run the metrics query. The result must be exactly one row carrying
/// `blocks_today` and `blocks_last_hour`.
pub async fn fetch_block_counts(
    warehouse: &dyn Warehouse,
    table: &str,
) -> DashboardResult<BlockCounts> {
    let started = Instant::now();
    let rs = warehouse.query(&block_counts_sql(table)).await?;

    if rs.len() != 1 {
        return Err(DashboardError::ResultShape(format!(
            "expected exactly one row of block counts, got {}",
            rs.len()
        )));
    }
    require_columns(&rs, &["blocks_today", "blocks_last_hour"])?;

    let counts = BlockCounts {
        blocks_today: parse_count(&rs, 0, "blocks_today")?,
        blocks_last_hour: parse_count(&rs, 0, "blocks_last_hour")?,
    };

    tracing::debug!(
        blocks_today = counts.blocks_today,
        blocks_last_hour = counts.blocks_last_hour,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Fetched block counts"
    );
    Ok(counts)
}

/// Run the hourly series query. An empty result is a valid, empty series.
pub async fn fetch_hourly_series(
    warehouse: &dyn Warehouse,
    table: &str,
) -> DashboardResult<HourlySeries> {
    let started = Instant::now();
    let rs = warehouse.query(&hourly_series_sql(table)).await?;
    require_columns(&rs, &["hour", "blocks_count"])?;

    let mut points = Vec::with_capacity(rs.len());
    for row in 0..rs.len() {
        let raw = rs.cell(row, "hour").ok_or_else(|| {
            DashboardError::ResultShape(format!("row {}: hour is NULL", row))
        })?;
        let hour = parse_timestamp(raw).ok_or_else(|| {
            DashboardError::ResultShape(format!("row {}: unparseable hour {:?}", row, raw))
        })?;
        points.push(HourlyCount {
            hour,
            blocks_count: parse_count(&rs, row, "blocks_count")?,
        });
    }

    let series = HourlySeries::new(points);
    if !series.is_strictly_increasing() {
        return Err(DashboardError::ResultShape(
            "hourly series is not strictly ascending by hour".to_string(),
        ));
    }

    tracing::debug!(
        buckets = series.len(),
        total_blocks = series.total(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Fetched hourly series"
    );
    Ok(series)
}

fn require_columns(rs: &ResultSet, names: &[&str]) -> DashboardResult<()> {
    for name in names {
        if rs.column_index(name).is_none() {
            return Err(DashboardError::ResultShape(format!(
                "missing column {}",
                name
            )));
        }
    }
    Ok(())
}

/// Non-negative integer cell
fn parse_count(rs: &ResultSet, row: usize, column: &str) -> DashboardResult<u64> {
    let raw = rs.cell(row, column).ok_or_else(|| {
        DashboardError::ResultShape(format!("row {}: {} is NULL", row, column))
    })?;

    raw.trim().parse::<u64>().map_err(|_| {
        DashboardError::ResultShape(format!(
            "row {}: {} is not a non-negative integer: {:?}",
            row, column, raw
        ))
    })
}

/// Timestamps arrive as epoch seconds in float notation ("1.6990848E9")
/// from the REST API; RFC 3339 and "YYYY-MM-DD HH:MM:SS[.f] UTC" are
/// accepted too.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(secs) = raw.parse::<f64>() {
        if !secs.is_finite() {
            return None;
        }
        return DateTime::from_timestamp_millis((secs * 1000.0).round() as i64);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(raw.trim_end_matches(" UTC"), "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
