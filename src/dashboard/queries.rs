//! SQL for the dashboard queries.
//!
//! Both queries are evaluated against the warehouse clock
//! (`CURRENT_DATE()`, `CURRENT_TIMESTAMP()`), never the local one.

/// Blocks whose date is today, and blocks in the trailing 60 minutes, as
/// one row with columns `blocks_today` and `blocks_last_hour`.
pub fn block_counts_sql(table: &str) -> String {
    format!(
        r#"WITH blocks_today AS (
  SELECT COUNT(*) AS count
  FROM `{table}`
  WHERE DATE(timestamp) = CURRENT_DATE()
),
blocks_last_hour AS (
  SELECT COUNT(*) AS count
  FROM `{table}`
  WHERE timestamp >= TIMESTAMP_SUB(CURRENT_TIMESTAMP(), INTERVAL 1 HOUR)
)
SELECT
  (SELECT count FROM blocks_today) AS blocks_today,
  (SELECT count FROM blocks_last_hour) AS blocks_last_hour"#
    )
}

/// Blocks per hour bucket over the trailing 24 hours, ascending by hour.
/// Hours without blocks produce no row.
pub fn hourly_series_sql(table: &str) -> String {
    format!(
        r#"SELECT
  TIMESTAMP_TRUNC(timestamp, HOUR) AS hour,
  COUNT(*) AS blocks_count
FROM `{table}`
WHERE timestamp >= TIMESTAMP_SUB(CURRENT_TIMESTAMP(), INTERVAL 24 HOUR)
GROUP BY hour
ORDER BY hour"#
    )
}
