//! A single render cycle.

use std::fmt;
use std::sync::Arc;

use super::DashboardView;
use crate::dashboard::{
    fetch_block_counts, fetch_hourly_series, BlockCounts, DashboardError, DashboardResult,
    HourlySeries,
};
use crate::session::Session;
use crate::warehouse::Warehouse;

/// Phases a render cycle passes through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    Idle,
    Toggling,
    Querying,
    Rendering,
    MaybeSleeping,
    Failed,
}

impl fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CyclePhase::Idle => "idle",
            CyclePhase::Toggling => "toggling",
            CyclePhase::Querying => "querying",
            CyclePhase::Rendering => "rendering",
            CyclePhase::MaybeSleeping => "maybe_sleeping",
            CyclePhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Runs render cycles against one warehouse
pub struct Renderer {
    warehouse: Arc<dyn Warehouse>,
    blocks_table: String,
    title: String,
}

impl Renderer {
    pub fn new(
        warehouse: Arc<dyn Warehouse>,
        blocks_table: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            warehouse,
            blocks_table: blocks_table.into(),
            title: title.into(),
        }
    }

    pub fn warehouse(&self) -> &Arc<dyn Warehouse> {
        &self.warehouse
    }

    /// Run one cycle for `session`.
    ///
    /// With `toggle` set the auto-refresh flag is flipped first; the view
    /// produced by the same pass already reflects the new value. The counts
    /// query runs before the hourly query, sequentially. Any failure moves
    /// the cycle to `Failed` and ends it with the error and no view.
    pub async fn run_cycle(
        &self,
        session: &mut Session,
        toggle: bool,
    ) -> DashboardResult<DashboardView> {
        let mut step = if toggle { Step::Toggling } else { Step::Idle };

        loop {
            tracing::trace!(session_id = %session.id, phase = %step.phase(), "Render cycle phase");

            step = match step {
                Step::Idle => Step::Querying,
                Step::Toggling => {
                    let enabled = session.state.toggle();
                    tracing::info!(session_id = %session.id, auto_refresh = enabled, "Auto refresh toggled");
                    Step::Querying
                }
                Step::Querying => match self.fetch().await {
                    Ok((counts, series)) => Step::Rendering(counts, series),
                    Err(e) => Step::Failed(e),
                },
                Step::Rendering(counts, series) => Step::MaybeSleeping(DashboardView::new(
                    &self.title,
                    session.auto_refresh(),
                    counts,
                    series,
                )),
                Step::MaybeSleeping(view) => return Ok(view),
                Step::Failed(e) => {
                    tracing::debug!(session_id = %session.id, error = %e, "Render cycle aborted");
                    return Err(e);
                }
            };
        }
    }

    async fn fetch(&self) -> DashboardResult<(BlockCounts, HourlySeries)> {
        let counts = fetch_block_counts(self.warehouse.as_ref(), &self.blocks_table).await?;
        let series = fetch_hourly_series(self.warehouse.as_ref(), &self.blocks_table).await?;
        Ok((counts, series))
    }
}

/// A phase together with what it carries into the next one
enum Step {
    Idle,
    Toggling,
    Querying,
    Rendering(BlockCounts, HourlySeries),
    MaybeSleeping(DashboardView),
    Failed(DashboardError),
}

impl Step {
    fn phase(&self) -> CyclePhase {
        match self {
            Step::Idle => CyclePhase::Idle,
            Step::Toggling => CyclePhase::Toggling,
            Step::Querying => CyclePhase::Querying,
            Step::Rendering(..) => CyclePhase::Rendering,
            Step::MaybeSleeping(_) => CyclePhase::MaybeSleeping,
            Step::Failed(_) => CyclePhase::Failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::view::{METRIC_BLOCKS_LAST_HOUR, METRIC_BLOCKS_TODAY};
    use crate::warehouse::testing::ScriptedWarehouse;

    fn renderer(wh: Arc<ScriptedWarehouse>) -> Renderer {
        Renderer::new(wh, "bigquery-public-data.crypto_ethereum.blocks", "Ethereum Blocks Real-Time (Demo)")
    }

    #[tokio::test]
    async fn test_cycle_renders_metrics() {
        let wh = Arc::new(ScriptedWarehouse::healthy(150, 12, vec![(1_699_084_800, 290)]));
        let mut session = Session::new();

        let view = renderer(Arc::clone(&wh)).run_cycle(&mut session, false).await.unwrap();

        assert_eq!(view.title, "Ethereum Blocks Real-Time (Demo)");
        assert_eq!(view.metric(METRIC_BLOCKS_TODAY), Some(150));
        assert_eq!(view.metric(METRIC_BLOCKS_LAST_HOUR), Some(12));
        assert_eq!(view.chart.data.len(), 1);
        assert!(!view.auto_refresh);
    }

    #[tokio::test]
    async fn test_cycle_queries_in_order() {
        let wh = Arc::new(ScriptedWarehouse::healthy(1, 1, vec![]));
        let mut session = Session::new();

        renderer(Arc::clone(&wh)).run_cycle(&mut session, false).await.unwrap();

        let seen = wh.seen();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].contains("blocks_last_hour"));
        assert!(seen[1].contains("TIMESTAMP_TRUNC"));
    }

    #[tokio::test]
    async fn test_toggle_applies_in_same_pass() {
        let wh = Arc::new(ScriptedWarehouse::healthy(1, 1, vec![]));
        let mut session = Session::new();

        let view = renderer(wh).run_cycle(&mut session, true).await.unwrap();

        assert!(session.auto_refresh());
        assert!(view.auto_refresh);
        assert_eq!(view.auto_refresh_line, "Auto Refresh is currently: **true**");
    }

    #[tokio::test]
    async fn test_empty_hourly_result_renders() {
        let wh = Arc::new(ScriptedWarehouse::healthy(0, 0, vec![]));
        let mut session = Session::new();

        let view = renderer(wh).run_cycle(&mut session, false).await.unwrap();
        assert!(view.chart.data.is_empty());
    }

    #[tokio::test]
    async fn test_auth_failure_aborts_cycle() {
        let wh = Arc::new(ScriptedWarehouse::unauthorized());
        let mut session = Session::new();

        let err = renderer(Arc::clone(&wh))
            .run_cycle(&mut session, false)
            .await
            .unwrap_err();

        assert!(matches!(err, DashboardError::RemoteQuery(ref e) if e.is_auth()));
        // The hourly query never runs once the counts query fails
        assert_eq!(wh.calls(), 1);
    }

    #[tokio::test]
    async fn test_shape_failure_keeps_toggle() {
        let wh = Arc::new(ScriptedWarehouse::new(|sql| {
            if sql.contains("blocks_last_hour") {
                Ok(crate::warehouse::testing::counts_result(4, 2))
            } else {
                Ok(crate::warehouse::ResultSet::default())
            }
        }));
        let mut session = Session::new();

        let err = renderer(Arc::clone(&wh))
            .run_cycle(&mut session, true)
            .await
            .unwrap_err();

        assert!(matches!(err, DashboardError::ResultShape(_)));
        assert_eq!(wh.calls(), 2);
        assert!(session.auto_refresh());
    }

    #[test]
    fn test_step_phases() {
        let failed = Step::Failed(DashboardError::ResultShape("x".to_string()));
        assert_eq!(failed.phase(), CyclePhase::Failed);
        assert_eq!(
            Step::Rendering(BlockCounts::default(), HourlySeries::default()).phase(),
            CyclePhase::Rendering
        );
    }

    #[test]
    fn test_phase_names() {
        assert_eq!(CyclePhase::MaybeSleeping.to_string(), "maybe_sleeping");
        assert_eq!(CyclePhase::Failed.to_string(), "failed");
    }
}
