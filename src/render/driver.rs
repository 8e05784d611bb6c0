//! Per-session render loop.
//!
//! Replaces "sleep, then rerun the whole script" with an explicit loop:
//! render, then wait for either the refresh timer (only while auto-refresh
//! is on) or the next session event. An event arriving during the wait
//! cancels the pending refresh, so switching auto-refresh off takes effect
//! immediately.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use super::{CyclePhase, DashboardView, Renderer};
use crate::config::MIN_REFRESH_INTERVAL;
use crate::session::Session;

/// Input to a running session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The viewer pressed the auto-refresh toggle
    ToggleAutoRefresh,
    /// Render again without changing state
    Rerun,
}

/// What a render cycle produced
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RenderOutput {
    View(DashboardView),
    Failed { kind: String, message: String },
}

/// Drives render cycles for one session until the session ends
pub struct SessionDriver {
    renderer: Arc<Renderer>,
    session: Session,
    refresh_interval: Duration,
}

impl SessionDriver {
    /// `refresh_interval` is raised to [`MIN_REFRESH_INTERVAL`] if shorter.
    pub fn new(renderer: Arc<Renderer>, session: Session, refresh_interval: Duration) -> Self {
        Self {
            renderer,
            session,
            refresh_interval: refresh_interval.max(MIN_REFRESH_INTERVAL),
        }
    }

    /// Run until the event channel closes or nobody listens to the output.
    ///
    /// A cycle runs immediately on start. A failed cycle is reported and
    /// never rescheduled by the timer; the session waits for its next event.
    /// Returns the session so callers can inspect its final state.
    pub async fn run(
        mut self,
        mut events: mpsc::UnboundedReceiver<SessionEvent>,
        output: mpsc::UnboundedSender<RenderOutput>,
    ) -> Session {
        let mut toggle = false;

        loop {
            let schedule_refresh = match self.renderer.run_cycle(&mut self.session, toggle).await {
                Ok(view) => {
                    let auto_refresh = view.auto_refresh;
                    if output.send(RenderOutput::View(view)).is_err() {
                        break;
                    }
                    auto_refresh
                }
                Err(e) => {
                    tracing::error!(
                        session_id = %self.session.id,
                        phase = %CyclePhase::Failed,
                        error = %e,
                        "Render cycle failed"
                    );
                    let failed = RenderOutput::Failed {
                        kind: e.kind().to_string(),
                        message: e.to_string(),
                    };
                    if output.send(failed).is_err() {
                        break;
                    }
                    false
                }
            };

            let next = if schedule_refresh {
                tracing::debug!(
                    session_id = %self.session.id,
                    interval_secs = self.refresh_interval.as_secs(),
                    "Auto refresh scheduled"
                );
                tokio::select! {
                    biased;
                    event = events.recv() => event,
                    _ = tokio::time::sleep(self.refresh_interval) => Some(SessionEvent::Rerun),
                }
            } else {
                events.recv().await
            };

            match next {
                Some(SessionEvent::ToggleAutoRefresh) => toggle = true,
                Some(SessionEvent::Rerun) => toggle = false,
                None => break,
            }
        }

        tracing::debug!(session_id = %self.session.id, "Session driver stopped");
        self.session
    }
}
