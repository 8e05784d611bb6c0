//! Dashboard Rendering
//!
//! Turns warehouse results into a [`DashboardView`] and keeps a session's
//! dashboard fresh.
//!
//! ## Architecture
//!
//! - **Renderer**: One render cycle (toggle, query, render) as a state machine
//! - **SessionDriver**: The per-session loop that reruns cycles on a
//!   cancellable timer while auto-refresh is on
//! - **DashboardView**: Everything a surface needs to draw the dashboard

mod cycle;
mod driver;
mod view;

pub use cycle::{CyclePhase, Renderer};
pub use driver::{RenderOutput, SessionDriver, SessionEvent};
pub use view::{ChartView, DashboardView, MetricView};
