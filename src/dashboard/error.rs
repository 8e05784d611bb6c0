//! Dashboard error types
//!
//! Every failure of a render cycle is one of two classes: the warehouse
//! refused or failed the query, or it answered with an unexpected shape.

use thiserror::Error;

use crate::warehouse::WarehouseError;

/// Errors that abort a render cycle
#[derive(Error, Debug)]
pub enum DashboardError {
    /// Connection, credential or query-rejection failure
    #[error("Remote query error: {0}")]
    RemoteQuery(#[from] WarehouseError),

    /// Unexpected row count, missing column or unparseable cell
    #[error("Result shape error: {0}")]
    ResultShape(String),
}

impl DashboardError {
    /// Stable machine-readable class name
    pub fn kind(&self) -> &'static str {
        match self {
            DashboardError::RemoteQuery(_) => "remote_query",
            DashboardError::ResultShape(_) => "result_shape",
        }
    }
}

/// Result type for dashboard operations
pub type DashboardResult<T> = Result<T, DashboardError>;
