//! Warehouse Query Execution
//!
//! Submits SQL to an analytical warehouse and returns tabular results.
//!
//! ## Architecture
//!
//! - **Warehouse**: Trait implemented by every query backend
//! - **BigQueryClient**: REST client for Google BigQuery
//! - **TokenSource**: Where bearer credentials come from
//! - **ResultSet**: Column-named rows with string-encoded cells
//!
//! Nothing here retries or caches. A failed call surfaces as a
//! [`WarehouseError`] to the caller.

mod auth;
mod bigquery;
mod result;

#[cfg(test)]
pub(crate) mod testing;

pub use auth::TokenSource;
pub use bigquery::BigQueryClient;
pub use result::{Column, ResultSet};

use async_trait::async_trait;
use thiserror::Error;

/// A read-only SQL endpoint bound to one project
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Project the backend was bound to at construction
    fn project_id(&self) -> &str;

    /// Run a parameterless query and wait for its complete result set
    async fn query(&self, sql: &str) -> Result<ResultSet, WarehouseError>;
}

/// Errors raised while talking to the warehouse
#[derive(Error, Debug)]
pub enum WarehouseError {
    #[error("Warehouse unavailable")]
    Unavailable,

    #[error("Request timeout")]
    Timeout,

    #[error("Unauthorized ({status}): {message}")]
    Unauthorized { status: u16, message: String },

    #[error("Query rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Malformed warehouse response: {0}")]
    Decode(String),

    #[error("Credentials unavailable: {0}")]
    Credentials(String),
}

impl WarehouseError {
    /// Map a transport error onto the error taxonomy
    pub(crate) fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            WarehouseError::Timeout
        } else if e.is_connect() {
            WarehouseError::Unavailable
        } else {
            WarehouseError::Request(e)
        }
    }

    /// True for credential and authorization failures
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            WarehouseError::Unauthorized { .. } | WarehouseError::Credentials(_)
        )
    }
}
