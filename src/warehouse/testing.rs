//! In-memory warehouse double for unit tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{Column, ResultSet, Warehouse, WarehouseError};

type Responder = Box<dyn Fn(&str) -> Result<ResultSet, WarehouseError> + Send + Sync>;

/// Answers every query through a closure and records the SQL it saw
pub(crate) struct ScriptedWarehouse {
    responder: Responder,
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl ScriptedWarehouse {
    pub(crate) fn new(
        responder: impl Fn(&str) -> Result<ResultSet, WarehouseError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Healthy warehouse: fixed counts and the given hourly rows
    pub(crate) fn healthy(today: u64, last_hour: u64, hours: Vec<(i64, u64)>) -> Self {
        Self::new(move |sql| {
            if sql.contains("blocks_last_hour") {
                Ok(counts_result(today, last_hour))
            } else {
                Ok(hourly_result(&hours))
            }
        })
    }

    /// Every query fails with an authentication error
    pub(crate) fn unauthorized() -> Self {
        Self::new(|_| {
            Err(WarehouseError::Unauthorized {
                status: 401,
                message: "Request had invalid authentication credentials.".to_string(),
            })
        })
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Warehouse for ScriptedWarehouse {
    fn project_id(&self) -> &str {
        "test-project"
    }

    async fn query(&self, sql: &str) -> Result<ResultSet, WarehouseError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(sql.to_string());
        (self.responder)(sql)
    }
}

pub(crate) fn counts_result(today: u64, last_hour: u64) -> ResultSet {
    ResultSet::new(
        vec![
            Column::new("blocks_today", "INTEGER"),
            Column::new("blocks_last_hour", "INTEGER"),
        ],
        vec![vec![Some(today.to_string()), Some(last_hour.to_string())]],
    )
}

/// Hour cells use BigQuery's epoch-seconds encoding
pub(crate) fn hourly_result(hours: &[(i64, u64)]) -> ResultSet {
    ResultSet::new(
        vec![
            Column::new("hour", "TIMESTAMP"),
            Column::new("blocks_count", "INTEGER"),
        ],
        hours
            .iter()
            .map(|(secs, count)| vec![Some(format!("{:E}", *secs as f64)), Some(count.to_string())])
            .collect(),
    )
}
