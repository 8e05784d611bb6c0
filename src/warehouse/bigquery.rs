//! BigQuery REST API Client
//!
//! Runs standard-SQL queries through `jobs.query`, polls `getQueryResults`
//! until the job completes and follows page tokens until every row is read.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::{Duration, Instant};

use super::{Column, ResultSet, TokenSource, Warehouse, WarehouseError};
use crate::config::WarehouseConfig;

/// BigQuery client bound to a single project
pub struct BigQueryClient {
    http: Client,
    project_id: String,
    base_url: String,
    location: Option<String>,
    tokens: TokenSource,
    job_timeout_ms: u64,
    poll_interval: Duration,
}

impl BigQueryClient {
    /// Create a client whose credentials come from the config (static token)
    /// or the metadata server.
    pub fn new(config: &WarehouseConfig) -> Result<Self, WarehouseError> {
        let tokens = TokenSource::from_config(config.access_token.as_deref());
        Self::with_token_source(config, tokens)
    }

    pub fn with_token_source(
        config: &WarehouseConfig,
        tokens: TokenSource,
    ) -> Result<Self, WarehouseError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            project_id: config.project_id.clone(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            location: config.location.clone(),
            tokens,
            job_timeout_ms: config.job_timeout_ms,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        })
    }

    fn queries_url(&self) -> String {
        format!("{}/projects/{}/queries", self.base_url, self.project_id)
    }

    /// Fetch results of a submitted job, optionally a specific page
    async fn get_query_results(
        &self,
        token: &str,
        job: &JobReference,
        page_token: Option<&str>,
    ) -> Result<QueryResponse, WarehouseError> {
        let url = format!("{}/{}", self.queries_url(), job.job_id);

        let mut params = vec![("timeoutMs", self.job_timeout_ms.to_string())];
        if let Some(location) = job.location.as_ref().or(self.location.as_ref()) {
            params.push(("location", location.clone()));
        }
        if let Some(page_token) = page_token {
            params.push(("pageToken", page_token.to_string()));
        }

        self.send(self.http.get(&url).bearer_auth(token).query(&params))
            .await
    }

    /// Send a request and decode the JSON body, mapping HTTP failures
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, WarehouseError> {
        let response = request
            .send()
            .await
            .map_err(WarehouseError::from_transport)?;

        let status = response.status();
        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| WarehouseError::Decode(e.to_string()));
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&text)
            .map(|e| e.error.message)
            .unwrap_or(text);

        match status.as_u16() {
            401 | 403 => Err(WarehouseError::Unauthorized {
                status: status.as_u16(),
                message,
            }),
            code => Err(WarehouseError::Rejected {
                status: code,
                message,
            }),
        }
    }
}

#[async_trait]
impl Warehouse for BigQueryClient {
    fn project_id(&self) -> &str {
        &self.project_id
    }

    async fn query(&self, sql: &str) -> Result<ResultSet, WarehouseError> {
        let started = Instant::now();
        let token = self.tokens.token(&self.http).await?;

        let body = QueryRequest {
            query: sql,
            use_legacy_sql: false,
            timeout_ms: self.job_timeout_ms,
            location: self.location.as_deref(),
        };

        let mut page: QueryResponse = self
            .send(self.http.post(self.queries_url()).bearer_auth(&token).json(&body))
            .await?;

        // Wait for the job the same way a blocking `result()` call would
        while !page.job_complete {
            let job = page
                .job_reference
                .clone()
                .ok_or_else(|| WarehouseError::Decode("incomplete job without jobReference".into()))?;
            tracing::debug!(job_id = %job.job_id, "Query job still running");
            tokio::time::sleep(self.poll_interval).await;
            page = self.get_query_results(&token, &job, None).await?;
            if page.job_reference.is_none() {
                page.job_reference = Some(job);
            }
        }

        let columns: Vec<Column> = page
            .schema
            .take()
            .ok_or_else(|| WarehouseError::Decode("completed job without schema".into()))?
            .fields
            .into_iter()
            .map(|f| Column::new(f.name, f.kind))
            .collect();

        let mut rows = convert_rows(page.rows.take());
        let job = page.job_reference.take();
        let mut next_page = page.page_token.take();

        while let Some(page_token) = next_page {
            let job = job
                .as_ref()
                .ok_or_else(|| WarehouseError::Decode("paged result without jobReference".into()))?;
            let mut more = self.get_query_results(&token, job, Some(&page_token)).await?;
            rows.extend(convert_rows(more.rows.take()));
            next_page = more.page_token.take();
        }

        tracing::debug!(
            project = %self.project_id,
            rows = rows.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Query completed"
        );

        Ok(ResultSet::new(columns, rows))
    }
}

/// Flatten `{"f": [{"v": ...}]}` rows into string cells
fn convert_rows(rows: Option<Vec<Row>>) -> Vec<Vec<Option<String>>> {
    rows.unwrap_or_default()
        .into_iter()
        .map(|row| {
            row.f
                .into_iter()
                .map(|cell| match cell.v {
                    serde_json::Value::Null => None,
                    serde_json::Value::String(s) => Some(s),
                    other => Some(other.to_string()),
                })
                .collect()
        })
        .collect()
}

// ============================================
// Request/Response DTOs
// ============================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    query: &'a str,
    use_legacy_sql: bool,
    timeout_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    #[serde(default)]
    job_complete: bool,
    job_reference: Option<JobReference>,
    schema: Option<Schema>,
    rows: Option<Vec<Row>>,
    page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobReference {
    job_id: String,
    location: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Schema {
    #[serde(default)]
    fields: Vec<Field>,
}

#[derive(Debug, Deserialize)]
struct Field {
    name: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct Row {
    #[serde(default)]
    f: Vec<Cell>,
}

#[derive(Debug, Deserialize)]
struct Cell {
    #[serde(default)]
    v: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}
