//! HTTP implementation of [`QueryService`] against the Redash API.
//!
//! | operation       | request                                  |
//! |-----------------|------------------------------------------|
//! | fetch           | `GET  /api/queries/{id}`                 |
//! | update          | `POST /api/queries/{id}`                 |
//! | fork            | `POST /api/queries/{id}/fork`            |
//! | cached results  | `POST /api/query_results` (`max_age=-1`) |
//!
//! The API key travels as the `api_key` query parameter on every request.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};

use stmo_core::QueryId;

use crate::error::ServiceError;
use crate::service::{QueryService, QueryUpdate, RemoteQuery, ResultSet};

/// The Redash instance queries are tracked against unless configured otherwise.
pub const DEFAULT_BASE_URL: &str = "https://sql.telemetry.mozilla.org";

/// Per-request timeout for the whole exchange.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Blocking Redash API client.
pub struct RedashClient {
    agent: ureq::Agent,
    base_url: String,
    api_key: String,
}

impl RedashClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_timeout(base_url, api_key, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    fn get(&self, path: &str) -> ureq::Request {
        self.agent
            .get(&self.api_url(path))
            .query("api_key", &self.api_key)
    }

    fn post(&self, path: &str) -> ureq::Request {
        self.agent
            .post(&self.api_url(path))
            .query("api_key", &self.api_key)
    }
}

impl QueryService for RedashClient {
    fn fetch_query(&self, id: &QueryId) -> Result<RemoteQuery, ServiceError> {
        tracing::debug!(%id, "fetching query");
        let response = self.get(&query_path(id, "")?).call()?;
        RemoteQuery::from_json(read_json(response)?)
    }

    fn update_query(&self, id: &QueryId, update: &QueryUpdate<'_>) -> Result<(), ServiceError> {
        tracing::debug!(%id, "updating query");
        self.post(&query_path(id, "")?).send_json(update)?;
        Ok(())
    }

    fn fork_query(&self, id: &QueryId) -> Result<RemoteQuery, ServiceError> {
        tracing::debug!(%id, "forking query");
        let response = self.post(&query_path(id, "/fork")?).call()?;
        RemoteQuery::from_json(read_json(response)?)
    }

    fn fetch_results(
        &self,
        sql: &str,
        data_source_id: Option<u64>,
    ) -> Result<ResultSet, ServiceError> {
        tracing::debug!(?data_source_id, "fetching cached results");
        // max_age -1: any cached result is accepted. On a cache miss the service
        // enqueues a run and answers with a `job` instead.
        let body = json!({
            "query": sql,
            "data_source_id": data_source_id,
            "max_age": -1,
        });
        let response = self.post("query_results").send_json(body)?;
        let payload: QueryResultsResponse = serde_json::from_value(read_json(response)?)
            .map_err(|e| ServiceError::Decode(e.to_string()))?;
        payload
            .query_result
            .map(|result| result.data)
            .ok_or(ServiceError::NoCachedResults)
    }

    fn query_url(&self, id: &QueryId) -> String {
        format!("{}/queries/{}", self.base_url, id)
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// `query_result` is absent when the service answered with a `job` instead.
#[derive(Debug, Deserialize)]
struct QueryResultsResponse {
    query_result: Option<QueryResultBody>,
}

#[derive(Debug, Deserialize)]
struct QueryResultBody {
    data: ResultSet,
}

/// `queries/{id}{suffix}`; ids go into the URL path unescaped, so only
/// numeric ones are let through.
fn query_path(id: &QueryId, suffix: &str) -> Result<String, ServiceError> {
    if !id.is_numeric() {
        return Err(ServiceError::InvalidId(id.to_string()));
    }
    Ok(format!("queries/{id}{suffix}"))
}

fn read_json(response: ureq::Response) -> Result<Value, ServiceError> {
    response
        .into_json()
        .map_err(|e| ServiceError::Decode(e.to_string()))
}
