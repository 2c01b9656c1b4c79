//! The [`QueryService`] trait and the values that cross it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use stmo_core::{QueryId, QueryRecord};

use crate::error::ServiceError;

/// Operations the synchronization engine needs from the remote service.
///
/// Implementations make exactly one attempt per call.
pub trait QueryService {
    /// Fetch a query's metadata and SQL text.
    fn fetch_query(&self, id: &QueryId) -> Result<RemoteQuery, ServiceError>;

    /// Overwrite a query's SQL and metadata on the service.
    fn update_query(&self, id: &QueryId, update: &QueryUpdate<'_>) -> Result<(), ServiceError>;

    /// Ask the service to duplicate `id`; returns the new query.
    fn fork_query(&self, id: &QueryId) -> Result<RemoteQuery, ServiceError>;

    /// Fetch the cached result set for `sql` without re-running it.
    fn fetch_results(
        &self,
        sql: &str,
        data_source_id: Option<u64>,
    ) -> Result<ResultSet, ServiceError>;

    /// Browser URL of a query.
    fn query_url(&self, id: &QueryId) -> String;
}

/// A query as the service returns it: metadata plus SQL text.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteQuery {
    pub record: QueryRecord,
    pub sql: String,
}

impl RemoteQuery {
    /// Decode a service query object. The SQL lives under `query` and must
    /// be a string; every other key we care about is picked up by
    /// [`QueryRecord::from_json`].
    pub fn from_json(value: Value) -> Result<Self, ServiceError> {
        let sql = value
            .get("query")
            .and_then(Value::as_str)
            .ok_or_else(|| ServiceError::Decode("response has no query text".into()))?
            .to_owned();
        let record =
            QueryRecord::from_json(value).map_err(|e| ServiceError::Decode(e.to_string()))?;
        Ok(Self { record, sql })
    }
}

/// Body of an update request.
#[derive(Debug, Clone, Serialize)]
pub struct QueryUpdate<'a> {
    pub name: &'a str,
    #[serde(rename = "query")]
    pub sql: &'a str,
    pub data_source_id: Option<u64>,
    pub description: Option<&'a str>,
    pub options: &'a Value,
}

impl<'a> QueryUpdate<'a> {
    /// Push `sql` while keeping everything else as recorded.
    pub fn from_record(record: &'a QueryRecord, sql: &'a str) -> Self {
        Self {
            name: &record.name,
            sql,
            data_source_id: record.data_source_id,
            description: record.description.as_deref(),
            options: &record.options,
        }
    }
}

/// Cached rows of a query, in service order.
///
/// `columns` fixes the column order for tabular export; each row maps column
/// name to value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ResultSet {
    #[serde(default, deserialize_with = "column_names")]
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Map<String, Value>>,
}

impl ResultSet {
    /// Rows rendered as text cells in `columns` order. Missing values and
    /// nulls become empty cells; strings are written without quotes.
    pub fn text_rows(&self) -> impl Iterator<Item = Vec<String>> + '_ {
        self.rows.iter().map(move |row| {
            self.columns
                .iter()
                .map(|column| match row.get(column) {
                    None | Some(Value::Null) => String::new(),
                    Some(Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                })
                .collect()
        })
    }
}

fn column_names<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Column {
        name: String,
    }

    let columns = Vec::<Column>::deserialize(deserializer)?;
    Ok(columns.into_iter().map(|c| c.name).collect())
}
