//! Domain types for the stmo registry.
//!
//! A [`QueryRecord`] carries the synchronizable metadata of one remote query.
//! The SQL text is not part of it; it lives only in the tracked file.
//!
//! Decoding is tolerant. Unknown keys are dropped, absent keys fall back to an
//! explicit empty value, and the only hard requirement is a non-empty id.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::RecordError;

// ---------------------------------------------------------------------------
// QueryId
// ---------------------------------------------------------------------------

/// Identifier of a query on the remote service. Never empty.
///
/// The service speaks numbers, older registries stored strings; both decode
/// into the same value and it is always written back as a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct QueryId(String);

impl QueryId {
    pub fn new(id: impl Into<String>) -> Result<Self, RecordError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(RecordError::EmptyId);
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the all-digit ids the service hands out.
    pub fn is_numeric(&self) -> bool {
        self.0.bytes().all(|b| b.is_ascii_digit())
    }
}

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for QueryId {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl From<u64> for QueryId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Number(u64),
    Text(String),
}

impl TryFrom<IdRepr> for QueryId {
    type Error = RecordError;

    fn try_from(repr: IdRepr) -> Result<Self, Self::Error> {
        match repr {
            IdRepr::Number(n) => Ok(QueryId::from(n)),
            IdRepr::Text(s) => QueryId::new(s),
        }
    }
}

impl<'de> Deserialize<'de> for QueryId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = IdRepr::deserialize(deserializer)?;
        QueryId::try_from(repr).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// QueryRecord
// ---------------------------------------------------------------------------

/// Metadata of one remote query as persisted in the registry.
///
/// `schedule` and `options` are opaque to us and round-trip untouched;
/// `Value::Null` is the "unset" sentinel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawQueryRecord")]
pub struct QueryRecord {
    pub id: QueryId,
    pub data_source_id: Option<u64>,
    pub name: String,
    pub description: Option<String>,
    pub schedule: Value,
    pub options: Value,
}

impl QueryRecord {
    /// A record with only an id and a display name; everything else unset.
    pub fn new(id: QueryId, name: impl Into<String>) -> Self {
        Self {
            id,
            data_source_id: None,
            name: name.into(),
            description: None,
            schedule: Value::Null,
            options: Value::Null,
        }
    }

    /// Decode a record from any JSON object, e.g. a service response that
    /// carries many more keys than we keep.
    pub fn from_json(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawQueryRecord {
    #[serde(alias = "query_id")]
    id: Option<IdRepr>,
    data_source_id: Option<u64>,
    name: Option<String>,
    description: Option<String>,
    schedule: Value,
    options: Value,
}

impl TryFrom<RawQueryRecord> for QueryRecord {
    type Error = RecordError;

    fn try_from(raw: RawQueryRecord) -> Result<Self, Self::Error> {
        let id = raw.id.ok_or(RecordError::MissingId)?.try_into()?;
        Ok(Self {
            id,
            data_source_id: raw.data_source_id,
            name: raw.name.unwrap_or_default(),
            description: raw.description,
            schedule: raw.schedule,
            options: raw.options,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
