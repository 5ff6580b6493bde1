//! Canonical, backend-independent result and error values.
//!
//! Both engines are normalised into these shapes before anything leaves the
//! dispatcher. The inbound adapter only ever sees [`CanonicalResult`] and
//! [`CanonicalError`], never a native driver value.

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use utoipa::ToSchema;

use super::names::{DatabaseName, ProcedureName, ProjectName};

/// Backend engine able to serve a procedure call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Engine {
    /// Relational engine invoked through stored procedures.
    #[serde(rename = "sql")]
    Sql,
    /// Remote function-call engine (Supabase RPC).
    #[serde(rename = "supabase", alias = "remote")]
    Remote,
}

impl Engine {
    /// The engine a failed call falls back to.
    pub const fn other(self) -> Self {
        match self {
            Self::Sql => Self::Remote,
            Self::Remote => Self::Sql,
        }
    }

    /// Stable lowercase label used in logs and response metadata.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sql => "sql",
            Self::Remote => "supabase",
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Broad classification of a failure, surfaced as `error.type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    System,
    Data,
    Security,
    Auth,
}

/// Sanitised, retry-annotated error produced by the error mapper.
///
/// `user_message` is always safe to show to callers. `debug` carries raw
/// backend detail and is only populated in development mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalError {
    pub code: String,
    pub engine: Engine,
    pub retryable: bool,
    pub category: ErrorCategory,
    pub user_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<String>,
}

/// A single named record-set, e.g. `table1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSet {
    name: String,
    rows: Vec<Value>,
}

impl RecordSet {
    /// Build a record-set from its name and rows.
    pub fn new(name: impl Into<String>, rows: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rows(&self) -> &[Value] {
        &self.rows
    }
}

/// Ordered list of named record-sets.
///
/// Serialises as a JSON object whose keys follow the record-set order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    sets: Vec<RecordSet>,
}

impl Dataset {
    /// Name positional record-sets `table1`, `table2`, … in their original order.
    ///
    /// # Examples
    /// ```
    /// use hybrid_engine::domain::Dataset;
    /// use serde_json::json;
    ///
    /// let dataset = Dataset::from_positional(vec![vec![json!({"id": 1})], vec![]]);
    /// let names: Vec<_> = dataset.iter().map(|set| set.name()).collect();
    /// assert_eq!(names, ["table1", "table2"]);
    /// ```
    pub fn from_positional(sets: Vec<Vec<Value>>) -> Self {
        Self {
            sets: sets
                .into_iter()
                .enumerate()
                .map(|(index, rows)| RecordSet::new(format!("table{}", index + 1), rows))
                .collect(),
        }
    }

    /// Keep caller-supplied names and order.
    pub fn from_named(sets: Vec<(String, Vec<Value>)>) -> Self {
        Self {
            sets: sets
                .into_iter()
                .map(|(name, rows)| RecordSet::new(name, rows))
                .collect(),
        }
    }

    /// Look up a record-set by name.
    pub fn get(&self, name: &str) -> Option<&RecordSet> {
        self.sets.iter().find(|set| set.name == name)
    }

    /// First record-set, if any.
    pub fn first(&self) -> Option<&RecordSet> {
        self.sets.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecordSet> {
        self.sets.iter()
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

impl Serialize for Dataset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.sets.len()))?;
        for set in &self.sets {
            map.serialize_entry(&set.name, &set.rows)?;
        }
        map.end()
    }
}

/// Metadata describing how a call was served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultMeta {
    pub project: ProjectName,
    pub backend: Engine,
    pub procedure: ProcedureName,
    pub database: Option<DatabaseName>,
    pub duration_ms: u64,
}

/// Backend-independent outcome of a successful procedure call.
///
/// "Successful" means the backend returned a result; the procedure may still
/// report a 4xx/5xx status through its own status record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalResult {
    pub status_code: u16,
    pub success: bool,
    pub message: String,
    pub dataset: Dataset,
    pub meta: ResultMeta,
}

impl CanonicalResult {
    /// Status codes below 400 count as success.
    pub const fn is_success_status(status_code: u16) -> bool {
        status_code < 400
    }
}
