//! Request parameter sets sent to the document store

use serde::Serialize;
use serde_json::{Map, Value};

use crate::options::{TargetArguments, WriteVisibility};

/// A predicate the host is willing to push down to the store
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Qualifier {
    pub field_name: String,
    pub value: Value,
}

impl Qualifier {
    pub fn new(field_name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field_name: field_name.into(),
            value: value.into(),
        }
    }

    /// The qualifier value as literal text
    ///
    /// Strings are taken as-is; any other value uses its JSON rendering.
    pub fn literal(&self) -> Option<String> {
        match &self.value {
            Value::Null => None,
            Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// How a query value is handed to the store
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryBody {
    /// Sent as the `q` parameter
    QueryString(String),
    /// Sent as the JSON request body
    Structured(Value),
}

/// Target plus optional query, used by count, search and point lookups
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryArguments {
    pub target: TargetArguments,
    pub query: Option<QueryBody>,
}

/// Sort, page size and cursor lifetime for a paginated search
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginationArguments {
    pub sort: Option<String>,
    pub size: usize,
    pub scroll: String,
}

/// Initial request of a paginated scan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRequest {
    pub query: QueryArguments,
    pub pagination: PaginationArguments,
}

/// Write of a single document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexRequest {
    pub target: TargetArguments,
    pub id: String,
    pub body: Map<String, Value>,
    pub refresh: WriteVisibility,
}

/// Removal of a single document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteRequest {
    pub target: TargetArguments,
    pub id: String,
    pub refresh: WriteVisibility,
}
