//! Resolved table configuration types
//!
//! A `TableConfig` is built once per table handle and never mutated.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Default value for `rowid_column`
pub const DEFAULT_IDENTITY_COLUMN: &str = "id";
/// Default value for `scroll_size`
pub const DEFAULT_PAGE_SIZE: usize = 1000;
/// Default value for `scroll_duration`
pub const DEFAULT_PAGE_LIFETIME: &str = "10m";
/// Default value for `host`
pub const DEFAULT_HOST: &str = "localhost";
/// Default value for `port`
pub const DEFAULT_PORT: u16 = 9200;
/// Default value for `timeout`, in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Request shape spoken by the store
///
/// Stores before major version 7 address documents by index and mapping type;
/// later versions drop the type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreApiVersion {
    /// `/{index}/{type}`
    Typed,
    /// `/{index}`
    #[default]
    Typeless,
}

/// How soon a write becomes visible to subsequent searches
///
/// Maps onto the store's `refresh` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteVisibility {
    /// `refresh=true`: visible before the write is acknowledged
    Immediate,
    /// `refresh=false`: visible after the next periodic refresh
    #[default]
    Deferred,
    /// `refresh=wait_for`: acknowledged once a refresh has made it visible
    WaitFor,
}

impl WriteVisibility {
    /// Parse the `refresh` option value (case-insensitive)
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "true" => Some(WriteVisibility::Immediate),
            "false" => Some(WriteVisibility::Deferred),
            "wait_for" => Some(WriteVisibility::WaitFor),
            _ => None,
        }
    }

    /// The value sent as the store's `refresh` parameter
    pub fn as_param(&self) -> &'static str {
        match self {
            WriteVisibility::Immediate => "true",
            WriteVisibility::Deferred => "false",
            WriteVisibility::WaitFor => "wait_for",
        }
    }
}

impl fmt::Display for WriteVisibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_param())
    }
}

/// Index (and, for typed stores, mapping type) sent with every request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetArguments {
    pub index: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,
}

impl TargetArguments {
    pub fn new(index: impl Into<String>, doc_type: Option<String>) -> Self {
        Self {
            index: index.into(),
            doc_type,
        }
    }

    /// Path prefix used for search and count requests
    pub fn path(&self) -> String {
        match &self.doc_type {
            Some(doc_type) => format!("/{}/{}", self.index, doc_type),
            None => format!("/{}", self.index),
        }
    }
}

/// Basic authentication pair
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Settings handed to the store client
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionSettings {
    pub host: String,
    pub port: u16,
    pub scheme: Option<String>,
    pub timeout_secs: u64,
    pub credentials: Option<Credentials>,
    /// Options the table does not recognize, passed through to the client
    pub extras: BTreeMap<String, String>,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            scheme: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            credentials: None,
            extras: BTreeMap::new(),
        }
    }
}

impl ConnectionSettings {
    /// Base URL of the store, `http` unless a scheme was configured
    pub fn base_url(&self) -> String {
        format!(
            "{}://{}:{}",
            self.scheme.as_deref().unwrap_or("http"),
            self.host,
            self.port
        )
    }
}

/// Fully resolved per-table configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableConfig {
    /// Human-readable target used in log lines
    pub target_path: String,
    pub request_arguments: TargetArguments,
    pub api_version: StoreApiVersion,
    pub identity_column: String,
    pub score_column: Option<String>,
    pub query_column: Option<String>,
    /// Treat the query column value as a JSON request body instead of a query string
    pub is_structured_query: bool,
    pub sort_column: Option<String>,
    pub default_sort: Option<String>,
    pub page_size: usize,
    pub page_lifetime: String,
    pub write_visibility: WriteVisibility,
    pub return_full_row_on_write: bool,
    pub connection: ConnectionSettings,
}

impl TableConfig {
    /// Configuration for `index` with every other option at its default
    pub fn for_index(index: impl Into<String>) -> Self {
        let request_arguments = TargetArguments::new(index, None);
        Self {
            target_path: request_arguments.path(),
            request_arguments,
            api_version: StoreApiVersion::Typeless,
            identity_column: DEFAULT_IDENTITY_COLUMN.to_string(),
            score_column: None,
            query_column: None,
            is_structured_query: false,
            sort_column: None,
            default_sort: None,
            page_size: DEFAULT_PAGE_SIZE,
            page_lifetime: DEFAULT_PAGE_LIFETIME.to_string(),
            write_visibility: WriteVisibility::Deferred,
            return_full_row_on_write: false,
            connection: ConnectionSettings::default(),
        }
    }
}
