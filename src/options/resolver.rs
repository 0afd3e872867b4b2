//! Option resolution
//!
//! Turns the raw string map attached to a foreign table into a `TableConfig`.
//! Resolution reads the map without consuming it; keys the table does not
//! recognize become connection extras.

use std::collections::BTreeMap;
use std::str::FromStr;

use crate::errors::{TableError, TableResult};

use super::config::{
    ConnectionSettings, Credentials, StoreApiVersion, TableConfig, TargetArguments,
    WriteVisibility, DEFAULT_HOST, DEFAULT_IDENTITY_COLUMN, DEFAULT_PAGE_LIFETIME,
    DEFAULT_PAGE_SIZE, DEFAULT_PORT, DEFAULT_TIMEOUT_SECS,
};

/// Raw option map as handed over by the host engine
pub type RawOptions = BTreeMap<String, String>;

/// Keys consumed by the table itself
pub const KNOWN_KEYS: &[&str] = &[
    "host",
    "port",
    "scheme",
    "timeout",
    "username",
    "password",
    "index",
    "type",
    "rowid_column",
    "score_column",
    "query_column",
    "query_dsl",
    "sort_column",
    "default_sort",
    "scroll_size",
    "scroll_duration",
    "refresh",
    "complete_returning",
];

impl TableConfig {
    /// Resolve options for a typeless (7+) store
    pub fn resolve(raw: &RawOptions) -> TableResult<Self> {
        Self::resolve_for(raw, StoreApiVersion::Typeless)
    }

    /// Resolve options for a store speaking `api_version`
    pub fn resolve_for(raw: &RawOptions, api_version: StoreApiVersion) -> TableResult<Self> {
        let options = Options(raw);

        let index = options.required("index")?;
        let request_arguments = match api_version {
            StoreApiVersion::Typed => TargetArguments::new(index, Some(options.required("type")?)),
            StoreApiVersion::Typeless => TargetArguments::new(index, None),
        };

        let page_size = options.integer("scroll_size", DEFAULT_PAGE_SIZE)?;
        if page_size == 0 {
            return Err(TableError::invalid_configuration(
                "scroll_size",
                "must be a positive integer",
            ));
        }

        let write_visibility = match raw.get("refresh") {
            None => WriteVisibility::Deferred,
            Some(value) => WriteVisibility::parse(value).ok_or_else(|| {
                TableError::invalid_configuration(
                    "refresh",
                    format!("must be one of true, false, or wait_for (got '{}')", value),
                )
            })?,
        };

        let config = TableConfig {
            target_path: request_arguments.path(),
            request_arguments,
            api_version,
            identity_column: options
                .column("rowid_column")
                .unwrap_or_else(|| DEFAULT_IDENTITY_COLUMN.to_string()),
            score_column: options.column("score_column"),
            query_column: options.column("query_column"),
            is_structured_query: options.boolean("query_dsl", false),
            sort_column: options.column("sort_column"),
            default_sort: options.column("default_sort"),
            page_size,
            page_lifetime: options
                .string("scroll_duration")
                .unwrap_or_else(|| DEFAULT_PAGE_LIFETIME.to_string()),
            write_visibility,
            return_full_row_on_write: options.boolean("complete_returning", false),
            connection: ConnectionSettings {
                host: options.string("host").unwrap_or_else(|| DEFAULT_HOST.to_string()),
                port: options.integer("port", DEFAULT_PORT)?,
                scheme: options.column("scheme"),
                timeout_secs: options.integer("timeout", DEFAULT_TIMEOUT_SECS)?,
                credentials: credentials(raw)?,
                extras: raw
                    .iter()
                    .filter(|(key, _)| !KNOWN_KEYS.contains(&key.as_str()))
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect(),
            },
        };

        validate_reserved_columns(&config)?;
        Ok(config)
    }
}

struct Options<'a>(&'a RawOptions);

impl Options<'_> {
    fn string(&self, key: &str) -> Option<String> {
        self.0.get(key).cloned()
    }

    fn required(&self, key: &str) -> TableResult<String> {
        self.column(key)
            .ok_or_else(|| TableError::invalid_configuration(key, "is required"))
    }

    /// Optional name-like option; empty strings count as unset
    fn column(&self, key: &str) -> Option<String> {
        self.0.get(key).filter(|value| !value.is_empty()).cloned()
    }

    fn boolean(&self, key: &str, default: bool) -> bool {
        match self.0.get(key) {
            Some(value) => value.eq_ignore_ascii_case("true"),
            None => default,
        }
    }

    fn integer<T: FromStr>(&self, key: &str, default: T) -> TableResult<T> {
        match self.0.get(key) {
            None => Ok(default),
            Some(value) => value.trim().parse().map_err(|_| {
                TableError::invalid_configuration(key, format!("'{}' is not a valid integer", value))
            }),
        }
    }
}

fn credentials(raw: &RawOptions) -> TableResult<Option<Credentials>> {
    match (raw.get("username"), raw.get("password")) {
        (Some(username), Some(password)) => Ok(Some(Credentials {
            username: username.clone(),
            password: password.clone(),
        })),
        (None, None) => Ok(None),
        (Some(_), None) => Err(TableError::invalid_configuration(
            "password",
            "must provide both username and password",
        )),
        (None, Some(_)) => Err(TableError::invalid_configuration(
            "username",
            "must provide both username and password",
        )),
    }
}

fn validate_reserved_columns(config: &TableConfig) -> TableResult<()> {
    let reserved = [
        ("rowid_column", Some(config.identity_column.as_str())),
        ("score_column", config.score_column.as_deref()),
        ("query_column", config.query_column.as_deref()),
        ("sort_column", config.sort_column.as_deref()),
    ];

    for (i, (key, name)) in reserved.iter().enumerate() {
        let Some(name) = name else { continue };
        for (other_key, other) in &reserved[..i] {
            if *other == Some(*name) {
                return Err(TableError::invalid_configuration(
                    *key,
                    format!("column '{}' is already used as {}", name, other_key),
                ));
            }
        }
    }
    Ok(())
}
