//! Foreign table facade
//!
//! `ElasticTable` is what a host engine holds per foreign table: the resolved
//! configuration, the column mapping, a store client and the table counters.
//! Scans and writes borrow from it for the duration of one call.

use serde_json::Value;

use crate::columns::{ColumnDefinition, ColumnSchema, Row};
use crate::errors::{TableError, TableResult};
use crate::mutation::MutationEngine;
use crate::observability::{log_error, log_info, Event, MetricsSnapshot, TableMetrics};
use crate::options::{RawOptions, StoreApiVersion, TableConfig};
use crate::request::Qualifier;
use crate::scan::{PageState, RowStream, ScanEngine};
use crate::store::{DocumentStore, HttpStore};

/// One foreign table bound to an index
#[derive(Debug)]
pub struct ElasticTable<S: DocumentStore> {
    config: TableConfig,
    schema: ColumnSchema,
    store: S,
    metrics: TableMetrics,
}

impl ElasticTable<HttpStore> {
    /// Resolve `options` and connect to a server without mapping types
    pub fn connect(options: &RawOptions, columns: &[ColumnDefinition]) -> TableResult<Self> {
        Self::connect_for(options, StoreApiVersion::default(), columns)
    }

    /// Resolve `options` for `api_version` and connect to the configured server
    ///
    /// No request is sent until the first scan or write.
    pub fn connect_for(
        options: &RawOptions,
        api_version: StoreApiVersion,
        columns: &[ColumnDefinition],
    ) -> TableResult<Self> {
        let config = resolve(options, api_version)?;
        let store = HttpStore::connect(&config.connection).map_err(|error| {
            let error = TableError::invalid_configuration("host", error.to_string());
            log_error!(
                event = %Event::TableRejected,
                error = %error,
                "table rejected"
            );
            error
        })?;
        Ok(Self::with_config(config, columns, store))
    }
}

impl<S: DocumentStore> ElasticTable<S> {
    /// Resolve `options` against a server without mapping types
    pub fn open(options: &RawOptions, columns: &[ColumnDefinition], store: S) -> TableResult<Self> {
        Self::open_for(options, StoreApiVersion::default(), columns, store)
    }

    pub fn open_for(
        options: &RawOptions,
        api_version: StoreApiVersion,
        columns: &[ColumnDefinition],
        store: S,
    ) -> TableResult<Self> {
        let config = resolve(options, api_version)?;
        Ok(Self::with_config(config, columns, store))
    }

    /// Bind an already resolved configuration
    pub fn with_config(config: TableConfig, columns: &[ColumnDefinition], store: S) -> Self {
        let schema = ColumnSchema::build(&config, columns);
        log_info!(
            event = %Event::TableOpened,
            path = %config.target_path,
            columns = schema.columns().len(),
            page_size = config.page_size,
            refresh = %config.write_visibility,
            "table opened"
        );
        Self {
            config,
            schema,
            store,
            metrics: TableMetrics::new(),
        }
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn schema(&self) -> &ColumnSchema {
        &self.schema
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Column the host uses to address rows in update and delete
    pub fn rowid_column(&self) -> &str {
        self.schema.identity_column()
    }

    fn scan_engine(&self) -> ScanEngine<'_, S> {
        ScanEngine::new(&self.store, &self.config, &self.schema, &self.metrics)
    }

    fn mutation_engine(&self) -> MutationEngine<'_, S> {
        MutationEngine::new(&self.store, &self.config, &self.schema, &self.metrics)
    }

    pub fn relation_size(&self, qualifiers: &[Qualifier], columns: &[String]) -> (u64, usize) {
        self.scan_engine().relation_size(qualifiers, columns)
    }

    pub fn execute<'a>(
        &'a self,
        qualifiers: &[Qualifier],
        columns: Option<&[String]>,
        state: &'a mut PageState,
    ) -> RowStream<'a, S> {
        self.scan_engine().execute(qualifiers, columns, state)
    }

    pub fn end_scan(&self, state: &mut PageState) {
        self.scan_engine().end_scan(state)
    }

    pub fn insert(&self, row: Row) -> TableResult<Row> {
        self.mutation_engine().insert(row)
    }

    pub fn update(&self, identity: &Value, row: Row) -> TableResult<Row> {
        self.mutation_engine().update(identity, row)
    }

    pub fn delete(&self, identity: &Value) -> TableResult<Row> {
        self.mutation_engine().delete(identity)
    }
}

fn resolve(options: &RawOptions, api_version: StoreApiVersion) -> TableResult<TableConfig> {
    TableConfig::resolve_for(options, api_version).map_err(|error| {
        log_error!(
            event = %Event::TableRejected,
            error = %error,
            "table rejected"
        );
        error
    })
}
