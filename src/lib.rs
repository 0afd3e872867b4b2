//! elastic-fdw - an Elasticsearch index exposed as a relational table
//!
//! The host engine declares a foreign table with string options and typed
//! columns. This crate turns those into a validated `TableConfig`, maps rows
//! to documents and back, and drives paginated scans and single-document
//! writes against a `DocumentStore`.

pub mod cli;
pub mod columns;
pub mod errors;
pub mod mutation;
pub mod observability;
pub mod options;
pub mod request;
pub mod scan;
pub mod store;
pub mod table;

pub use columns::{ColumnDefinition, ColumnSchema, ColumnSpec, Row};
pub use errors::{Severity, TableError, TableResult};
pub use options::{RawOptions, StoreApiVersion, TableConfig, WriteVisibility};
pub use request::Qualifier;
pub use scan::{PageState, RowStream};
pub use store::{DocumentStore, HttpStore, MemoryStore};
pub use table::ElasticTable;
