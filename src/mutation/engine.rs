//! Single-document writes
//!
//! Inserts and updates index one document; deletes remove one. With
//! `complete_returning` set, the written (or about to be deleted) document is
//! read back so the host can return the full row.

use serde_json::{Map, Value};

use crate::columns::{identity_text, ColumnSchema, Row};
use crate::errors::{TableError, TableResult};
use crate::observability::{log_debug, log_error, log_warn, Event, TableMetrics};
use crate::options::TableConfig;
use crate::request::RequestBuilder;
use crate::store::DocumentStore;

/// Executes insert, update and delete for one table
pub struct MutationEngine<'a, S: DocumentStore> {
    store: &'a S,
    config: &'a TableConfig,
    schema: &'a ColumnSchema,
    metrics: &'a TableMetrics,
}

impl<'a, S: DocumentStore> MutationEngine<'a, S> {
    pub fn new(
        store: &'a S,
        config: &'a TableConfig,
        schema: &'a ColumnSchema,
        metrics: &'a TableMetrics,
    ) -> Self {
        Self {
            store,
            config,
            schema,
            metrics,
        }
    }

    fn builder(&self) -> RequestBuilder<'a> {
        RequestBuilder::new(self.config)
    }

    /// Index a new document
    ///
    /// The row must carry the identity column; an identity is never invented.
    pub fn insert(&self, row: Row) -> TableResult<Row> {
        let (identity, body) = match self.schema.serialize(row) {
            Ok(parts) => parts,
            Err(error) => {
                log_error!(
                    event = %Event::MissingIdentity,
                    path = %self.config.target_path,
                    error = %error,
                    "insert rejected"
                );
                return Err(error);
            }
        };
        self.write(&identity, body)
    }

    /// Replace the document addressed by `identity`
    ///
    /// Any identity in the payload is ignored.
    pub fn update(&self, identity: &Value, row: Row) -> TableResult<Row> {
        let identity = self.require_identity(identity, "update rejected")?;
        let body = self.schema.serialize_fields(row);
        self.write(&identity, body)
    }

    /// Remove the document addressed by `identity`
    ///
    /// The returned row is materialized before the delete is issued. If the
    /// delete then fails, the error is returned and the row is discarded.
    pub fn delete(&self, identity: &Value) -> TableResult<Row> {
        let identity = self.require_identity(identity, "delete rejected")?;
        let row = self.returning(&identity);

        let request = self.builder().delete_arguments(&identity);
        match self.store.delete(&request) {
            Ok(()) => {
                self.metrics.increment_documents_deleted();
                log_debug!(
                    event = %Event::DocumentDeleted,
                    path = %self.config.target_path,
                    id = %identity,
                    "document deleted"
                );
                Ok(row)
            }
            Err(source) => {
                let error = TableError::store_request_failed(
                    "DELETE",
                    format!("{}/{}", self.config.target_path, identity),
                    source,
                );
                self.metrics.increment_store_failures();
                log_error!(
                    event = %Event::DeleteFailed,
                    path = %self.config.target_path,
                    id = %identity,
                    error = %error,
                    "delete failed"
                );
                Err(error)
            }
        }
    }

    fn require_identity(&self, identity: &Value, message: &'static str) -> TableResult<String> {
        identity_text(identity).ok_or_else(|| {
            let error = TableError::missing_identity(self.schema.identity_column());
            log_error!(
                event = %Event::MissingIdentity,
                path = %self.config.target_path,
                error = %error,
                "{}",
                message
            );
            error
        })
    }

    fn write(&self, identity: &str, body: Map<String, Value>) -> TableResult<Row> {
        let request = self.builder().index_arguments(identity, body);
        match self.store.index(&request) {
            Ok(stored) => {
                self.metrics.increment_documents_indexed();
                log_debug!(
                    event = %Event::DocumentIndexed,
                    path = %self.config.target_path,
                    id = %stored,
                    refresh = %self.config.write_visibility,
                    "document indexed"
                );
                Ok(self.returning(&stored))
            }
            Err(source) => {
                let error = TableError::store_request_failed(
                    "INDEX",
                    format!("{}/{}", self.config.target_path, identity),
                    source,
                );
                self.metrics.increment_store_failures();
                log_error!(
                    event = %Event::IndexFailed,
                    path = %self.config.target_path,
                    id = %identity,
                    document = ?request.body,
                    error = %error,
                    "index failed"
                );
                Err(error)
            }
        }
    }

    /// Row handed back to the host after a write
    fn returning(&self, identity: &str) -> Row {
        if self.config.return_full_row_on_write {
            self.read_back(identity)
        } else {
            self.schema.identity_row(identity)
        }
    }

    /// Point lookup of a just-written document
    ///
    /// Never fails: a miss or a failed lookup degrades to the identity-only row.
    pub fn read_back(&self, identity: &str) -> Row {
        let arguments = self.builder().id_lookup_arguments(identity);
        match self.store.lookup(&arguments) {
            Ok(hits) => match hits.first() {
                Some(document) => self.schema.deserialize(document, None, None, None),
                None => {
                    self.metrics.increment_read_back_misses();
                    log_warn!(
                        event = %Event::ReadBackEmpty,
                        path = %self.config.target_path,
                        id = %identity,
                        "read-back returned nothing"
                    );
                    self.schema.identity_row(identity)
                }
            },
            Err(source) => {
                let error = TableError::store_request_failed("SEARCH", &self.config.target_path, source);
                self.metrics.increment_store_failures();
                log_error!(
                    event = %Event::ReadBackFailed,
                    path = %self.config.target_path,
                    id = %identity,
                    error = %error,
                    "read-back failed"
                );
                self.schema.identity_row(identity)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::ColumnDefinition;
    use crate::options::WriteVisibility;
    use crate::store::{MemoryStore, StoreOperation};
    use serde_json::json;

    struct Fixture {
        store: MemoryStore,
        config: TableConfig,
        schema: ColumnSchema,
        metrics: TableMetrics,
    }

    impl Fixture {
        fn new(returning: bool, visibility: WriteVisibility) -> Self {
            let mut config = TableConfig::for_index("articles");
            config.return_full_row_on_write = returning;
            config.write_visibility = visibility;
            let schema = ColumnSchema::build(
                &config,
                &[
                    ColumnDefinition::new("id", "text"),
                    ColumnDefinition::new("title", "text"),
                    ColumnDefinition::new("tags", "json"),
                ],
            );
            let store = MemoryStore::new();
            store.put(&config.request_arguments, "1", json!({"title": "one", "tags": ["x"]}));
            Self {
                store,
                config,
                schema,
                metrics: TableMetrics::new(),
            }
        }

        fn engine(&self) -> MutationEngine<'_, MemoryStore> {
            MutationEngine::new(&self.store, &self.config, &self.schema, &self.metrics)
        }
    }

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => panic!("row must be an object"),
        }
    }

    #[test]
    fn test_insert_returns_identity_only() {
        let fixture = Fixture::new(false, WriteVisibility::Immediate);
        let result = fixture
            .engine()
            .insert(row(json!({"id": "7", "title": "hi", "tags": "[\"a\"]"})))
            .unwrap();
        assert_eq!(Value::Object(result), json!({"id": "7"}));
        assert_eq!(
            Value::Object(fixture.store.get(&fixture.config.request_arguments, "7").unwrap()),
            json!({"title": "hi", "tags": ["a"]})
        );
        assert_eq!(fixture.store.requests(StoreOperation::Lookup), 0);
    }

    #[test]
    fn test_insert_with_read_back() {
        let fixture = Fixture::new(true, WriteVisibility::WaitFor);
        let result = fixture
            .engine()
            .insert(row(json!({"id": "7", "title": "hi", "tags": "[\"a\"]"})))
            .unwrap();
        assert_eq!(
            Value::Object(result),
            json!({"id": "7", "title": "hi", "tags": "[\"a\"]"})
        );
    }

    #[test]
    fn test_insert_without_identity_is_rejected() {
        let fixture = Fixture::new(false, WriteVisibility::Immediate);
        let err = fixture.engine().insert(row(json!({"title": "hi"}))).unwrap_err();
        assert_eq!(err.code(), "ESFDW_MISSING_IDENTITY");
        assert_eq!(fixture.store.requests(StoreOperation::Index), 0);
    }

    #[test]
    fn test_read_back_miss_on_deferred_write() {
        let fixture = Fixture::new(true, WriteVisibility::Deferred);
        let result = fixture
            .engine()
            .insert(row(json!({"id": "7", "title": "hi"})))
            .unwrap();
        assert_eq!(Value::Object(result), json!({"id": "7"}));
        assert_eq!(fixture.metrics.snapshot().read_back_misses, 1);
    }

    #[test]
    fn test_update_uses_request_identity() {
        let fixture = Fixture::new(false, WriteVisibility::Immediate);
        let result = fixture
            .engine()
            .update(&json!("1"), row(json!({"id": "999", "title": "changed"})))
            .unwrap();
        assert_eq!(Value::Object(result), json!({"id": "1"}));

        let target = &fixture.config.request_arguments;
        assert_eq!(
            Value::Object(fixture.store.get(target, "1").unwrap()),
            json!({"title": "changed"})
        );
        assert!(fixture.store.get(target, "999").is_none());
    }

    #[test]
    fn test_index_failure() {
        let fixture = Fixture::new(true, WriteVisibility::Immediate);
        fixture.store.fail_on(StoreOperation::Index);
        let err = fixture
            .engine()
            .insert(row(json!({"id": "7", "title": "hi"})))
            .unwrap_err();
        assert!(!err.is_fatal());
        assert_eq!(fixture.store.requests(StoreOperation::Lookup), 0);
    }

    #[test]
    fn test_delete_reads_back_before_deleting() {
        let fixture = Fixture::new(true, WriteVisibility::Immediate);
        let result = fixture.engine().delete(&json!("1")).unwrap();
        assert_eq!(
            Value::Object(result),
            json!({"id": "1", "title": "one", "tags": "[\"x\"]"})
        );
        assert!(fixture.store.get(&fixture.config.request_arguments, "1").is_none());
    }

    #[test]
    fn test_delete_failure_discards_read_back() {
        let fixture = Fixture::new(true, WriteVisibility::Immediate);
        fixture.store.fail_on(StoreOperation::Delete);
        let err = fixture.engine().delete(&json!("1")).unwrap_err();
        assert_eq!(err.code(), "ESFDW_STORE_REQUEST_FAILED");
        assert_eq!(fixture.store.requests(StoreOperation::Lookup), 1);
    }

    #[test]
    fn test_read_back_failure_is_not_fatal() {
        let fixture = Fixture::new(true, WriteVisibility::Immediate);
        fixture.store.fail_on(StoreOperation::Lookup);
        let result = fixture
            .engine()
            .insert(row(json!({"id": "7", "title": "hi"})))
            .unwrap();
        assert_eq!(Value::Object(result), json!({"id": "7"}));
    }

    #[test]
    fn test_null_identity_rejected_for_delete() {
        let fixture = Fixture::new(false, WriteVisibility::Immediate);
        let err = fixture.engine().delete(&Value::Null).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(fixture.store.requests(StoreOperation::Delete), 0);
    }
}
