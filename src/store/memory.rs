//! In-process document store
//!
//! Implements the `DocumentStore` contract without a cluster. Supports a
//! useful subset of the query language:
//!
//! - query strings: `*`, `field:value`, or free text matched against every field
//! - structured bodies: `match_all`, `ids`, `term`, `match`, `query_string`, `bool`
//! - sorts: `field[:asc|desc]`, comma separated, missing values last
//!
//! Writes with `refresh=false` stay invisible to searches until `refresh()`,
//! mirroring the near-real-time behaviour of a real cluster. Every request is
//! counted per operation, and individual operations can be made to fail.

use std::cmp::Ordering as CmpOrdering;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::options::{TargetArguments, WriteVisibility};
use crate::request::{DeleteRequest, IndexRequest, QueryArguments, QueryBody, SearchRequest};

use super::document::{Document, SearchPage};
use super::errors::{StoreError, StoreResult};
use super::DocumentStore;

/// Store operations, for counting and failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StoreOperation {
    Count,
    Search,
    Scroll,
    ClearScroll,
    Lookup,
    Index,
    Delete,
}

impl StoreOperation {
    fn slot(self) -> usize {
        match self {
            StoreOperation::Count => 0,
            StoreOperation::Search => 1,
            StoreOperation::Scroll => 2,
            StoreOperation::ClearScroll => 3,
            StoreOperation::Lookup => 4,
            StoreOperation::Index => 5,
            StoreOperation::Delete => 6,
        }
    }
}

#[derive(Debug, Default)]
struct Collection {
    visible: BTreeMap<String, Map<String, Value>>,
    /// Writes not yet refreshed; `None` marks a pending delete
    pending: BTreeMap<String, Option<Map<String, Value>>>,
}

impl Collection {
    fn refresh(&mut self) {
        for (id, write) in std::mem::take(&mut self.pending) {
            match write {
                Some(source) => {
                    self.visible.insert(id, source);
                }
                None => {
                    self.visible.remove(&id);
                }
            }
        }
    }

    fn contains(&self, id: &str) -> bool {
        match self.pending.get(id) {
            Some(write) => write.is_some(),
            None => self.visible.contains_key(id),
        }
    }
}

#[derive(Debug)]
struct Cursor {
    remaining: VecDeque<Document>,
    size: usize,
}

#[derive(Debug, Default)]
struct MemoryState {
    collections: BTreeMap<String, Collection>,
    cursors: HashMap<String, Cursor>,
}

impl MemoryState {
    fn matching(&self, arguments: &QueryArguments) -> StoreResult<Vec<Document>> {
        let path = arguments.target.path();
        let collection = self
            .collections
            .get(&path)
            .ok_or_else(|| StoreError::not_found(format!("no such index [{}]", path)))?;

        let mut hits = Vec::new();
        for (id, source) in &collection.visible {
            if matches_query(arguments.query.as_ref(), id, source)? {
                hits.push(Document::new(id.clone(), source.clone()).with_score(1.0));
            }
        }
        Ok(hits)
    }
}

/// In-memory `DocumentStore`
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    requests: [AtomicU64; 7],
    failing: Mutex<BTreeSet<StoreOperation>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a document directly, visible immediately
    ///
    /// Non-object sources are stored as empty documents.
    pub fn put(&self, target: &TargetArguments, id: impl Into<String>, source: Value) {
        let source = match source {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        self.lock()
            .collections
            .entry(target.path())
            .or_default()
            .visible
            .insert(id.into(), source);
    }

    /// Searchable version of a document, ignoring unrefreshed writes
    pub fn get(&self, target: &TargetArguments, id: &str) -> Option<Map<String, Value>> {
        self.lock()
            .collections
            .get(&target.path())
            .and_then(|collection| collection.visible.get(id).cloned())
    }

    /// Make every pending write visible
    pub fn refresh(&self) {
        for collection in self.lock().collections.values_mut() {
            collection.refresh();
        }
    }

    /// Fail every subsequent `operation` until `recover` is called
    pub fn fail_on(&self, operation: StoreOperation) {
        self.failures().insert(operation);
    }

    pub fn recover(&self, operation: StoreOperation) {
        self.failures().remove(&operation);
    }

    /// Requests issued for `operation`, including failed ones
    pub fn requests(&self, operation: StoreOperation) -> u64 {
        self.requests[operation.slot()].load(Ordering::Relaxed)
    }

    /// Cursors opened by `search` and not yet cleared
    pub fn open_cursors(&self) -> usize {
        self.lock().cursors.len()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn failures(&self) -> MutexGuard<'_, BTreeSet<StoreOperation>> {
        self.failing.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self, operation: StoreOperation) -> StoreResult<()> {
        self.requests[operation.slot()].fetch_add(1, Ordering::Relaxed);
        if self.failures().contains(&operation) {
            return Err(StoreError::Injected);
        }
        Ok(())
    }
}

impl DocumentStore for MemoryStore {
    fn count(&self, request: &QueryArguments) -> StoreResult<u64> {
        self.begin(StoreOperation::Count)?;
        Ok(self.lock().matching(request)?.len() as u64)
    }

    fn search(&self, request: &SearchRequest) -> StoreResult<SearchPage> {
        self.begin(StoreOperation::Search)?;
        let mut state = self.lock();
        let mut hits = state.matching(&request.query)?;

        if let Some(sort) = &request.pagination.sort {
            sort_hits(&mut hits, sort)?;
            // Sorted searches do not compute relevance.
            for hit in &mut hits {
                hit.score = None;
            }
        }

        let size = request.pagination.size;
        let remaining: VecDeque<Document> = hits.split_off(size.min(hits.len())).into();
        let cursor = Uuid::new_v4().to_string();
        state
            .cursors
            .insert(cursor.clone(), Cursor { remaining, size });

        Ok(SearchPage {
            cursor: Some(cursor),
            hits,
        })
    }

    fn scroll(&self, cursor: &str, _lifetime: &str) -> StoreResult<SearchPage> {
        self.begin(StoreOperation::Scroll)?;
        let mut state = self.lock();
        let open = state
            .cursors
            .get_mut(cursor)
            .ok_or_else(|| StoreError::not_found(format!("no search context found for [{}]", cursor)))?;

        let take = open.size.min(open.remaining.len());
        let hits = open.remaining.drain(..take).collect();
        Ok(SearchPage {
            cursor: Some(cursor.to_string()),
            hits,
        })
    }

    fn clear_scroll(&self, cursor: &str) -> StoreResult<()> {
        self.begin(StoreOperation::ClearScroll)?;
        self.lock().cursors.remove(cursor);
        Ok(())
    }

    fn lookup(&self, request: &QueryArguments) -> StoreResult<Vec<Document>> {
        self.begin(StoreOperation::Lookup)?;
        self.lock().matching(request)
    }

    fn index(&self, request: &IndexRequest) -> StoreResult<String> {
        self.begin(StoreOperation::Index)?;
        let mut state = self.lock();
        let collection = state.collections.entry(request.target.path()).or_default();
        collection
            .pending
            .insert(request.id.clone(), Some(request.body.clone()));
        if request.refresh != WriteVisibility::Deferred {
            collection.refresh();
        }
        Ok(request.id.clone())
    }

    fn delete(&self, request: &DeleteRequest) -> StoreResult<()> {
        self.begin(StoreOperation::Delete)?;
        let mut state = self.lock();
        let path = request.target.path();
        let collection = match state.collections.get_mut(&path) {
            Some(collection) if collection.contains(&request.id) => collection,
            _ => {
                return Err(StoreError::not_found(format!(
                    "document [{}] not found in [{}]",
                    request.id, path
                )))
            }
        };

        collection.pending.insert(request.id.clone(), None);
        if request.refresh != WriteVisibility::Deferred {
            collection.refresh();
        }
        Ok(())
    }
}

fn matches_query(query: Option<&QueryBody>, id: &str, source: &Map<String, Value>) -> StoreResult<bool> {
    match query {
        None => Ok(true),
        Some(QueryBody::QueryString(text)) => Ok(matches_query_string(text, source)),
        Some(QueryBody::Structured(body)) => match body.get("query") {
            None => Ok(true),
            Some(clause) => matches_clause(clause, id, source),
        },
    }
}

fn matches_query_string(text: &str, source: &Map<String, Value>) -> bool {
    let text = text.trim();
    if text.is_empty() || text == "*" {
        return true;
    }
    match text.split_once(':') {
        Some((field, expected)) => field_matches(source.get(field.trim()), expected.trim()),
        None => source.values().any(|value| field_matches(Some(value), text)),
    }
}

/// Token-level, case-insensitive comparison of a field against query text
fn field_matches(value: Option<&Value>, expected: &str) -> bool {
    let expected = expected.trim_matches('"').to_lowercase();
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(text)) => {
            let text = text.to_lowercase();
            text == expected || text.split_whitespace().any(|token| token == expected)
        }
        Some(Value::Array(items)) => items
            .iter()
            .any(|item| field_matches(Some(item), &expected)),
        Some(Value::Object(_)) => false,
        Some(other) => other.to_string().to_lowercase() == expected,
    }
}

fn matches_clause(clause: &Value, id: &str, source: &Map<String, Value>) -> StoreResult<bool> {
    let (kind, body) = clause
        .as_object()
        .and_then(|object| object.iter().next())
        .ok_or_else(|| StoreError::InvalidRequest(format!("malformed query clause: {}", clause)))?;

    match kind.as_str() {
        "match_all" => Ok(true),
        "ids" => {
            let values = body
                .get("values")
                .and_then(Value::as_array)
                .ok_or_else(|| StoreError::InvalidRequest("ids query requires values".into()))?;
            Ok(values.iter().any(|value| match value {
                Value::String(text) => text == id,
                other => other.to_string() == id,
            }))
        }
        "term" => {
            let (field, expected) = single_field(kind, body)?;
            let expected = expected.get("value").unwrap_or(expected);
            Ok(match source.get(field) {
                Some(Value::Array(items)) => items.contains(expected),
                Some(value) => value == expected,
                None => false,
            })
        }
        "match" => {
            let (field, expected) = single_field(kind, body)?;
            let expected = expected.get("query").unwrap_or(expected);
            let text = match expected {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            Ok(field_matches(source.get(field), &text))
        }
        "query_string" => {
            let text = body
                .get("query")
                .and_then(Value::as_str)
                .ok_or_else(|| StoreError::InvalidRequest("query_string requires query".into()))?;
            Ok(matches_query_string(text, source))
        }
        "bool" => {
            for clause in clauses(body.get("must")).chain(clauses(body.get("filter"))) {
                if !matches_clause(clause, id, source)? {
                    return Ok(false);
                }
            }
            for clause in clauses(body.get("must_not")) {
                if matches_clause(clause, id, source)? {
                    return Ok(false);
                }
            }
            let should: Vec<&Value> = clauses(body.get("should")).collect();
            if should.is_empty() {
                return Ok(true);
            }
            for clause in should {
                if matches_clause(clause, id, source)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        other => Err(StoreError::InvalidRequest(format!(
            "unsupported query type [{}]",
            other
        ))),
    }
}

fn single_field<'a>(kind: &str, body: &'a Value) -> StoreResult<(&'a str, &'a Value)> {
    body.as_object()
        .and_then(|object| object.iter().next())
        .map(|(field, value)| (field.as_str(), value))
        .ok_or_else(|| StoreError::InvalidRequest(format!("{} query requires a field", kind)))
}

fn clauses(value: Option<&Value>) -> Box<dyn Iterator<Item = &Value> + '_> {
    match value {
        None => Box::new(std::iter::empty()),
        Some(Value::Array(items)) => Box::new(items.iter()),
        Some(single) => Box::new(std::iter::once(single)),
    }
}

fn sort_hits(hits: &mut [Document], sort: &str) -> StoreResult<()> {
    let mut keys = Vec::new();
    for part in sort.split(',').map(str::trim).filter(|part| !part.is_empty()) {
        let (field, descending) = match part.split_once(':') {
            None => (part, false),
            Some((field, "asc")) => (field, false),
            Some((field, "desc")) => (field, true),
            Some((_, direction)) => {
                return Err(StoreError::InvalidRequest(format!(
                    "unknown sort direction [{}]",
                    direction
                )))
            }
        };
        keys.push((field.to_string(), descending));
    }

    hits.sort_by(|a, b| {
        for (field, descending) in &keys {
            let ordering = match (sort_value(a, field), sort_value(b, field)) {
                (None, None) => CmpOrdering::Equal,
                (None, Some(_)) => CmpOrdering::Greater,
                (Some(_), None) => CmpOrdering::Less,
                (Some(x), Some(y)) => {
                    let ordering = compare_values(&x, &y);
                    if *descending {
                        ordering.reverse()
                    } else {
                        ordering
                    }
                }
            };
            if ordering != CmpOrdering::Equal {
                return ordering;
            }
        }
        CmpOrdering::Equal
    });
    Ok(())
}

fn sort_value(document: &Document, field: &str) -> Option<Value> {
    if field == "_id" {
        return Some(Value::String(document.id.clone()));
    }
    document.source.get(field).filter(|value| !value.is_null()).cloned()
}

fn compare_values(a: &Value, b: &Value) -> CmpOrdering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(CmpOrdering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::PaginationArguments;
    use serde_json::json;

    fn target() -> TargetArguments {
        TargetArguments::new("articles", None)
    }

    fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        store.put(&target(), "1", json!({"title": "Hello world", "rank": 3, "tags": ["a", "b"]}));
        store.put(&target(), "2", json!({"title": "Goodbye", "rank": 1}));
        store.put(&target(), "3", json!({"title": "hello again", "rank": 2}));
        store
    }

    fn query(body: Option<QueryBody>) -> QueryArguments {
        QueryArguments {
            target: target(),
            query: body,
        }
    }

    fn search(body: Option<QueryBody>, sort: Option<&str>, size: usize) -> SearchRequest {
        SearchRequest {
            query: query(body),
            pagination: PaginationArguments {
                sort: sort.map(str::to_string),
                size,
                scroll: "1m".into(),
            },
        }
    }

    #[test]
    fn test_query_string_field_match() {
        let store = seeded();
        let count = store
            .count(&query(Some(QueryBody::QueryString("title:hello".into()))))
            .unwrap();
        assert_eq!(count, 2);
        let count = store
            .count(&query(Some(QueryBody::QueryString("tags:b".into()))))
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(store.count(&query(None)).unwrap(), 3);
    }

    #[test]
    fn test_structured_queries() {
        let store = seeded();
        let ids = QueryBody::Structured(json!({"query": {"ids": {"values": ["2", "3"]}}}));
        assert_eq!(store.lookup(&query(Some(ids))).unwrap().len(), 2);

        let term = QueryBody::Structured(json!({"query": {"term": {"rank": 3}}}));
        let hits = store.lookup(&query(Some(term))).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "1");

        let boolean = QueryBody::Structured(json!({"query": {"bool": {
            "must": {"match": {"title": "hello"}},
            "must_not": [{"term": {"rank": 2}}]
        }}}));
        let hits = store.lookup(&query(Some(boolean))).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "1");

        let unsupported = QueryBody::Structured(json!({"query": {"fuzzy": {"title": "helo"}}}));
        assert!(matches!(
            store.lookup(&query(Some(unsupported))),
            Err(StoreError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_unknown_index_is_not_found() {
        let store = MemoryStore::new();
        let err = store.count(&query(None)).unwrap_err();
        assert!(matches!(err, StoreError::Status { status: 404, .. }));
    }

    #[test]
    fn test_scroll_pages_and_clear() {
        let store = seeded();
        let first = store.search(&search(None, Some("rank:desc"), 2)).unwrap();
        let cursor = first.cursor.clone().unwrap();
        let ids: Vec<_> = first.hits.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
        assert!(first.hits.iter().all(|d| d.score.is_none()));

        let second = store.scroll(&cursor, "1m").unwrap();
        assert_eq!(second.hits.len(), 1);
        assert_eq!(second.hits[0].id, "2");
        assert!(store.scroll(&cursor, "1m").unwrap().hits.is_empty());

        assert_eq!(store.open_cursors(), 1);
        store.clear_scroll(&cursor).unwrap();
        assert_eq!(store.open_cursors(), 0);
        assert!(matches!(
            store.scroll(&cursor, "1m"),
            Err(StoreError::Status { status: 404, .. })
        ));
    }

    #[test]
    fn test_deferred_writes_wait_for_refresh() {
        let store = seeded();
        let mut body = Map::new();
        body.insert("title".into(), json!("fresh"));
        let request = IndexRequest {
            target: target(),
            id: "9".into(),
            body,
            refresh: WriteVisibility::Deferred,
        };
        assert_eq!(store.index(&request).unwrap(), "9");
        assert!(store.get(&target(), "9").is_none());
        store.refresh();
        assert_eq!(store.get(&target(), "9").unwrap()["title"], "fresh");
    }

    #[test]
    fn test_delete_missing_document() {
        let store = seeded();
        let request = DeleteRequest {
            target: target(),
            id: "404".into(),
            refresh: WriteVisibility::Immediate,
        };
        assert!(matches!(
            store.delete(&request),
            Err(StoreError::Status { status: 404, .. })
        ));

        let request = DeleteRequest {
            id: "1".into(),
            ..request
        };
        store.delete(&request).unwrap();
        assert!(store.get(&target(), "1").is_none());
    }

    #[test]
    fn test_failure_injection_counts_requests() {
        let store = seeded();
        store.fail_on(StoreOperation::Count);
        assert_eq!(store.count(&query(None)), Err(StoreError::Injected));
        assert_eq!(store.requests(StoreOperation::Count), 1);
        store.recover(StoreOperation::Count);
        assert_eq!(store.count(&query(None)), Ok(3));
        assert_eq!(store.requests(StoreOperation::Count), 2);
    }
}
