//! Document store boundary
//!
//! The table talks to the store only through `DocumentStore`. Two
//! implementations ship with the crate:
//!
//! - `HttpStore`: blocking REST client for a live search cluster
//! - `MemoryStore`: in-process store with the same contract, used in tests

mod document;
mod errors;
mod http;
mod memory;

pub use document::{Document, SearchPage};
pub use errors::{StoreError, StoreResult};
pub use http::HttpStore;
pub use memory::{MemoryStore, StoreOperation};

use std::fmt;
use std::sync::Arc;

use crate::request::{DeleteRequest, IndexRequest, QueryArguments, SearchRequest};

/// Operations the table issues against a document store
///
/// Every call blocks until the store answers.
pub trait DocumentStore: Send + Sync + fmt::Debug {
    /// Number of documents matching the query
    fn count(&self, request: &QueryArguments) -> StoreResult<u64>;

    /// First page of a scrolled search
    fn search(&self, request: &SearchRequest) -> StoreResult<SearchPage>;

    /// Next page of an open cursor
    fn scroll(&self, cursor: &str, lifetime: &str) -> StoreResult<SearchPage>;

    /// Release an open cursor
    fn clear_scroll(&self, cursor: &str) -> StoreResult<()>;

    /// Unpaginated search, used for point lookups
    fn lookup(&self, request: &QueryArguments) -> StoreResult<Vec<Document>>;

    /// Create or replace a document; returns the identity the store assigned
    fn index(&self, request: &IndexRequest) -> StoreResult<String>;

    fn delete(&self, request: &DeleteRequest) -> StoreResult<()>;
}

impl<T: DocumentStore + ?Sized> DocumentStore for Arc<T> {
    fn count(&self, request: &QueryArguments) -> StoreResult<u64> {
        (**self).count(request)
    }

    fn search(&self, request: &SearchRequest) -> StoreResult<SearchPage> {
        (**self).search(request)
    }

    fn scroll(&self, cursor: &str, lifetime: &str) -> StoreResult<SearchPage> {
        (**self).scroll(cursor, lifetime)
    }

    fn clear_scroll(&self, cursor: &str) -> StoreResult<()> {
        (**self).clear_scroll(cursor)
    }

    fn lookup(&self, request: &QueryArguments) -> StoreResult<Vec<Document>> {
        (**self).lookup(request)
    }

    fn index(&self, request: &IndexRequest) -> StoreResult<String> {
        (**self).index(request)
    }

    fn delete(&self, request: &DeleteRequest) -> StoreResult<()> {
        (**self).delete(request)
    }
}
