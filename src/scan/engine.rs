//! Scan execution
//!
//! A scan moves through `Idle → Fetching → Streaming → Exhausted` and back to
//! `Idle` once its cursor is released. Store failures end the scan quietly:
//! they are logged, the cursor is released, and no further rows are produced.

use std::vec;

use crate::columns::{ColumnSchema, Row};
use crate::errors::TableError;
use crate::observability::{log_debug, log_error, Event, TableMetrics};
use crate::options::TableConfig;
use crate::request::{Qualifier, RequestBuilder};
use crate::store::{Document, DocumentStore, SearchPage, StoreError};

use super::page_state::PageState;

/// Planner width estimate per requested column
pub const ROW_WIDTH_FACTOR: usize = 100;

/// Executes count and scan requests for one table
pub struct ScanEngine<'a, S: DocumentStore> {
    store: &'a S,
    config: &'a TableConfig,
    schema: &'a ColumnSchema,
    metrics: &'a TableMetrics,
}

impl<'a, S: DocumentStore> ScanEngine<'a, S> {
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

    /// Planner hint: `(matching documents, estimated row width)`
    ///
    /// Any failure yields `(0, 0)`.
    pub fn relation_size(&self, qualifiers: &[Qualifier], columns: &[String]) -> (u64, usize) {
        let builder = self.builder();
        let query = builder.query_literal(qualifiers);
        let count = builder
            .query_arguments(query.as_deref())
            .and_then(|arguments| self.store.count(&arguments));

        match count {
            Ok(count) => (count, columns.len() * ROW_WIDTH_FACTOR),
            Err(source) => {
                let error = TableError::store_request_failed("COUNT", &self.config.target_path, source);
                self.metrics.increment_store_failures();
                log_error!(
                    event = %Event::CountFailed,
                    path = %self.config.target_path,
                    error = %error,
                    "count failed"
                );
                (0, 0)
            }
        }
    }

    /// Start a scan
    ///
    /// Rows are fetched lazily, page by page, as the returned stream is
    /// consumed. A cursor left in `state` by an earlier scan is released first.
    pub fn execute(
        self,
        qualifiers: &[Qualifier],
        columns: Option<&[String]>,
        state: &'a mut PageState,
    ) -> RowStream<'a, S> {
        if state.is_active() {
            self.end_scan(state);
        }

        let builder = self.builder();
        RowStream {
            query: builder.query_literal(qualifiers),
            sort: builder.sort_literal(qualifiers),
            requested: columns.map(<[String]>::to_vec),
            engine: self,
            state,
            page: Vec::new().into_iter(),
            started: false,
            finished: false,
            failure: None,
        }
    }

    /// Release the cursor held by `state`, if any
    ///
    /// Release failures are logged; the cursor is discarded either way.
    pub fn end_scan(&self, state: &mut PageState) {
        let Some(cursor) = state.take_cursor() else {
            return;
        };

        match self.store.clear_scroll(&cursor) {
            Ok(()) => {
                self.metrics.increment_cursors_released();
                log_debug!(
                    event = %Event::CursorReleased,
                    path = %self.config.target_path,
                    "cursor released"
                );
            }
            Err(source) => {
                let error =
                    TableError::store_request_failed("CLEAR SCROLL", &self.config.target_path, source);
                self.metrics.increment_store_failures();
                log_error!(
                    event = %Event::CursorReleaseFailed,
                    path = %self.config.target_path,
                    error = %error,
                    "cursor release failed"
                );
            }
        }
    }
}

/// Lazy, non-restartable sequence of rows produced by one scan
///
/// Bound to the `PageState` it was started with; traversing the rows again
/// requires a new scan.
pub struct RowStream<'a, S: DocumentStore> {
    engine: ScanEngine<'a, S>,
    state: &'a mut PageState,
    requested: Option<Vec<String>>,
    query: Option<String>,
    sort: Option<String>,
    page: vec::IntoIter<Document>,
    started: bool,
    finished: bool,
    failure: Option<TableError>,
}

impl<S: DocumentStore> RowStream<'_, S> {
    /// The store failure that ended this scan early, if any
    pub fn failure(&self) -> Option<&TableError> {
        self.failure.as_ref()
    }

    fn fetch_page(&mut self) -> Result<SearchPage, TableError> {
        let engine = &self.engine;
        let path = &engine.config.target_path;

        if !self.started {
            self.started = true;
            let request = engine
                .builder()
                .search_request(self.query.as_deref(), self.sort.as_deref())
                .map_err(|source| TableError::store_request_failed("SEARCH", path, source))?;
            log_debug!(
                event = %Event::ScanBegin,
                path = %path,
                query = ?self.query,
                sort = ?self.sort,
                "scan started"
            );
            let page = engine
                .store
                .search(&request)
                .map_err(|source| TableError::store_request_failed("SEARCH", path, source))?;
            if page.cursor.is_some() {
                engine.metrics.increment_cursors_opened();
            }
            return Ok(page);
        }

        let cursor = self.state.cursor().ok_or_else(|| {
            TableError::store_request_failed(
                "SCROLL",
                path,
                StoreError::Malformed("store returned no cursor for a full page".into()),
            )
        })?;
        engine
            .store
            .scroll(cursor, &engine.config.page_lifetime)
            .map_err(|source| TableError::store_request_failed("SCROLL", path, source))
    }

    /// Fetch the next page into `self.page`, marking the scan finished on the last one
    fn advance(&mut self) -> Result<(), TableError> {
        let page = self.fetch_page()?;
        let engine = &self.engine;
        engine.metrics.increment_pages_fetched();

        if let Some(cursor) = page.cursor {
            self.state.stream(cursor);
        }

        let hits = page.hits.len();
        log_debug!(
            event = %Event::PageFetched,
            path = %engine.config.target_path,
            hits,
            "page fetched"
        );

        // A short page is final, even if the cursor could yield more.
        if hits < engine.config.page_size {
            self.finished = true;
            self.state.exhaust();
            log_debug!(
                event = %Event::ScanExhausted,
                path = %engine.config.target_path,
                "scan exhausted"
            );
        }

        self.page = page.hits.into_iter();
        Ok(())
    }

    fn abort(&mut self, error: TableError) {
        self.finished = true;
        self.engine.metrics.increment_store_failures();
        log_error!(
            event = %Event::ScanFailed,
            path = %self.engine.config.target_path,
            error = %error,
            "scan failed"
        );
        self.engine.end_scan(self.state);
        self.failure = Some(error);
    }
}

impl<S: DocumentStore> Iterator for RowStream<'_, S> {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        loop {
            if let Some(document) = self.page.next() {
                self.engine.metrics.increment_rows_produced();
                return Some(self.engine.schema.deserialize(
                    &document,
                    self.requested.as_deref(),
                    self.query.as_deref(),
                    self.sort.as_deref(),
                ));
            }

            if self.finished {
                return None;
            }

            if let Err(error) = self.advance() {
                self.abort(error);
                return None;
            }
        }
    }
}
