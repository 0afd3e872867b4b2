//! Request construction
//!
//! Pure functions from configuration, qualifiers and pagination state to the
//! parameter sets the store understands. Nothing here performs I/O.

use serde_json::{json, Map, Value};

use crate::options::TableConfig;
use crate::store::{StoreError, StoreResult};

use super::types::{
    DeleteRequest, IndexRequest, PaginationArguments, Qualifier, QueryArguments, QueryBody,
    SearchRequest,
};

/// Builds store requests for one table
#[derive(Debug, Clone, Copy)]
pub struct RequestBuilder<'a> {
    config: &'a TableConfig,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(config: &'a TableConfig) -> Self {
        Self { config }
    }

    /// Query literal pushed down through the query column, if any
    pub fn query_literal(&self, qualifiers: &[Qualifier]) -> Option<String> {
        extract_qualifier(qualifiers, self.config.query_column.as_deref(), None)
    }

    /// Sort literal pushed down through the sort column, else the default sort
    pub fn sort_literal(&self, qualifiers: &[Qualifier]) -> Option<String> {
        extract_qualifier(
            qualifiers,
            self.config.sort_column.as_deref(),
            self.config.default_sort.clone(),
        )
    }

    /// Base arguments plus the query, if one was pushed down
    ///
    /// A structured query that is not valid JSON fails the request it was
    /// meant for; it is never downgraded to a query string.
    pub fn query_arguments(&self, query: Option<&str>) -> StoreResult<QueryArguments> {
        let query = match query {
            None => None,
            Some(text) if self.config.is_structured_query => {
                let body: Value = serde_json::from_str(text).map_err(|e| {
                    StoreError::InvalidRequest(format!("query is not valid JSON: {}", e))
                })?;
                Some(QueryBody::Structured(body))
            }
            Some(text) => Some(QueryBody::QueryString(text.to_string())),
        };

        Ok(QueryArguments {
            target: self.config.request_arguments.clone(),
            query,
        })
    }

    /// Base arguments plus an identity-match query
    pub fn id_lookup_arguments(&self, identity: &str) -> QueryArguments {
        QueryArguments {
            target: self.config.request_arguments.clone(),
            query: Some(QueryBody::Structured(
                json!({ "query": { "ids": { "values": [identity] } } }),
            )),
        }
    }

    pub fn pagination_arguments(&self, sort: Option<&str>) -> PaginationArguments {
        PaginationArguments {
            sort: sort.map(str::to_string),
            size: self.config.page_size,
            scroll: self.config.page_lifetime.clone(),
        }
    }

    /// First page request of a scan
    pub fn search_request(
        &self,
        query: Option<&str>,
        sort: Option<&str>,
    ) -> StoreResult<SearchRequest> {
        Ok(SearchRequest {
            query: self.query_arguments(query)?,
            pagination: self.pagination_arguments(sort),
        })
    }

    pub fn index_arguments(&self, identity: &str, body: Map<String, Value>) -> IndexRequest {
        IndexRequest {
            target: self.config.request_arguments.clone(),
            id: identity.to_string(),
            body,
            refresh: self.config.write_visibility,
        }
    }

    pub fn delete_arguments(&self, identity: &str) -> DeleteRequest {
        DeleteRequest {
            target: self.config.request_arguments.clone(),
            id: identity.to_string(),
            refresh: self.config.write_visibility,
        }
    }
}

/// Value of the first qualifier on `field_name`, or `default`
pub fn extract_qualifier(
    qualifiers: &[Qualifier],
    field_name: Option<&str>,
    default: Option<String>,
) -> Option<String> {
    let Some(field_name) = field_name else {
        return default;
    };

    match qualifiers.iter().find(|q| q.field_name == field_name) {
        Some(qualifier) => qualifier.literal(),
        None => default,
    }
}
