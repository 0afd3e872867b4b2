//! Store request construction

mod builder;
mod types;

pub use builder::{extract_qualifier, RequestBuilder};
pub use types::{
    DeleteRequest, IndexRequest, PaginationArguments, Qualifier, QueryArguments, QueryBody,
    SearchRequest,
};
