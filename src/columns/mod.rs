//! Column mapping between table rows and documents
//!
//! Each declared column plays exactly one role:
//!
//! - Identity: the document id (`rowid_column`)
//! - Score: the relevance score of a hit (`score_column`)
//! - Json: `json`/`jsonb` columns, exchanged as JSON text
//! - Plain: everything else, copied verbatim
//!
//! Query and sort columns are virtual and never reach the store.

mod column;
mod schema;

pub use column::{ColumnDefinition, ColumnSpec};
pub use schema::{identity_text, ColumnSchema, Row};
