//! Paginated scans over the store
//!
//! # Cursor lifecycle
//!
//! The first page opens a store-side cursor whose token lives in the
//! caller's `PageState`. Pages are requested strictly in cursor order, and a
//! page shorter than the configured page size ends the scan. The cursor must
//! be released through `end_scan` once the scan completes or is abandoned;
//! a failed scan releases it on its own.

mod engine;
mod page_state;

pub use engine::{RowStream, ScanEngine, ROW_WIDTH_FACTOR};
pub use page_state::{PageState, ScanPhase};
