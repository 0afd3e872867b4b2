//! Table option resolution
//!
//! Options arrive as a string map attached to the foreign table. They are
//! resolved once per table handle into an immutable `TableConfig`; a bad
//! value aborts table open, never a single query.

mod config;
mod resolver;

pub use config::{
    ConnectionSettings, Credentials, StoreApiVersion, TableConfig, TargetArguments,
    WriteVisibility, DEFAULT_IDENTITY_COLUMN, DEFAULT_PAGE_LIFETIME, DEFAULT_PAGE_SIZE,
};
pub use resolver::{RawOptions, KNOWN_KEYS};
