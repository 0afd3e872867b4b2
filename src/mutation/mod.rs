//! Single-document mutations

mod engine;

pub use engine::MutationEngine;
