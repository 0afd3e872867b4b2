//! Per-table counters
//!
//! Counters only, monotonic, relaxed ordering.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters for one table handle
#[derive(Debug, Default)]
pub struct TableMetrics {
    cursors_opened: AtomicU64,
    cursors_released: AtomicU64,
    pages_fetched: AtomicU64,
    rows_produced: AtomicU64,
    documents_indexed: AtomicU64,
    documents_deleted: AtomicU64,
    read_back_misses: AtomicU64,
    store_failures: AtomicU64,
}

impl TableMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_cursors_opened(&self) {
        self.cursors_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_cursors_released(&self) {
        self.cursors_released.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts every page, the first one included
    pub fn increment_pages_fetched(&self) {
        self.pages_fetched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_rows_produced(&self) {
        self.rows_produced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_documents_indexed(&self) {
        self.documents_indexed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_documents_deleted(&self) {
        self.documents_deleted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_read_back_misses(&self) {
        self.read_back_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_store_failures(&self) {
        self.store_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cursors_opened: self.cursors_opened.load(Ordering::Relaxed),
            cursors_released: self.cursors_released.load(Ordering::Relaxed),
            pages_fetched: self.pages_fetched.load(Ordering::Relaxed),
            rows_produced: self.rows_produced.load(Ordering::Relaxed),
            documents_indexed: self.documents_indexed.load(Ordering::Relaxed),
            documents_deleted: self.documents_deleted.load(Ordering::Relaxed),
            read_back_misses: self.read_back_misses.load(Ordering::Relaxed),
            store_failures: self.store_failures.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of `TableMetrics`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub cursors_opened: u64,
    pub cursors_released: u64,
    pub pages_fetched: u64,
    pub rows_produced: u64,
    pub documents_indexed: u64,
    pub documents_deleted: u64,
    pub read_back_misses: u64,
    pub store_failures: u64,
}

impl MetricsSnapshot {
    /// Cursors opened but not yet released
    pub fn open_cursors(&self) -> u64 {
        self.cursors_opened.saturating_sub(self.cursors_released)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_metrics_are_zero() {
        assert_eq!(TableMetrics::new().snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_open_cursors() {
        let metrics = TableMetrics::new();
        metrics.increment_cursors_opened();
        metrics.increment_cursors_opened();
        metrics.increment_cursors_released();
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.cursors_opened, 2);
        assert_eq!(snapshot.open_cursors(), 1);
    }

    #[test]
    fn test_snapshot_serializes() {
        let metrics = TableMetrics::new();
        metrics.increment_store_failures();
        let json = serde_json::to_value(metrics.snapshot()).unwrap();
        assert_eq!(json["store_failures"], 1);
    }
}
