//! Storage sink for operation and resource-usage records.
//!
//! The engine treats writes as fire-and-forget appends and never depends on
//! reading back what it wrote; the read side exists for presentation (recent
//! history, aggregate stats) and is backed here by an in-memory store. A
//! durable database sits behind the same trait as an external collaborator.

#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::resource::{ComplianceResult, ResourceSample};

/* ============================================================================
 * Rows
 * ========================================================================== */

/// One row per invocation, success or failure. Append-only.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OperationRecord {
    pub operation: String,
    pub algorithm: String,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    pub execution_time_ms: f64,
    pub error: Option<String>,
}

/// The before/after sample pair captured around one invocation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResourceUsageRecord {
    pub operation: String,
    pub before: ResourceSample,
    pub after: ResourceSample,
    pub compliance: ComplianceResult,
}

/// Aggregate view of one operation kind.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct OperationStats {
    pub avg_time_ms: f64,
    pub count: u64,
}

/* ============================================================================
 * Sink trait
 * ========================================================================== */

/// Append-only sink plus the read-back the presentation layer wants.
///
/// Writes must not fail the caller; implementations log and drop on internal
/// errors.
pub trait OperationStore: Send + Sync {
    fn record_operation(&self, record: OperationRecord);
    fn record_usage(&self, record: ResourceUsageRecord);

    /// Most recent first.
    fn recent_operations(&self, limit: usize) -> Vec<OperationRecord>;

    /// Average execution time and call count per operation kind.
    fn stats(&self) -> BTreeMap<String, OperationStats>;

    fn clear(&self);
}

/* ============================================================================
 * In-memory store
 * ========================================================================== */

#[derive(Default)]
pub struct MemoryStore {
    operations: Mutex<Vec<OperationRecord>>,
    usage: Mutex<Vec<ResourceUsageRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn operation_count(&self) -> usize {
        self.operations.lock().map(|ops| ops.len()).unwrap_or(0)
    }

    pub fn usage_count(&self) -> usize {
        self.usage.lock().map(|rows| rows.len()).unwrap_or(0)
    }
}

impl OperationStore for MemoryStore {
    fn record_operation(&self, record: OperationRecord) {
        match self.operations.lock() {
            Ok(mut ops) => ops.push(record),
            Err(_) => log::warn!("operation store poisoned, dropping record"),
        }
    }

    fn record_usage(&self, record: ResourceUsageRecord) {
        match self.usage.lock() {
            Ok(mut rows) => rows.push(record),
            Err(_) => log::warn!("usage store poisoned, dropping record"),
        }
    }

    fn recent_operations(&self, limit: usize) -> Vec<OperationRecord> {
        match self.operations.lock() {
            Ok(ops) => ops.iter().rev().take(limit).cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    fn stats(&self) -> BTreeMap<String, OperationStats> {
        let mut totals: BTreeMap<String, (f64, u64)> = BTreeMap::new();
        if let Ok(ops) = self.operations.lock() {
            for record in ops.iter() {
                let entry = totals.entry(record.operation.clone()).or_insert((0.0, 0));
                entry.0 += record.execution_time_ms;
                entry.1 += 1;
            }
        }
        totals
            .into_iter()
            .map(|(operation, (total_ms, count))| {
                let avg = total_ms / count as f64;
                (operation, OperationStats {
                    avg_time_ms: (avg * 100.0).round() / 100.0,
                    count,
                })
            })
            .collect()
    }

    fn clear(&self) {
        if let Ok(mut ops) = self.operations.lock() {
            ops.clear();
        }
        if let Ok(mut rows) = self.usage.lock() {
            rows.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(operation: &str, ms: f64, success: bool) -> OperationRecord {
        OperationRecord {
            operation: operation.into(),
            algorithm: "Kyber768".into(),
            timestamp: Utc::now(),
            success,
            execution_time_ms: ms,
            error: if success { None } else { Some("invalid key".into()) },
        }
    }

    #[test]
    fn records_append_and_count() {
        let store = MemoryStore::new();
        store.record_operation(record("kem_keygen", 1.5, true));
        store.record_operation(record("kem_keygen", 2.5, false));
        assert_eq!(store.operation_count(), 2);
    }

    #[test]
    fn recent_is_newest_first_and_bounded() {
        let store = MemoryStore::new();
        for i in 0..5 {
            store.record_operation(record(&format!("op{i}"), 1.0, true));
        }
        let recent = store.recent_operations(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].operation, "op4");
        assert_eq!(recent[1].operation, "op3");
    }

    #[test]
    fn stats_average_per_operation() {
        let store = MemoryStore::new();
        store.record_operation(record("kem_keygen", 1.0, true));
        store.record_operation(record("kem_keygen", 2.0, true));
        store.record_operation(record("sig_sign", 10.0, true));

        let stats = store.stats();
        assert_eq!(stats["kem_keygen"].count, 2);
        assert_eq!(stats["kem_keygen"].avg_time_ms, 1.5);
        assert_eq!(stats["sig_sign"].count, 1);
    }

    #[test]
    fn failed_operations_count_too() {
        let store = MemoryStore::new();
        store.record_operation(record("kem_encapsulate", 0.1, false));
        assert_eq!(store.stats()["kem_encapsulate"].count, 1);
    }

    #[test]
    fn clear_empties_both_tables() {
        let store = MemoryStore::new();
        store.record_operation(record("kem_keygen", 1.0, true));
        store.clear();
        assert_eq!(store.operation_count(), 0);
        assert!(store.stats().is_empty());
    }
}
