//! # Audit Log Storage
//!
//! Capped, most-recent-first storage for [`LogEntry`] records.
//!
//! ## Retention
//! The log is a rolling window: appending beyond the cap evicts the
//! oldest entries (FIFO by insertion). A terminal that runs for months
//! can therefore never grow the log without bound.

use tally_core::LogEntry;

use crate::error::StoreResult;
use crate::kv::KvRepository;

/// Persisted key for the system log.
const KEY: &str = "system_log";

/// Repository for audit log storage.
#[derive(Debug, Clone)]
pub struct AuditLogRepository {
    kv: KvRepository,
}

impl AuditLogRepository {
    /// Creates a new AuditLogRepository.
    pub fn new(kv: KvRepository) -> Self {
        AuditLogRepository { kv }
    }

    /// Appends an entry at the front, evicting beyond `cap`.
    pub async fn append(&self, entry: LogEntry, cap: usize) -> StoreResult<()> {
        let mut entries = self.entries().await?;
        entries.insert(0, entry);
        entries.truncate(cap);
        self.kv.set_json(KEY, &entries).await
    }

    /// Returns all entries, most recent first.
    pub async fn entries(&self) -> StoreResult<Vec<LogEntry>> {
        Ok(self.kv.get_json(KEY).await?.unwrap_or_default())
    }

    /// Returns the number of stored entries.
    pub async fn count(&self) -> StoreResult<usize> {
        Ok(self.entries().await?.len())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::pool::{Store, StoreConfig};
    use chrono::Utc;
    use tally_core::{Actor, LogCategory, LogEntry, LogSeverity, LogSource};

    fn entry(action: &str) -> LogEntry {
        LogEntry {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            actor: Actor::system(),
            action: action.to_string(),
            description: format!("{} happened", action),
            category: LogCategory::System,
            severity: LogSeverity::Info,
            source: LogSource {
                terminal: "POS-001".to_string(),
                component: "test".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_append_most_recent_first() {
        let store = Store::new(StoreConfig::in_memory()).await.unwrap();
        let log = store.audit_log();

        log.append(entry("first"), 100).await.unwrap();
        log.append(entry("second"), 100).await.unwrap();

        let entries = log.entries().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, "second");
        assert_eq!(entries[1].action, "first");
    }

    /// Retention: N > cap appends never exceed cap; oldest evicted first.
    #[tokio::test]
    async fn test_retention_cap_evicts_oldest() {
        let store = Store::new(StoreConfig::in_memory()).await.unwrap();
        let log = store.audit_log();

        for i in 0..7 {
            log.append(entry(&format!("action-{}", i)), 5).await.unwrap();
        }

        let entries = log.entries().await.unwrap();
        assert_eq!(entries.len(), 5);
        // Newest kept at the front, oldest two (0 and 1) evicted
        assert_eq!(entries[0].action, "action-6");
        assert_eq!(entries[4].action, "action-2");
    }
}
