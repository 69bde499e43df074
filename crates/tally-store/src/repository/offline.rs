//! # Offline Transaction Queue
//!
//! Durable queue of transactions created while the commit endpoint was
//! unreachable, awaiting later reconciliation.
//!
//! ## Queue Semantics
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    offline_transactions                                 │
//! │                                                                         │
//! │  append(txn)   ──► push to the end (FIFO by creation)                  │
//! │  pending()     ──► full snapshot, oldest first                         │
//! │  remove(id)    ──► drop one reconciled transaction                     │
//! │  clear()       ──► drop everything (after bulk reconciliation)         │
//! │                                                                         │
//! │  Entries carry status = offline_pending; reconciliation happens        │
//! │  outside this crate.                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tracing::debug;

use tally_core::Transaction;

use crate::error::StoreResult;
use crate::kv::KvRepository;

/// Persisted key for the offline queue.
const KEY: &str = "offline_transactions";

/// Repository for the offline transaction queue.
#[derive(Debug, Clone)]
pub struct OfflineQueueRepository {
    kv: KvRepository,
}

impl OfflineQueueRepository {
    /// Creates a new OfflineQueueRepository.
    pub fn new(kv: KvRepository) -> Self {
        OfflineQueueRepository { kv }
    }

    /// Appends a transaction to the queue. Returns the new queue length.
    pub async fn append(&self, txn: &Transaction) -> StoreResult<usize> {
        let mut queue = self.pending().await?;
        queue.push(txn.clone());
        self.kv.set_json(KEY, &queue).await?;

        debug!(id = %txn.id, queued = queue.len(), "Offline transaction queued");
        Ok(queue.len())
    }

    /// Returns all pending transactions, oldest first.
    pub async fn pending(&self) -> StoreResult<Vec<Transaction>> {
        Ok(self.kv.get_json(KEY).await?.unwrap_or_default())
    }

    /// Returns the number of pending transactions.
    pub async fn count(&self) -> StoreResult<usize> {
        Ok(self.pending().await?.len())
    }

    /// Removes one reconciled transaction by id. Returns whether it existed.
    pub async fn remove(&self, id: &str) -> StoreResult<bool> {
        let mut queue = self.pending().await?;
        let before = queue.len();
        queue.retain(|t| t.id != id);

        if queue.len() == before {
            return Ok(false);
        }

        self.kv.set_json(KEY, &queue).await?;
        Ok(true)
    }

    /// Drops the entire queue.
    pub async fn clear(&self) -> StoreResult<()> {
        self.kv.remove(KEY).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
