//! # Operator Session Snapshot
//!
//! The signed-in operator, persisted so a terminal restart resumes the
//! same session. Stored by value: no live object references.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tally_core::Actor;

use crate::error::StoreResult;
use crate::kv::KvRepository;

/// Persisted key for the operator session snapshot.
const KEY: &str = "operator_session";

/// The currently signed-in operator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorSession {
    pub actor: Actor,
    /// Display name printed on receipts.
    pub cashier: String,
    pub logged_in_at: DateTime<Utc>,
}

/// Repository for the operator session snapshot.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    kv: KvRepository,
}

impl SessionRepository {
    /// Creates a new SessionRepository.
    pub fn new(kv: KvRepository) -> Self {
        SessionRepository { kv }
    }

    /// Saves the session snapshot.
    pub async fn save(&self, session: &OperatorSession) -> StoreResult<()> {
        self.kv.set_json(KEY, session).await
    }

    /// Loads the session snapshot, if any.
    pub async fn load(&self) -> StoreResult<Option<OperatorSession>> {
        self.kv.get_json(KEY).await
    }

    /// Clears the session snapshot (logout).
    pub async fn clear(&self) -> StoreResult<()> {
        self.kv.remove(KEY).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Store, StoreConfig};

    #[tokio::test]
    async fn test_save_load_clear() {
        let store = Store::new(StoreConfig::in_memory()).await.unwrap();
        let sessions = store.session();

        assert!(sessions.load().await.unwrap().is_none());

        let session = OperatorSession {
            actor: Actor {
                tenant: "store-001".to_string(),
                user: "amina".to_string(),
                role: "cashier".to_string(),
            },
            cashier: "Amina".to_string(),
            logged_in_at: Utc::now(),
        };
        sessions.save(&session).await.unwrap();

        let loaded = sessions.load().await.unwrap().unwrap();
        assert_eq!(loaded.cashier, "Amina");
        assert_eq!(loaded.actor.role, "cashier");

        sessions.clear().await.unwrap();
        assert!(sessions.load().await.unwrap().is_none());
    }
}
