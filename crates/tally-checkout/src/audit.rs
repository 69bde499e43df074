//! # Audit Logger
//!
//! Structured audit logging for everything that happens on a terminal.
//!
//! ## Never Throws
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Audit Logging Contract                               │
//! │                                                                         │
//! │  logger.transaction(&txn).await   ← returns (), always                 │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  append to capped store ── Err? ──► tracing::warn!, swallowed          │
//! │                                                                         │
//! │  A failing log write must NEVER block a sale. The log is evidence,     │
//! │  not a dependency.                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Safely callable before a session is established: entries fall back to
//! the `system` actor until [`AuditLogger::set_actor`] is called.

use std::sync::RwLock;

use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use tally_core::{Actor, LogCategory, LogEntry, LogSeverity, LogSource, Transaction, TransactionStatus};
use tally_store::{AuditLogRepository, StoreResult};

/// Component tag stamped into every entry's source metadata.
const COMPONENT: &str = "tally-checkout";

/// Audit logger over the capped log store.
pub struct AuditLogger {
    repository: AuditLogRepository,
    terminal: String,
    retention: usize,
    actor: RwLock<Actor>,
}

impl AuditLogger {
    /// Creates a logger. Until an actor is set, entries are attributed
    /// to the `system` identity.
    pub fn new(repository: AuditLogRepository, terminal: impl Into<String>, retention: usize) -> Self {
        AuditLogger {
            repository,
            terminal: terminal.into(),
            retention,
            actor: RwLock::new(Actor::system()),
        }
    }

    /// Sets the acting identity for subsequent entries.
    pub fn set_actor(&self, actor: Actor) {
        *self.actor.write().expect("actor lock poisoned") = actor;
    }

    /// Reverts to the `system` identity.
    pub fn clear_actor(&self) {
        self.set_actor(Actor::system());
    }

    /// Appends one entry. Persistence failures are swallowed.
    pub async fn log(
        &self,
        action: impl Into<String>,
        description: impl Into<String>,
        category: LogCategory,
        severity: LogSeverity,
    ) {
        let entry = LogEntry {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            actor: self.actor.read().expect("actor lock poisoned").clone(),
            action: action.into(),
            description: description.into(),
            category,
            severity,
            source: LogSource {
                terminal: self.terminal.clone(),
                component: COMPONENT.to_string(),
            },
        };

        if let Err(e) = self.try_append(entry).await {
            warn!(error = %e, "Audit log append failed; entry dropped");
        }
    }

    async fn try_append(&self, entry: LogEntry) -> StoreResult<()> {
        self.repository.append(entry, self.retention).await
    }

    // =========================================================================
    // Convenience Wrappers
    // =========================================================================

    /// Records a login and switches the acting identity.
    pub async fn login(&self, actor: Actor) {
        self.set_actor(actor.clone());
        self.log(
            "login",
            format!("{} ({}) signed in", actor.user, actor.role),
            LogCategory::Login,
            LogSeverity::Info,
        )
        .await;
    }

    /// Records a logout and reverts to the `system` identity.
    pub async fn logout(&self) {
        let user = self.actor.read().expect("actor lock poisoned").user.clone();
        self.log(
            "logout",
            format!("{} signed out", user),
            LogCategory::Logout,
            LogSeverity::Info,
        )
        .await;
        self.clear_actor();
    }

    /// Records a finalized transaction. Offline captures are logged at
    /// warning severity so reconciliation backlogs stand out.
    pub async fn transaction(&self, txn: &Transaction) {
        let (action, severity) = match txn.status {
            TransactionStatus::Committed => ("transaction_committed", LogSeverity::Info),
            TransactionStatus::OfflinePending => ("transaction_offline", LogSeverity::Warning),
        };
        self.log(
            action,
            format!(
                "Receipt {} for {} cents ({})",
                txn.receipt_number, txn.total_cents, txn.payment_method
            ),
            LogCategory::Transaction,
            severity,
        )
        .await;
    }

    /// Records an inventory-affecting event.
    pub async fn inventory_change(&self, description: impl Into<String>) {
        self.log("inventory_change", description, LogCategory::Inventory, LogSeverity::Info)
            .await;
    }

    /// Records a security-relevant event.
    pub async fn security(&self, description: impl Into<String>) {
        self.log("security_event", description, LogCategory::Security, LogSeverity::Warning)
            .await;
    }

    /// Records an API call outcome; severity derives from the status code
    /// (≥400 error, ≥300 warning, else info).
    pub async fn api_call(&self, endpoint: &str, status: u16) {
        self.log(
            "api_call",
            format!("{} -> {}", endpoint, status),
            LogCategory::Api,
            LogSeverity::from_status_code(status),
        )
        .await;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
