//! # tally-store: Persistence Layer for Tally POS
//!
//! This crate provides local persistence for the Tally POS engine.
//! It uses SQLite with a single string-keyed blob table.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally POS Data Flow                              │
//! │                                                                         │
//! │  Checkout engine (commit / offline fallback / audit)                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     tally-store (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │    Store      │    │ Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ offline/audit │    │  (embedded)  │  │   │
//! │  │   │               │    │ daily/terminal│    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ session + kv  │    │ 001_init.sql │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (kv_store table, WAL mode)                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`kv`] - String-keyed blob surface (get/set/remove)
//! - [`repository`] - Typed repositories over the kv surface
//! - [`error`] - Store error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tally_store::{Store, StoreConfig};
//!
//! let store = Store::new(StoreConfig::new("path/to/tally.db")).await?;
//! store.offline_queue().append(&txn).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod kv;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{StoreError, StoreResult};
pub use kv::KvRepository;
pub use pool::{Store, StoreConfig};

// Repository re-exports for convenience
pub use repository::audit::AuditLogRepository;
pub use repository::daily::DailySalesRepository;
pub use repository::offline::OfflineQueueRepository;
pub use repository::session::{OperatorSession, SessionRepository};
pub use repository::terminal::TerminalRepository;
