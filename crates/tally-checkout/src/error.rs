//! # Checkout Error Type
//!
//! Unified error type for engine operations.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Tally POS                              │
//! │                                                                         │
//! │  CoreError (business rules) ──┐                                        │
//! │  StoreError (persistence) ────┼──► CheckoutError ──► caller            │
//! │  GatewayError (catalog) ──────┘                                        │
//! │                                                                         │
//! │  Submission failures NEVER surface here: submit() is infallible and   │
//! │  resolves every failure to a SubmitOutcome (rejected / offline /       │
//! │  failed), per the error taxonomy.                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::gateway::GatewayError;
use tally_core::CoreError;
use tally_store::StoreError;

/// Engine operation errors.
///
/// Returned from setup and cart/catalog operations; the submission path
/// has its own infallible outcome type.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Business rule violation.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Persistence failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Catalog gateway failure.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Configuration file is malformed or invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for engine operations.
pub type CheckoutResult<T> = Result<T, CheckoutError>;
