//! # Typed Repositories
//!
//! Each repository wraps the kv surface with a typed contract for one
//! persisted document.

pub mod audit;
pub mod daily;
pub mod offline;
pub mod session;
pub mod terminal;
