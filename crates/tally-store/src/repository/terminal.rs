//! # Terminal Id
//!
//! A terminal id identifies the physical/logical checkout station. It is
//! generated once on first use and reused for the life of the install.
//!
//! ## Format
//! `<prefix><3-digit number>`, e.g. `POS-042` for prefix `POS-`.

use tracing::info;

use crate::error::StoreResult;
use crate::kv::KvRepository;

/// Persisted key for the cached terminal id.
const KEY: &str = "terminal_id";

/// Repository for the cached terminal id.
#[derive(Debug, Clone)]
pub struct TerminalRepository {
    kv: KvRepository,
}

impl TerminalRepository {
    /// Creates a new TerminalRepository.
    pub fn new(kv: KvRepository) -> Self {
        TerminalRepository { kv }
    }

    /// Returns the cached terminal id, generating and caching one on
    /// first call.
    pub async fn get_or_generate(&self, prefix: &str) -> StoreResult<String> {
        if let Some(existing) = self.kv.get(KEY).await? {
            return Ok(existing);
        }

        let id = generate_terminal_id(prefix);
        self.kv.set(KEY, &id).await?;
        info!(terminal = %id, "Generated terminal id");
        Ok(id)
    }
}

/// Generates a `<prefix><3-digit number>` terminal id.
///
/// Uniqueness only needs to hold per install, so sub-second clock noise
/// is sufficient entropy.
fn generate_terminal_id(prefix: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    format!("{}{:03}", prefix, nanos % 1000)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Store, StoreConfig};

    #[test]
    fn test_generated_format() {
        let id = generate_terminal_id("POS-");
        assert!(id.starts_with("POS-"));
        assert_eq!(id.len(), "POS-".len() + 3);
        assert!(id["POS-".len()..].chars().all(|c| c.is_ascii_digit()));
    }

    /// Generated once, returned unchanged thereafter.
    #[tokio::test]
    async fn test_cached_across_calls() {
        let store = Store::new(StoreConfig::in_memory()).await.unwrap();
        let terminal = store.terminal();

        let first = terminal.get_or_generate("POS-").await.unwrap();
        let second = terminal.get_or_generate("POS-").await.unwrap();
        // Even a different prefix returns the cached id
        let third = terminal.get_or_generate("TILL-").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first, third);
    }
}
