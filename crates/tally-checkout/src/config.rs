//! # Engine Configuration
//!
//! Configuration management for the checkout engine.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Explicit path (highest priority)                                   │
//! │     TALLY_CONFIG=/etc/tally/engine.toml                                │
//! │                                                                         │
//! │  2. Platform config dir                                                │
//! │     ~/.config/tally-pos/engine.toml (Linux)                            │
//! │     ~/Library/Application Support/com.tally.pos/engine.toml (macOS)    │
//! │                                                                         │
//! │  3. Default values (lowest priority)                                   │
//! │     15% VAT, POS- terminal prefix, 3 retries, 30s refresh              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # engine.toml
//! default_vat_rate_bps = 1500
//! terminal_prefix = "POS-"
//! refresh_interval_secs = 30
//! audit_retention = 10000
//! receipt_width = 42
//!
//! [profile]
//! name = "Corner Grocer"
//! address_lines = ["12 Harbor Road", "Green Point"]
//! phone = "+27 21 555 0100"
//! email = "tills@cornergrocer.example"
//! vat_registration = "VAT-4550011223"
//! commercial_registration = "CR-2019-118822"
//! currency_symbol = "R "
//! policy_lines = ["Exchanges within 7 days with receipt."]
//!
//! [retry]
//! max_attempts = 3
//! backoff_base_ms = 1000
//! ```

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use tally_core::validation::validate_tax_rate_bps;
use tally_core::{StoreProfile, TaxRate, DEFAULT_AUDIT_RETENTION, DEFAULT_VAT_RATE_BPS};

use crate::error::{CheckoutError, CheckoutResult};
use crate::retry::RetryPolicy;

/// Environment variable overriding the config file location.
const CONFIG_ENV: &str = "TALLY_CONFIG";

/// Config file name under the platform config directory.
const CONFIG_FILE: &str = "engine.toml";

// =============================================================================
// Retry Configuration
// =============================================================================

/// Commit retry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts before giving up (default 3).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay; attempt N sleeps N × base (default 1000ms).
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    1000
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
        }
    }
}

// =============================================================================
// Engine Configuration
// =============================================================================

/// Configuration for the checkout engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckoutConfig {
    /// Store identity printed on receipts.
    pub profile: StoreProfile,

    /// Default VAT rate for products without their own rate.
    pub default_vat_rate_bps: u32,

    /// Terminal id prefix; the generated id is `<prefix><3-digit number>`.
    pub terminal_prefix: String,

    /// Audit log retention (entries kept).
    pub audit_retention: usize,

    /// Commit retry settings.
    pub retry: RetryConfig,

    /// Background refresh interval in seconds.
    pub refresh_interval_secs: u64,

    /// Print width for text receipts.
    pub receipt_width: usize,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        CheckoutConfig {
            profile: StoreProfile::default(),
            default_vat_rate_bps: DEFAULT_VAT_RATE_BPS,
            terminal_prefix: "POS-".to_string(),
            audit_retention: DEFAULT_AUDIT_RETENTION,
            retry: RetryConfig::default(),
            refresh_interval_secs: 30,
            receipt_width: 42,
        }
    }
}

impl CheckoutConfig {
    /// Loads configuration from the resolved path, falling back to
    /// defaults when no file exists.
    pub fn load() -> CheckoutResult<Self> {
        let Some(path) = Self::resolve_path() else {
            info!("No config directory available, using defaults");
            return Ok(Self::default());
        };

        if !path.exists() {
            info!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Loads configuration from an explicit file path.
    pub fn load_from(path: &std::path::Path) -> CheckoutResult<Self> {
        debug!(path = %path.display(), "Loading engine config");

        let raw = std::fs::read_to_string(path)
            .map_err(|e| CheckoutError::InvalidConfig(format!("read {}: {}", path.display(), e)))?;
        let config: CheckoutConfig = toml::from_str(&raw)
            .map_err(|e| CheckoutError::InvalidConfig(format!("parse {}: {}", path.display(), e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Writes the configuration to the resolved path.
    pub fn save(&self) -> CheckoutResult<()> {
        let path = Self::resolve_path()
            .ok_or_else(|| CheckoutError::InvalidConfig("no config directory available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| CheckoutError::InvalidConfig(format!("create {}: {}", parent.display(), e)))?;
        }

        let raw = toml::to_string_pretty(self)
            .map_err(|e| CheckoutError::InvalidConfig(e.to_string()))?;
        std::fs::write(&path, raw)
            .map_err(|e| CheckoutError::InvalidConfig(format!("write {}: {}", path.display(), e)))?;

        info!(path = %path.display(), "Saved engine config");
        Ok(())
    }

    /// `TALLY_CONFIG` override, else the platform config directory.
    fn resolve_path() -> Option<PathBuf> {
        if let Ok(explicit) = std::env::var(CONFIG_ENV) {
            return Some(PathBuf::from(explicit));
        }

        ProjectDirs::from("com", "tally", "tally-pos")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    fn validate(&self) -> CheckoutResult<()> {
        validate_tax_rate_bps(self.default_vat_rate_bps)
            .map_err(|e| CheckoutError::InvalidConfig(e.to_string()))?;

        if self.terminal_prefix.is_empty() {
            return Err(CheckoutError::InvalidConfig(
                "terminal_prefix must not be empty".into(),
            ));
        }

        if self.audit_retention == 0 {
            return Err(CheckoutError::InvalidConfig(
                "audit_retention must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// The default VAT rate as a typed rate.
    pub fn default_tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.default_vat_rate_bps)
    }

    /// The commit retry policy (linear backoff).
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::linear(
            self.retry.max_attempts,
            Duration::from_millis(self.retry.backoff_base_ms),
        )
    }

    /// The background refresh interval.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CheckoutConfig::default();
        assert_eq!(config.default_vat_rate_bps, 1500);
        assert_eq!(config.terminal_prefix, "POS-");
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.backoff_base_ms, 1000);
        assert_eq!(config.refresh_interval_secs, 30);
        assert_eq!(config.audit_retention, 10_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: CheckoutConfig = toml::from_str(
            r#"
            default_vat_rate_bps = 825

            [profile]
            name = "Corner Grocer"
            "#,
        )
        .unwrap();

        assert_eq!(config.default_vat_rate_bps, 825);
        assert_eq!(config.profile.name, "Corner Grocer");
        // Everything else defaulted
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.terminal_prefix, "POS-");
    }

    #[test]
    fn test_invalid_rate_rejected() {
        let config = CheckoutConfig {
            default_vat_rate_bps: 20_000,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_retry_policy_shape() {
        let config = CheckoutConfig::default();
        let policy = config.retry_policy();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!((policy.backoff)(2), Duration::from_millis(2000));
    }

    #[test]
    fn test_roundtrip_through_toml() {
        let config = CheckoutConfig::default();
        let raw = toml::to_string_pretty(&config).unwrap();
        let back: CheckoutConfig = toml::from_str(&raw).unwrap();
        assert_eq!(back.default_vat_rate_bps, config.default_vat_rate_bps);
        assert_eq!(back.profile.name, config.profile.name);
    }
}
