//! Engine configuration
//!
//! Every field has a default, so a TOML file only needs the keys it changes:
//!
//! ```toml
//! enforce_gating = true
//!
//! [ledger_cache]
//! capacity = 5000
//! ttl_secs = 60
//!
//! [log]
//! filter = "journey_engine=debug,info"
//! json = true
//! ```

use crate::error::JourneyError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Journey engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Refuse to open locked steps
    pub enforce_gating: bool,
    /// Bootstrap the first step for users without ledger records
    pub bootstrap_on_start: bool,
    /// Ledger snapshot cache
    pub ledger_cache: LedgerCacheConfig,
    /// Tracing output
    pub log: LogConfig,
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a TOML document
    ///
    /// # Errors
    /// - `JourneyError::Config` on malformed TOML or invalid values
    pub fn from_toml_str(source: &str) -> Result<Self, JourneyError> {
        let config: Self = toml::from_str(source).map_err(|e| JourneyError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML
    ///
    /// # Errors
    /// - `JourneyError::Config` if serialization fails
    pub fn to_toml_string(&self) -> Result<String, JourneyError> {
        toml::to_string(self).map_err(|e| JourneyError::Config(e.to_string()))
    }

    /// Check value ranges
    ///
    /// # Errors
    /// - `JourneyError::Config` naming the offending key
    pub fn validate(&self) -> Result<(), JourneyError> {
        if self.ledger_cache.enabled && self.ledger_cache.capacity == 0 {
            return Err(JourneyError::Config(
                "ledger_cache.capacity must be positive when the cache is enabled".into(),
            ));
        }
        if self.log.filter.trim().is_empty() {
            return Err(JourneyError::Config("log.filter must not be empty".into()));
        }
        Ok(())
    }

    /// With gating enforcement
    #[inline]
    #[must_use]
    pub fn with_enforce_gating(mut self, enforce: bool) -> Self {
        self.enforce_gating = enforce;
        self
    }

    /// With bootstrap on first read
    #[inline]
    #[must_use]
    pub fn with_bootstrap_on_start(mut self, bootstrap: bool) -> Self {
        self.bootstrap_on_start = bootstrap;
        self
    }

    /// With ledger cache settings
    #[inline]
    #[must_use]
    pub fn with_ledger_cache(mut self, cache: LedgerCacheConfig) -> Self {
        self.ledger_cache = cache;
        self
    }

    /// Without ledger cache
    #[inline]
    #[must_use]
    pub fn without_ledger_cache(mut self) -> Self {
        self.ledger_cache.enabled = false;
        self
    }

    /// With tracing settings
    #[inline]
    #[must_use]
    pub fn with_log(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enforce_gating: true,
            bootstrap_on_start: true,
            ledger_cache: LedgerCacheConfig::default(),
            log: LogConfig::default(),
        }
    }
}

/// Ledger snapshot cache settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerCacheConfig {
    /// Wrap the ledger in a snapshot cache
    pub enabled: bool,
    /// Maximum cached users
    pub capacity: u64,
    /// Snapshot lifetime in seconds
    pub ttl_secs: u64,
}

impl LedgerCacheConfig {
    /// Snapshot lifetime
    #[inline]
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for LedgerCacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: 10_000,
            ttl_secs: 300,
        }
    }
}

/// Tracing output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub filter: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".into(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_document_is_default() {
        assert_eq!(EngineConfig::from_toml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn partial_document_overrides_keys() {
        let config = EngineConfig::from_toml_str(
            r#"
            enforce_gating = false

            [ledger_cache]
            ttl_secs = 30

            [log]
            json = true
            "#,
        )
        .unwrap();

        assert!(!config.enforce_gating);
        assert!(config.bootstrap_on_start);
        assert_eq!(config.ledger_cache.ttl(), Duration::from_secs(30));
        assert_eq!(config.ledger_cache.capacity, 10_000);
        assert!(config.log.json);
        assert_eq!(config.log.filter, "info");
    }

    #[test]
    fn zero_capacity_cache_rejected() {
        let err = EngineConfig::from_toml_str("[ledger_cache]\ncapacity = 0").unwrap_err();
        assert!(matches!(err, JourneyError::Config(msg) if msg.contains("capacity")));

        // Fine once the cache is off
        assert!(EngineConfig::from_toml_str("[ledger_cache]\ncapacity = 0\nenabled = false").is_ok());
    }

    #[test]
    fn malformed_toml_is_config_error() {
        let err = EngineConfig::from_toml_str("enforce_gating = maybe").unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn toml_round_trip() {
        let config = EngineConfig::new().with_enforce_gating(false).without_ledger_cache();
        let text = config.to_toml_string().unwrap();
        assert_eq!(EngineConfig::from_toml_str(&text).unwrap(), config);
    }
}
