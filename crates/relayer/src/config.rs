//! Collector configuration

use serde::{Deserialize, Serialize};

use crate::RelayerError;

/// Configuration for the attestation collector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Pool contract the attestations are bound to
    pub pool_address: String,

    /// Valid signatures required before a request is relayed.
    /// Should match the pool's `min_signers`.
    #[serde(default = "default_min_signers")]
    pub min_signers: usize,

    /// Per-validator signing timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl CollectorConfig {
    pub fn new(pool_address: impl Into<String>) -> Self {
        Self {
            pool_address: pool_address.into(),
            min_signers: default_min_signers(),
            timeout_ms: default_timeout_ms(),
        }
    }

    pub fn validate(&self) -> Result<(), RelayerError> {
        if self.pool_address.is_empty() {
            return Err(RelayerError::invalid_config(
                "pool_address",
                "pool address must not be empty",
            ));
        }
        if self.min_signers == 0 {
            return Err(RelayerError::invalid_config(
                "min_signers",
                "min_signers must be greater than 0",
            ));
        }
        if self.timeout_ms == 0 {
            return Err(RelayerError::invalid_config(
                "timeout_ms",
                "timeout_ms must be greater than 0",
            ));
        }
        Ok(())
    }
}

fn default_min_signers() -> usize {
    1
}

fn default_timeout_ms() -> u64 {
    5000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_json() {
        let config: CollectorConfig =
            serde_json::from_str(r#"{"pool_address": "pool"}"#).unwrap();

        assert_eq!(config.pool_address, "pool");
        assert_eq!(config.min_signers, 1);
        assert_eq!(config.timeout_ms, 5000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_zero_values() {
        let mut config = CollectorConfig::new("pool");
        config.min_signers = 0;
        assert!(matches!(
            config.validate(),
            Err(RelayerError::InvalidConfig { ref field, .. }) if field == "min_signers"
        ));

        let mut config = CollectorConfig::new("pool");
        config.timeout_ms = 0;
        assert!(config.validate().is_err());

        assert!(CollectorConfig::new("").validate().is_err());
    }
}
