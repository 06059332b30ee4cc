//! Session configuration.
//!
//! Can be read from a JSON file:
//!
//! ```json
//! {
//!   "chainId": 1001,
//!   "pollBalanceInterval": 2000,
//!   "pollBlockNumberInterval": 5000,
//!   "connectors": { "injected": { "timeout": 5 } }
//! }
//! ```
//!
//! Every field is optional. Connector entries in the file are config-only;
//! custom connectors are registered through the session builder.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use klaywallet_connectors::ConnectorEntry;
use klaywallet_protocol::WalletError;
use klaywallet_protocol::constants::{
    DEFAULT_CHAIN_ID, DEFAULT_POLL_BALANCE_INTERVAL, DEFAULT_POLL_BLOCK_NUMBER_INTERVAL,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Errors from reading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Wallet session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WalletConfig {
    /// Chain the session connects to.
    pub chain_id: u64,
    /// Balance polling delay, in milliseconds.
    pub poll_balance_interval: u64,
    /// Block number polling delay, in milliseconds.
    pub poll_block_number_interval: u64,
    /// Per-connector configuration objects, keyed by connector id.
    pub connectors: BTreeMap<String, Value>,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            chain_id: DEFAULT_CHAIN_ID,
            poll_balance_interval: DEFAULT_POLL_BALANCE_INTERVAL.as_millis() as u64,
            poll_block_number_interval: DEFAULT_POLL_BLOCK_NUMBER_INTERVAL.as_millis() as u64,
            connectors: BTreeMap::new(),
        }
    }
}

impl WalletConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads a configuration file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&content)?;
        tracing::debug!(path = %path.display(), chain_id = config.chain_id, "config loaded");
        Ok(config)
    }

    pub fn balance_interval(&self) -> Duration {
        Duration::from_millis(self.poll_balance_interval)
    }

    pub fn block_number_interval(&self) -> Duration {
        Duration::from_millis(self.poll_block_number_interval)
    }

    /// Checks the values a session cannot run with.
    pub fn validate(&self) -> Result<(), WalletError> {
        if self.chain_id == 0 {
            return Err(WalletError::SessionConfig("chainId must be non-zero".into()));
        }
        if self.poll_balance_interval == 0 {
            return Err(WalletError::SessionConfig(
                "pollBalanceInterval must be non-zero".into(),
            ));
        }
        if self.poll_block_number_interval == 0 {
            return Err(WalletError::SessionConfig(
                "pollBlockNumberInterval must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// The file's connector configs as registry entries.
    pub fn connector_entries(&self) -> Result<Vec<(String, ConnectorEntry)>, WalletError> {
        self.connectors
            .iter()
            .map(|(id, value)| match value {
                Value::Object(options) => Ok((id.clone(), ConnectorEntry::from(options.clone()))),
                other => Err(WalletError::ConnectorConfig(format!(
                    "config for connector {id} must be an object, got {other}"
                ))),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = WalletConfig::default();
        assert_eq!(config.chain_id, 8217);
        assert_eq!(config.balance_interval(), Duration::from_millis(2000));
        assert_eq!(config.block_number_interval(), Duration::from_millis(5000));
        assert!(config.connectors.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = WalletConfig::from_json_str(r#"{"chainId": 1001}"#).unwrap();
        assert_eq!(config.chain_id, 1001);
        assert_eq!(config.poll_balance_interval, 2000);
        assert_eq!(config.poll_block_number_interval, 5000);
    }

    #[test]
    fn full_json() {
        let config = WalletConfig::from_json_str(
            r#"{
                "chainId": 1337,
                "pollBalanceInterval": 500,
                "pollBlockNumberInterval": 1000,
                "connectors": {"injected": {"timeout": 5}}
            }"#,
        )
        .unwrap();
        assert_eq!(config.chain_id, 1337);
        assert_eq!(config.balance_interval(), Duration::from_millis(500));
        assert_eq!(config.block_number_interval(), Duration::from_secs(1));

        let entries = config.connector_entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, "injected");
        assert!(matches!(&entries[0].1, ConnectorEntry::Config(c) if c.options["timeout"] == 5));
    }

    #[test]
    fn non_object_connector_config_is_rejected() {
        let config =
            WalletConfig::from_json_str(r#"{"connectors": {"injected": 5}}"#).unwrap();
        assert!(matches!(
            config.connector_entries(),
            Err(WalletError::ConnectorConfig(_))
        ));
    }

    #[test]
    fn zero_intervals_are_invalid() {
        let config = WalletConfig {
            poll_balance_interval: 0,
            ..WalletConfig::default()
        };
        assert!(matches!(config.validate(), Err(WalletError::SessionConfig(_))));

        let config = WalletConfig {
            poll_block_number_interval: 0,
            ..WalletConfig::default()
        };
        assert!(config.validate().is_err());

        let config = WalletConfig {
            chain_id: 0,
            ..WalletConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_json_fails() {
        assert!(matches!(
            WalletConfig::from_json_str("{not json"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn load_missing_file_returns_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let config = WalletConfig::load(&tmp.path().join("wallet.json")).unwrap();
        assert_eq!(config, WalletConfig::default());
    }

    #[test]
    fn load_round_trips_through_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("wallet.json");
        let mut config = WalletConfig {
            chain_id: 1001,
            ..WalletConfig::default()
        };
        config
            .connectors
            .insert("remote-qr".into(), serde_json::json!({"bridge": "wss://bridge"}));
        std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = WalletConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
