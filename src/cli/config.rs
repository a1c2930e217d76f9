// CLI Configuration - Convert CLI args to node config
// Principle: Clear mapping between user input and internal configuration

use crate::cli::RunCmd;
use crate::consensus::EpochSchedule;
use std::path::PathBuf;

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid registry key '{key}': {reason}")]
    InvalidRegistryKey { key: String, reason: String },

    #[error("Invalid epoch interval: {0}")]
    InvalidEpochInterval(i64),
}

/// Complete node configuration derived from CLI arguments
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Base data path for the persistent network identity
    pub base_path: PathBuf,
    /// Node name for logs
    pub name: String,
    /// P2P listen port
    pub listen_port: u16,
    /// Bootstrap node multiaddrs
    pub bootnodes: Vec<String>,
    /// Registry participant public keys
    pub registry_keys: Vec<Vec<u8>>,
    /// Epoch timing
    pub epochs: EpochSchedule,
}

impl NodeConfig {
    /// Create configuration from the CLI run command.
    pub fn from_run_cmd(cmd: &RunCmd) -> Result<Self, ConfigError> {
        if cmd.epoch_interval <= 0 {
            return Err(ConfigError::InvalidEpochInterval(cmd.epoch_interval));
        }

        let mut registry_keys = Vec::with_capacity(cmd.registry_keys.len());
        for key in &cmd.registry_keys {
            let bytes = hex::decode(key).map_err(|e| ConfigError::InvalidRegistryKey {
                key: key.clone(),
                reason: e.to_string(),
            })?;
            if bytes.len() != 32 {
                return Err(ConfigError::InvalidRegistryKey {
                    key: key.clone(),
                    reason: format!("expected 32 bytes, got {}", bytes.len()),
                });
            }
            registry_keys.push(bytes);
        }

        let initial_timestamp = cmd
            .initial_timestamp
            .unwrap_or_else(|| chrono::Utc::now().timestamp());

        let base_path = cmd.base_path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("bdns")
        });

        Ok(Self {
            base_path,
            name: cmd.name.clone().unwrap_or_else(|| "bdns-node".to_string()),
            listen_port: cmd.port,
            bootnodes: cmd.bootnodes.clone(),
            registry_keys,
            epochs: EpochSchedule::new(initial_timestamp, cmd.epoch_interval),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_cmd() -> RunCmd {
        RunCmd {
            base_path: None,
            name: None,
            port: 30333,
            bootnodes: vec![],
            registry_keys: vec![],
            initial_timestamp: Some(1_000),
            epoch_interval: 3600,
        }
    }

    #[test]
    fn parses_hex_registry_keys() {
        let mut cmd = run_cmd();
        cmd.registry_keys = vec![hex::encode([7u8; 32])];

        let config = NodeConfig::from_run_cmd(&cmd).unwrap();
        assert_eq!(config.registry_keys, vec![vec![7u8; 32]]);
        assert_eq!(config.epochs.initial_timestamp, 1_000);
    }

    #[test]
    fn rejects_short_registry_key() {
        let mut cmd = run_cmd();
        cmd.registry_keys = vec!["abcd".to_string()];
        assert!(matches!(
            NodeConfig::from_run_cmd(&cmd),
            Err(ConfigError::InvalidRegistryKey { .. })
        ));
    }

    #[test]
    fn rejects_non_positive_epoch_interval() {
        let mut cmd = run_cmd();
        cmd.epoch_interval = 0;
        assert!(matches!(
            NodeConfig::from_run_cmd(&cmd),
            Err(ConfigError::InvalidEpochInterval(0))
        ));
    }
}
