//! Relayer configuration.
//!
//! A single JSON document: relayer-level settings plus a map of
//! chain-reference-id to per-chain EVM configuration. Keyring passphrases
//! are never part of the file; each chain names the environment variable
//! holding its passphrase.

use courier_evm::{EvmChainConfig, EvmChainConfigInner};
use courier_types::ChainReferenceId;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level configuration document.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub relayer: RelayerSettings,
    pub chains: BTreeMap<ChainReferenceId, EvmChainConfigInner>,
}

/// Relayer-level knobs.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayerSettings {
    /// Period of the foreground keep-alive loop, in seconds.
    #[serde(default = "relayer_settings::default_keep_alive_loop_timeout_secs")]
    pub keep_alive_loop_timeout_secs: u64,
}

impl Default for RelayerSettings {
    fn default() -> Self {
        Self {
            keep_alive_loop_timeout_secs:
                relayer_settings::default_keep_alive_loop_timeout_secs(),
        }
    }
}

mod relayer_settings {
    pub fn default_keep_alive_loop_timeout_secs() -> u64 {
        10
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file at {0}: {1}")]
    FileRead(PathBuf, std::io::Error),
    #[error("failed to parse config file: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl Config {
    /// Loads the configuration document from a JSON file.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_path_buf(), e))?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// The per-chain configurations with their map keys folded in.
    pub fn chain_configs(&self) -> Vec<EvmChainConfig> {
        self.chains
            .iter()
            .map(|(chain_reference_id, inner)| EvmChainConfig {
                chain_reference_id: chain_reference_id.clone(),
                inner: inner.clone(),
            })
            .collect()
    }
}
