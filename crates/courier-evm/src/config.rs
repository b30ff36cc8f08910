use alloy_primitives::Address;
use courier_types::ChainReferenceId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

use crate::error::EvmError;

/// Configuration for one external EVM chain.
#[derive(Debug, Clone)]
pub struct EvmChainConfig {
    pub chain_reference_id: ChainReferenceId,
    pub inner: EvmChainConfigInner,
}

impl EvmChainConfig {
    pub fn chain_reference_id(&self) -> &ChainReferenceId {
        &self.chain_reference_id
    }
    pub fn chain_id(&self) -> u64 {
        self.inner.chain_id
    }
    pub fn base_rpc_url(&self) -> &Url {
        &self.inner.base_rpc_url
    }
    pub fn signing_key(&self) -> &str {
        &self.inner.signing_key
    }
    pub fn keyring_dir(&self) -> &PathBuf {
        &self.inner.keyring_dir
    }
    pub fn gas_adjustment(&self) -> f64 {
        self.inner.gas_adjustment
    }
    pub fn tx_type(&self) -> u8 {
        self.inner.tx_type
    }
    pub fn compass_addr(&self) -> Address {
        self.inner.compass_addr
    }
    pub fn mev_rpc_url(&self) -> Option<&Url> {
        self.inner.mev_rpc_url.as_ref()
    }
    pub fn chain_family(&self) -> ChainFamily {
        self.inner.chain_family
    }

    /// Resolves the keyring passphrase from the configured environment
    /// variable. The password itself never appears in config files.
    pub fn keyring_password(&self) -> Result<String, EvmError> {
        std::env::var(&self.inner.keyring_pass_env_name)
            .map_err(|_| EvmError::MissingKeyringPassword(self.inner.keyring_pass_env_name.clone()))
    }
}

/// The per-chain block of the relayer's JSON configuration. The chain
/// reference id is the enclosing map key, not part of this block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvmChainConfigInner {
    /// Numeric EVM chain id used for signing.
    pub chain_id: u64,
    /// Base JSON-RPC endpoint.
    pub base_rpc_url: Url,
    /// 20-byte hex address of the signing account.
    pub signing_key: String,
    /// Directory holding the keystore JSON files.
    pub keyring_dir: PathBuf,
    /// Name of the environment variable holding the keyring passphrase.
    pub keyring_pass_env_name: String,
    /// Multiplier applied to the suggested gas price for legacy transactions.
    #[serde(default = "evm_chain_config::default_gas_adjustment")]
    pub gas_adjustment: f64,
    /// 0 for legacy pricing, 2 for EIP-1559.
    #[serde(default = "evm_chain_config::default_tx_type")]
    pub tx_type: u8,
    /// Address of the compass contract on this chain.
    pub compass_addr: Address,
    /// Private-orderflow relay endpoint; unset disables MEV routing.
    #[serde(default)]
    pub mev_rpc_url: Option<Url>,
    /// Block-provider family; Arbitrum chains need the header shim.
    #[serde(default)]
    pub chain_family: ChainFamily,
}

mod evm_chain_config {
    pub fn default_gas_adjustment() -> f64 {
        1.0
    }
    pub fn default_tx_type() -> u8 {
        0
    }
}

/// How the chain serves block headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainFamily {
    #[default]
    Canonical,
    Arbitrum,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_config_parses_with_defaults() {
        let json = r#"{
            "chain_id": 1,
            "base_rpc_url": "http://localhost:8545",
            "signing_key": "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf",
            "keyring_dir": "/var/keys",
            "keyring_pass_env_name": "ETH_PASSWORD",
            "compass_addr": "0x0000000000000000000000000000000000000001"
        }"#;
        let inner: EvmChainConfigInner = serde_json::from_str(json).unwrap();
        assert_eq!(inner.gas_adjustment, 1.0);
        assert_eq!(inner.tx_type, 0);
        assert_eq!(inner.chain_family, ChainFamily::Canonical);
        assert!(inner.mev_rpc_url.is_none());
    }

    #[test]
    fn chain_family_parses_from_snake_case() {
        let inner: ChainFamily = serde_json::from_str("\"arbitrum\"").unwrap();
        assert_eq!(inner, ChainFamily::Arbitrum);
    }
}
