use alloy_consensus::TxEnvelope;
use alloy_eips::eip2718::Encodable2718;
use alloy_primitives::{B256, Bytes};
use alloy_rpc_client::RpcClient;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::error::EvmError;

/// A private-orderflow endpoint accepting signed transactions out-of-band
/// from the public mempool.
///
/// The relay must echo back the hash of the transaction it accepted; any
/// other hash means it relayed something else and the submission is treated
/// as failed.
#[async_trait]
pub trait MevRelay: Send + Sync {
    async fn relay(&self, chain_id: u64, tx: &TxEnvelope) -> Result<B256, EvmError>;

    /// Liveness probe, driven by the scheduler at [`Self::health_probe_interval`].
    async fn keep_alive(&self) -> Result<(), EvmError>;

    fn health_probe_interval(&self) -> Duration;
}

/// Checks the relay's echo against the locally computed hash.
pub fn ensure_relayed_hash(expected: B256, got: B256) -> Result<(), EvmError> {
    if expected == got {
        Ok(())
    } else {
        Err(EvmError::MevHashMismatch { expected, got })
    }
}

/// JSON-RPC MEV relay speaking `eth_sendPrivateRawTransaction`.
pub struct HttpMevRelay {
    client: RpcClient,
    health_probe_interval: Duration,
}

impl HttpMevRelay {
    const DEFAULT_HEALTH_PROBE_INTERVAL: Duration = Duration::from_secs(10);

    pub fn new(url: Url) -> Self {
        Self {
            client: RpcClient::new_http(url),
            health_probe_interval: Self::DEFAULT_HEALTH_PROBE_INTERVAL,
        }
    }
}

#[async_trait]
impl MevRelay for HttpMevRelay {
    async fn relay(&self, chain_id: u64, tx: &TxEnvelope) -> Result<B256, EvmError> {
        let raw = Bytes::from(tx.encoded_2718());
        let hash: B256 = self
            .client
            .request("eth_sendPrivateRawTransaction", (raw,))
            .await?;
        debug!(chain_id, relay_hash = %hash, "submitted transaction to mev relay");
        Ok(hash)
    }

    async fn keep_alive(&self) -> Result<(), EvmError> {
        let _: bool = self.client.request("net_listening", ()).await?;
        Ok(())
    }

    fn health_probe_interval(&self) -> Duration {
        self.health_probe_interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::b256;

    #[test]
    fn matching_hash_passes() {
        let h = b256!("00000000000000000000000000000000000000000000000000000000000000aa");
        assert!(ensure_relayed_hash(h, h).is_ok());
    }

    #[test]
    fn mismatched_hash_is_an_error() {
        let expected =
            b256!("00000000000000000000000000000000000000000000000000000000000000aa");
        let got = b256!("00000000000000000000000000000000000000000000000000000000000000bb");
        let err = ensure_relayed_hash(expected, got).unwrap_err();
        match err {
            EvmError::MevHashMismatch { expected: e, got: g } => {
                assert_eq!(e, expected);
                assert_eq!(g, got);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
