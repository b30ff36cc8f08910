//! Lifecycle chores: external-chain registration refresh.

use courier_types::ExternalChainInfo;
use tracing::{debug, info};

use super::{RelayError, Relayer};

impl Relayer {
    /// Re-registers this validator's EVM identities with the home chain
    /// whenever the registration is missing or stale. An up-to-date
    /// registration sends nothing.
    pub async fn update_external_chain_infos(&self) -> Result<(), RelayError> {
        let registered = self.home.query_validator_info().await?;

        let mut stale = Vec::new();
        for chain in &self.chains {
            let info = ExternalChainInfo::evm(
                chain.chain_reference_id.clone(),
                &chain.evm.uncompressed_pubkey(),
            )?;
            let up_to_date = registered.iter().any(|existing| {
                existing.chain_type == info.chain_type
                    && existing.chain_reference_id == info.chain_reference_id
                    && existing.address == info.address
                    && existing.pubkey == info.pubkey
            });
            if up_to_date {
                debug!(chain = %chain.chain_reference_id, "chain info already registered");
            } else {
                info!(
                    chain = %chain.chain_reference_id,
                    address = %info.address,
                    "registering chain info"
                );
                stale.push(info);
            }
        }

        // Empty input is a no-op inside the client; nothing hits the wire.
        self.home.add_external_chain_info(stale).await?;
        Ok(())
    }
}
