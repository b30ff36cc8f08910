//! The attestation pipeline: turn observed compass logs into evidence.

use alloy_primitives::U256;
use alloy_rpc_types_eth::{Filter, Log};
use alloy_sol_types::SolEvent;
use courier_evm::compass::LogicCallEvent;
use courier_home::Proof;
use tracing::{debug, info};

use super::{RelayError, Relayer, u256_as_u64};

impl Relayer {
    /// Looks for the next unattested compass event on each chain and posts
    /// evidence for it.
    ///
    /// The home chain tracks the last event nonce it has accepted from this
    /// validator; the event carrying `last + 1` is the only one it will take
    /// next, so the scan stops as soon as that nonce shows up. Newest ranges
    /// are scanned first, which finds fresh events quickly on the happy
    /// path.
    pub async fn attest_messages(&self) -> Result<(), RelayError> {
        for chain in &self.chains {
            let last_nonce = self.home.query_get_last_event_nonce().await?;
            let target = U256::from(last_nonce + 1);

            let filter = Filter::new()
                .address(chain.evm.config().compass_addr())
                .event_signature(LogicCallEvent::SIGNATURE_HASH);

            let mut matched: Option<(LogicCallEvent, Log)> = None;
            chain
                .evm
                .filter_logs(&filter, None, |logs| {
                    for log in logs {
                        let Ok(decoded) = LogicCallEvent::decode_log(&log.inner) else {
                            continue;
                        };
                        if decoded.data.event_nonce == target {
                            matched = Some((decoded.data, log));
                            return true;
                        }
                    }
                    false
                })
                .await?;

            let Some((event, log)) = matched else {
                debug!(
                    chain = %chain.chain_reference_id,
                    last_nonce,
                    "no unattested compass event"
                );
                continue;
            };

            let message_id = u256_as_u64(event.message_id, "message_id")?;
            let proof = Proof::TxProof {
                block_height: log.block_number.unwrap_or_default(),
                tx_hash: log.transaction_hash.unwrap_or_default(),
                log_index: log.log_index.unwrap_or_default(),
            };
            info!(
                chain = %chain.chain_reference_id,
                message_id,
                event_nonce = last_nonce + 1,
                "attesting compass event"
            );
            self.home
                .add_message_evidence(&chain.queue, message_id, proof)
                .await?;
        }
        Ok(())
    }
}
