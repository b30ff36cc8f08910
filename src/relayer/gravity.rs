//! The gravity token-bridge pipelines.
//!
//! Same signing and scanning primitives as the message pipelines, applied
//! to outgoing token batches and the two compass deposit/withdrawal events.
//! Claims must arrive in event-nonce order, so each watcher hunts for
//! exactly `last_event_nonce + 1` and leaves later events for later ticks.

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::U256;
use alloy_rpc_types_eth::Filter;
use alloy_sol_types::SolEvent;
use courier_evm::compass::{self, BatchSendEvent, SendToPalomaEvent};
use courier_evm::contracts;
use courier_home::{MsgBatchSendToEthClaim, MsgConfirmBatch, MsgSendToPalomaClaim};
use courier_types::{OutgoingTxBatch, ValidatorSignature};
use tracing::{debug, info, warn};

use super::{ChainPipeline, RelayError, Relayer, u256_as_u64};

impl Relayer {
    /// Signs every outgoing batch awaiting this validator's confirmation.
    pub async fn gravity_sign_batches(&self) -> Result<(), RelayError> {
        for chain in &self.chains {
            let batches = self
                .home
                .query_pending_batches_for_signing(&chain.chain_reference_id)
                .await?;
            if batches.is_empty() {
                continue;
            }

            let _guard = self.lock.hold().await;
            for batch in batches {
                let signature = chain.evm.sign_message_bytes(&batch.bytes_to_sign).await?;
                debug!(
                    chain = %chain.chain_reference_id,
                    batch_nonce = batch.batch_nonce,
                    "confirming outgoing batch"
                );
                self.home
                    .confirm_batch(MsgConfirmBatch {
                        orchestrator: String::new(),
                        nonce: batch.batch_nonce,
                        token_contract: batch.token_contract,
                        eth_signer: chain.evm.address(),
                        signature,
                    })
                    .await?;
            }
        }
        Ok(())
    }

    /// Submits fully-confirmed batches to their target chains.
    pub async fn gravity_relay_batches(&self) -> Result<(), RelayError> {
        for chain in &self.chains {
            let batches = self
                .home
                .query_unrelayed_batches(&chain.chain_reference_id)
                .await?;
            for batch in batches {
                if let Err(err) = self.relay_batch(chain, &batch).await {
                    warn!(
                        chain = %chain.chain_reference_id,
                        batch_nonce = batch.batch_nonce,
                        error = %err,
                        "relaying batch failed"
                    );
                }
            }
        }
        Ok(())
    }

    async fn relay_batch(
        &self,
        chain: &ChainPipeline,
        batch: &OutgoingTxBatch,
    ) -> Result<(), RelayError> {
        let head = chain.evm.find_current_block_number().await?;
        if U256::from(batch.batch_timeout) <= head {
            debug!(
                chain = %chain.chain_reference_id,
                batch_nonce = batch.batch_nonce,
                "batch past its timeout height, skipping"
            );
            return Ok(());
        }

        let compass_addr = chain.evm.config().compass_addr();
        let valset_id = chain.evm.last_valset_id(compass_addr).await?;
        let valset = self
            .home
            .query_get_evm_valset_by_id(
                u256_as_u64(valset_id, "last_valset_id")?,
                &chain.chain_reference_id,
            )
            .await?;
        let confirms = self
            .home
            .query_batch_confirms(batch.batch_nonce, batch.token_contract)
            .await?;
        let signatures: Vec<ValidatorSignature> = confirms
            .into_iter()
            .map(|confirm| ValidatorSignature {
                val_address: String::new(),
                external_account_address: confirm.eth_signer,
                signature: confirm.signature,
            })
            .collect();
        let consensus = compass::consensus_arg(&valset, &signatures)?;

        let receivers = DynSolValue::Array(
            batch
                .transactions
                .iter()
                .map(|tx| DynSolValue::Address(tx.dest_address))
                .collect(),
        );
        let amounts = DynSolValue::Array(
            batch
                .transactions
                .iter()
                .map(|tx| DynSolValue::Uint(tx.amount, 256))
                .collect(),
        );
        let args = vec![
            consensus,
            DynSolValue::Address(batch.token_contract),
            DynSolValue::Tuple(vec![receivers, amounts]),
            DynSolValue::Uint(U256::from(batch.batch_nonce), 256),
            DynSolValue::Uint(U256::from(batch.batch_timeout), 256),
        ];

        let stored = contracts::contract("compass")?;
        let use_mev = chain.evm.config().mev_rpc_url().is_some();
        let _guard = self.lock.hold().await;
        chain
            .evm
            .execute_smart_contract(
                chain.evm.config().chain_id(),
                &stored.abi,
                compass_addr,
                use_mev,
                "submit_batch",
                &args,
            )
            .await?;
        Ok(())
    }

    /// Watches for the next `BatchSendEvent` and claims it.
    pub async fn gravity_handle_batch_send_event(&self) -> Result<(), RelayError> {
        for chain in &self.chains {
            let last_nonce = self.home.query_get_last_event_nonce().await?;
            let target = U256::from(last_nonce + 1);

            let filter = Filter::new()
                .address(chain.evm.config().compass_addr())
                .event_signature(BatchSendEvent::SIGNATURE_HASH);
            let mut matched = None;
            chain
                .evm
                .filter_logs(&filter, None, |logs| {
                    for log in logs {
                        let Ok(decoded) = BatchSendEvent::decode_log(&log.inner) else {
                            continue;
                        };
                        if decoded.data.event_nonce == target {
                            matched =
                                Some((decoded.data, log.block_number.unwrap_or_default()));
                            return true;
                        }
                    }
                    false
                })
                .await?;

            let Some((event, block_height)) = matched else {
                continue;
            };
            // The event only carries nonces; the batch itself is fetched
            // back from the home chain so the claim matches its records.
            let batch = self
                .home
                .query_batch_request_by_nonce(
                    u256_as_u64(event.batch_nonce, "batch_nonce")?,
                    event.token,
                )
                .await?;
            info!(
                chain = %chain.chain_reference_id,
                batch_nonce = batch.batch_nonce,
                event_nonce = last_nonce + 1,
                "claiming executed batch"
            );
            self.home
                .send_batch_send_to_evm_claim(MsgBatchSendToEthClaim {
                    orchestrator: String::new(),
                    chain_reference_id: chain.chain_reference_id.clone(),
                    event_nonce: last_nonce + 1,
                    block_height,
                    batch_nonce: batch.batch_nonce,
                    token_contract: batch.token_contract,
                })
                .await?;
        }
        Ok(())
    }

    /// Watches for the next `SendToPalomaEvent` and claims the deposit.
    pub async fn gravity_handle_send_to_paloma_event(&self) -> Result<(), RelayError> {
        for chain in &self.chains {
            let last_nonce = self.home.query_get_last_event_nonce().await?;
            let target = U256::from(last_nonce + 1);

            let filter = Filter::new()
                .address(chain.evm.config().compass_addr())
                .event_signature(SendToPalomaEvent::SIGNATURE_HASH);
            let mut matched = None;
            chain
                .evm
                .filter_logs(&filter, None, |logs| {
                    for log in logs {
                        let Ok(decoded) = SendToPalomaEvent::decode_log(&log.inner) else {
                            continue;
                        };
                        if decoded.data.event_nonce == target {
                            matched =
                                Some((decoded.data, log.block_number.unwrap_or_default()));
                            return true;
                        }
                    }
                    false
                })
                .await?;

            let Some((event, block_height)) = matched else {
                continue;
            };
            info!(
                chain = %chain.chain_reference_id,
                token = %event.token,
                event_nonce = last_nonce + 1,
                "claiming deposit"
            );
            self.home
                .send_send_to_paloma_claim(MsgSendToPalomaClaim {
                    orchestrator: String::new(),
                    chain_reference_id: chain.chain_reference_id.clone(),
                    event_nonce: last_nonce + 1,
                    block_height,
                    token_contract: event.token,
                    ethereum_sender: event.sender,
                    receiver: event.receiver.clone(),
                    amount: event.amount,
                })
                .await?;
        }
        Ok(())
    }
}
