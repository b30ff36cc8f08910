//! The relay pipeline: execute approved messages on their target chains.

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Bytes, U256};
use courier_evm::{compass, contracts};
use courier_types::{MessageAction, MessageWithSignatures};
use tracing::{debug, warn};

use super::{ChainPipeline, RelayError, Relayer, u256_as_u64};

impl Relayer {
    /// Relays every message that has gathered enough signatures and has not
    /// yet been executed. One message failing is recorded against that
    /// message and does not block the rest of the queue.
    pub async fn relay_messages(&self) -> Result<(), RelayError> {
        for chain in &self.chains {
            let messages = self.home.query_messages_in_queue(&chain.queue).await?;
            for message in messages {
                // Either datum present means the message is past relaying;
                // the home chain will garbage-collect it after attestation.
                if message.public_access_data.is_some() || message.error_data.is_some() {
                    continue;
                }
                if let Err(err) = self.relay_one(chain, &message).await {
                    warn!(
                        queue = %chain.queue,
                        id = message.message.id,
                        error = %err,
                        "relaying message failed"
                    );
                    let _ = self
                        .home
                        .set_error_data(
                            &chain.queue,
                            message.message.id,
                            Bytes::from(err.to_string().into_bytes()),
                        )
                        .await;
                }
            }
        }
        Ok(())
    }

    async fn relay_one(
        &self,
        chain: &ChainPipeline,
        message: &MessageWithSignatures,
    ) -> Result<(), RelayError> {
        let compass_addr = chain.evm.config().compass_addr();
        let valset_id = chain.evm.last_valset_id(compass_addr).await?;
        let valset = self
            .home
            .query_get_evm_valset_by_id(
                u256_as_u64(valset_id, "last_valset_id")?,
                &chain.chain_reference_id,
            )
            .await?;
        let consensus = compass::consensus_arg(&valset, &message.signatures)?;

        let (method, args) = match &message.action {
            MessageAction::SubmitLogicCall {
                logic_contract_address,
                payload,
                deadline,
            } => (
                "submit_logic_call",
                vec![
                    consensus,
                    DynSolValue::Tuple(vec![
                        DynSolValue::Address(*logic_contract_address),
                        DynSolValue::Bytes(payload.to_vec()),
                    ]),
                    DynSolValue::Uint(U256::from(message.message.id), 256),
                    DynSolValue::Uint(U256::from(*deadline), 256),
                ],
            ),
            MessageAction::UpdateValset { valset: new_valset } => (
                "update_valset",
                vec![consensus, compass::valset_arg(new_valset)],
            ),
        };
        debug!(
            queue = %chain.queue,
            id = message.message.id,
            method,
            "relaying message"
        );

        let stored = contracts::contract("compass")?;
        let use_mev = chain.evm.config().mev_rpc_url().is_some();
        let _guard = self.lock.hold().await;
        let tx = chain
            .evm
            .execute_smart_contract(
                chain.evm.config().chain_id(),
                &stored.abi,
                compass_addr,
                use_mev,
                method,
                &args,
            )
            .await?;

        self.home
            .set_public_access_data(
                &chain.queue,
                message.message.id,
                Bytes::copy_from_slice(tx.tx_hash().as_slice()),
            )
            .await?;
        Ok(())
    }
}
