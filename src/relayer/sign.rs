//! The signing pipeline: pull queued messages, sign, post back in a batch.

use courier_home::BroadcastMessageSignatureIn;
use tracing::debug;

use super::{RelayError, Relayer};

impl Relayer {
    /// Signs everything the home chain has queued for this validator and
    /// posts the signatures in one batched transaction per chain. A failure
    /// anywhere aborts the whole tick; the home chain re-serves unsigned
    /// messages on the next one.
    pub async fn sign_messages(&self) -> Result<(), RelayError> {
        for chain in &self.chains {
            let messages = self.home.query_messages_for_signing(&chain.queue).await?;
            if messages.is_empty() {
                continue;
            }

            let _guard = self.lock.hold().await;
            let mut signatures = Vec::with_capacity(messages.len());
            for message in messages {
                let signature = chain.evm.sign_message_bytes(&message.bytes_to_sign).await?;
                debug!(
                    queue = %chain.queue,
                    id = message.id,
                    signing_addr = %chain.evm.address(),
                    "signed queued message"
                );
                signatures.push(BroadcastMessageSignatureIn {
                    id: message.id,
                    queue_type_name: chain.queue.clone(),
                    signature,
                    signed_by_address: chain.evm.address().to_checksum(None),
                });
            }
            self.home.broadcast_message_signatures(signatures).await?;
        }
        Ok(())
    }
}
