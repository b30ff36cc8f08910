use std::sync::Arc;

use alloy_primitives::{Address, Bytes};
use async_trait::async_trait;
use courier_types::{
    BatchConfirm, ChainReferenceId, ExternalChainInfo, MessageWithSignatures, OutgoingTxBatch,
    QueuedMessage, Valset,
};
use tracing::debug;

use crate::error::HomeError;
use crate::msgs::{
    HomeMsg, MsgAddExternalChainInfoForValidator, MsgAddMessagesSignatures, MsgAddEvidence,
    MsgBatchSendToEthClaim, MsgConfirmBatch, MsgKeepAlive, MsgSendToPalomaClaim, MsgSetErrorData,
    MsgSetPublicAccessData, Proof,
};

/// Result of a successfully broadcast home-chain transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxResponse {
    pub txhash: String,
    pub height: i64,
}

/// Transaction broadcast seam. The concrete implementation signs the message
/// with the validator's home-chain key and submits it over gRPC.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send_msg(&self, msg: HomeMsg, memo: &str) -> Result<TxResponse, HomeError>;
}

/// Query seam over the home chain's gRPC services.
#[async_trait]
pub trait HomeQuerier: Send + Sync {
    async fn query_messages_for_signing(
        &self,
        queue: &str,
        valoper: &str,
    ) -> Result<Vec<QueuedMessage>, HomeError>;

    async fn query_messages_in_queue(
        &self,
        queue: &str,
    ) -> Result<Vec<MessageWithSignatures>, HomeError>;

    async fn query_validator_info(&self) -> Result<Vec<ExternalChainInfo>, HomeError>;

    async fn query_get_evm_valset_by_id(
        &self,
        id: u64,
        chain_reference_id: &ChainReferenceId,
    ) -> Result<Valset, HomeError>;

    async fn query_get_last_event_nonce(&self, orchestrator: &str) -> Result<u64, HomeError>;

    async fn query_batch_request_by_nonce(
        &self,
        nonce: u64,
        contract: Address,
    ) -> Result<OutgoingTxBatch, HomeError>;

    async fn query_pending_batches_for_signing(
        &self,
        orchestrator: &str,
        chain_reference_id: &ChainReferenceId,
    ) -> Result<Vec<OutgoingTxBatch>, HomeError>;

    async fn query_unrelayed_batches(
        &self,
        chain_reference_id: &ChainReferenceId,
    ) -> Result<Vec<OutgoingTxBatch>, HomeError>;

    async fn query_batch_confirms(
        &self,
        nonce: u64,
        contract: Address,
    ) -> Result<Vec<BatchConfirm>, HomeError>;

    /// `Ok(())` means the validator is bonded and may act.
    async fn is_staking(&self) -> Result<(), HomeError>;
}

/// A signature ready for broadcast, keyed by its queue and message id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastMessageSignatureIn {
    pub id: u64,
    pub queue_type_name: String,
    pub signature: Bytes,
    pub signed_by_address: String,
}

/// The logic layer above the home-chain transport.
///
/// Owns the validator's identity (`creator` account address and
/// `creator_valoper` operator address) and turns relayer intents into the
/// exact messages the chain expects.
#[derive(Clone)]
pub struct HomeClient {
    querier: Arc<dyn HomeQuerier>,
    sender: Arc<dyn MessageSender>,
    creator: String,
    creator_valoper: String,
}

impl HomeClient {
    pub fn new(
        querier: Arc<dyn HomeQuerier>,
        sender: Arc<dyn MessageSender>,
        creator: impl Into<String>,
        creator_valoper: impl Into<String>,
    ) -> Self {
        Self {
            querier,
            sender,
            creator: creator.into(),
            creator_valoper: creator_valoper.into(),
        }
    }

    pub fn creator(&self) -> &str {
        &self.creator
    }

    pub fn creator_valoper(&self) -> &str {
        &self.creator_valoper
    }

    pub async fn query_messages_for_signing(
        &self,
        queue: &str,
    ) -> Result<Vec<QueuedMessage>, HomeError> {
        self.querier
            .query_messages_for_signing(queue, &self.creator_valoper)
            .await
    }

    pub async fn query_messages_in_queue(
        &self,
        queue: &str,
    ) -> Result<Vec<MessageWithSignatures>, HomeError> {
        self.querier.query_messages_in_queue(queue).await
    }

    pub async fn query_validator_info(&self) -> Result<Vec<ExternalChainInfo>, HomeError> {
        self.querier.query_validator_info().await
    }

    pub async fn query_get_evm_valset_by_id(
        &self,
        id: u64,
        chain_reference_id: &ChainReferenceId,
    ) -> Result<Valset, HomeError> {
        self.querier
            .query_get_evm_valset_by_id(id, chain_reference_id)
            .await
    }

    pub async fn query_get_last_event_nonce(&self) -> Result<u64, HomeError> {
        self.querier.query_get_last_event_nonce(&self.creator).await
    }

    pub async fn query_batch_request_by_nonce(
        &self,
        nonce: u64,
        contract: Address,
    ) -> Result<OutgoingTxBatch, HomeError> {
        self.querier.query_batch_request_by_nonce(nonce, contract).await
    }

    pub async fn query_pending_batches_for_signing(
        &self,
        chain_reference_id: &ChainReferenceId,
    ) -> Result<Vec<OutgoingTxBatch>, HomeError> {
        self.querier
            .query_pending_batches_for_signing(&self.creator, chain_reference_id)
            .await
    }

    pub async fn query_unrelayed_batches(
        &self,
        chain_reference_id: &ChainReferenceId,
    ) -> Result<Vec<OutgoingTxBatch>, HomeError> {
        self.querier.query_unrelayed_batches(chain_reference_id).await
    }

    pub async fn query_batch_confirms(
        &self,
        nonce: u64,
        contract: Address,
    ) -> Result<Vec<BatchConfirm>, HomeError> {
        self.querier.query_batch_confirms(nonce, contract).await
    }

    pub async fn is_staking(&self) -> Result<(), HomeError> {
        self.querier.is_staking().await
    }

    /// Posts all signatures in a single batched transaction. Does nothing
    /// when there is nothing to post.
    pub async fn broadcast_message_signatures(
        &self,
        signatures: Vec<BroadcastMessageSignatureIn>,
    ) -> Result<(), HomeError> {
        if signatures.is_empty() {
            return Ok(());
        }
        let signed_messages = signatures
            .into_iter()
            .map(|s| crate::msgs::ConsensusMessageSignature {
                id: s.id,
                queue_type_name: s.queue_type_name,
                signature: s.signature,
                signed_by_address: s.signed_by_address,
            })
            .collect();
        let msg = HomeMsg::AddMessagesSignatures(MsgAddMessagesSignatures {
            creator: self.creator.clone(),
            signed_messages,
        });
        self.sender.send_msg(msg, "").await?;
        Ok(())
    }

    /// Announces liveness with the running daemon version.
    pub async fn keep_validator_alive(&self, version: &str) -> Result<(), HomeError> {
        let msg = HomeMsg::KeepAlive(MsgKeepAlive {
            creator: self.creator.clone(),
            pigeon_version: version.to_owned(),
        });
        self.sender.send_msg(msg, "").await?;
        Ok(())
    }

    /// Registers external-chain presences. A no-op on empty input so that an
    /// unchanged registration never reaches the transport.
    pub async fn add_external_chain_info(
        &self,
        chain_infos: Vec<ExternalChainInfo>,
    ) -> Result<(), HomeError> {
        if chain_infos.is_empty() {
            return Ok(());
        }
        debug!(count = chain_infos.len(), "registering external chain info");
        let msg = HomeMsg::AddExternalChainInfoForValidator(MsgAddExternalChainInfoForValidator {
            creator: self.creator.clone(),
            chain_infos,
        });
        self.sender.send_msg(msg, "").await?;
        Ok(())
    }

    pub async fn add_message_evidence(
        &self,
        queue: &str,
        message_id: u64,
        proof: Proof,
    ) -> Result<(), HomeError> {
        let msg = HomeMsg::AddEvidence(MsgAddEvidence {
            creator: self.creator.clone(),
            queue_type_name: queue.to_owned(),
            message_id,
            proof,
        });
        self.sender.send_msg(msg, "").await?;
        Ok(())
    }

    pub async fn set_public_access_data(
        &self,
        queue: &str,
        message_id: u64,
        data: Bytes,
    ) -> Result<(), HomeError> {
        let msg = HomeMsg::SetPublicAccessData(MsgSetPublicAccessData {
            creator: self.creator.clone(),
            queue_type_name: queue.to_owned(),
            message_id,
            data,
        });
        self.sender.send_msg(msg, "").await?;
        Ok(())
    }

    pub async fn set_error_data(
        &self,
        queue: &str,
        message_id: u64,
        data: Bytes,
    ) -> Result<(), HomeError> {
        let msg = HomeMsg::SetErrorData(MsgSetErrorData {
            creator: self.creator.clone(),
            queue_type_name: queue.to_owned(),
            message_id,
            data,
        });
        self.sender.send_msg(msg, "").await?;
        Ok(())
    }

    pub async fn confirm_batch(&self, mut msg: MsgConfirmBatch) -> Result<(), HomeError> {
        msg.orchestrator = self.creator.clone();
        self.sender.send_msg(HomeMsg::ConfirmBatch(msg), "").await?;
        Ok(())
    }

    pub async fn send_batch_send_to_evm_claim(
        &self,
        mut claim: MsgBatchSendToEthClaim,
    ) -> Result<(), HomeError> {
        claim.orchestrator = self.creator.clone();
        self.sender
            .send_msg(HomeMsg::BatchSendToEthClaim(claim), "")
            .await?;
        Ok(())
    }

    pub async fn send_send_to_paloma_claim(
        &self,
        mut claim: MsgSendToPalomaClaim,
    ) -> Result<(), HomeError> {
        claim.orchestrator = self.creator.clone();
        self.sender
            .send_msg(HomeMsg::SendToPalomaClaim(claim), "")
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_types::ChainReferenceId;
    use std::sync::Mutex;

    struct RecordingSender {
        sent: Mutex<Vec<(HomeMsg, String)>>,
        fail: bool,
    }

    impl RecordingSender {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
                fail: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
                fail: true,
            })
        }

        fn sent(&self) -> Vec<(HomeMsg, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MessageSender for RecordingSender {
        async fn send_msg(&self, msg: HomeMsg, memo: &str) -> Result<TxResponse, HomeError> {
            if self.fail {
                return Err(HomeError::transport(std::io::Error::other("sample error")));
            }
            self.sent.lock().unwrap().push((msg, memo.to_owned()));
            Ok(TxResponse {
                txhash: "AA00".to_owned(),
                height: 1,
            })
        }
    }

    struct UnusedQuerier;

    #[async_trait]
    impl HomeQuerier for UnusedQuerier {
        async fn query_messages_for_signing(
            &self,
            _: &str,
            _: &str,
        ) -> Result<Vec<QueuedMessage>, HomeError> {
            unreachable!("test does not query")
        }
        async fn query_messages_in_queue(
            &self,
            _: &str,
        ) -> Result<Vec<MessageWithSignatures>, HomeError> {
            unreachable!("test does not query")
        }
        async fn query_validator_info(&self) -> Result<Vec<ExternalChainInfo>, HomeError> {
            unreachable!("test does not query")
        }
        async fn query_get_evm_valset_by_id(
            &self,
            _: u64,
            _: &ChainReferenceId,
        ) -> Result<Valset, HomeError> {
            unreachable!("test does not query")
        }
        async fn query_get_last_event_nonce(&self, _: &str) -> Result<u64, HomeError> {
            unreachable!("test does not query")
        }
        async fn query_batch_request_by_nonce(
            &self,
            _: u64,
            _: Address,
        ) -> Result<OutgoingTxBatch, HomeError> {
            unreachable!("test does not query")
        }
        async fn query_pending_batches_for_signing(
            &self,
            _: &str,
            _: &ChainReferenceId,
        ) -> Result<Vec<OutgoingTxBatch>, HomeError> {
            unreachable!("test does not query")
        }
        async fn query_unrelayed_batches(
            &self,
            _: &ChainReferenceId,
        ) -> Result<Vec<OutgoingTxBatch>, HomeError> {
            unreachable!("test does not query")
        }
        async fn query_batch_confirms(
            &self,
            _: u64,
            _: Address,
        ) -> Result<Vec<BatchConfirm>, HomeError> {
            unreachable!("test does not query")
        }
        async fn is_staking(&self) -> Result<(), HomeError> {
            unreachable!("test does not query")
        }
    }

    fn client_with(sender: Arc<RecordingSender>) -> HomeClient {
        HomeClient::new(Arc::new(UnusedQuerier), sender, "bob", "bobvaloper")
    }

    #[tokio::test]
    async fn keep_alive_sends_versioned_message() {
        let sender = RecordingSender::new();
        let client = client_with(sender.clone());

        client.keep_validator_alive("v1.3.0").await.unwrap();

        let sent = sender.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].0,
            HomeMsg::KeepAlive(MsgKeepAlive {
                creator: "bob".to_owned(),
                pigeon_version: "v1.3.0".to_owned(),
            })
        );
        assert_eq!(sent[0].1, "");
    }

    #[tokio::test]
    async fn keep_alive_surfaces_transport_error() {
        let sender = RecordingSender::failing();
        let client = client_with(sender);

        let err = client.keep_validator_alive("v1.3.0").await.unwrap_err();
        assert!(matches!(err, HomeError::Transport(_)));
    }

    #[tokio::test]
    async fn empty_chain_info_never_reaches_transport() {
        // A failing sender proves nothing is sent: no error, no recording.
        let sender = RecordingSender::failing();
        let client = client_with(sender);

        client.add_external_chain_info(Vec::new()).await.unwrap();
    }

    #[tokio::test]
    async fn chain_infos_are_sent_in_one_message() {
        let sender = RecordingSender::new();
        let client = client_with(sender.clone());

        let infos = vec![
            ExternalChainInfo {
                chain_type: "evm".to_owned(),
                chain_reference_id: ChainReferenceId::new("chain1"),
                address: "addr1".to_owned(),
                pubkey: Bytes::from_static(b"pk1"),
            },
            ExternalChainInfo {
                chain_type: "evm".to_owned(),
                chain_reference_id: ChainReferenceId::new("chain2"),
                address: "addr2".to_owned(),
                pubkey: Bytes::from_static(b"pk2"),
            },
        ];
        client.add_external_chain_info(infos.clone()).await.unwrap();

        let sent = sender.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].0,
            HomeMsg::AddExternalChainInfoForValidator(MsgAddExternalChainInfoForValidator {
                creator: "bob".to_owned(),
                chain_infos: infos,
            })
        );
    }

    #[tokio::test]
    async fn no_signatures_means_no_broadcast() {
        let sender = RecordingSender::failing();
        let client = client_with(sender);

        client.broadcast_message_signatures(Vec::new()).await.unwrap();
    }

    #[tokio::test]
    async fn signatures_are_batched_into_one_message() {
        let sender = RecordingSender::new();
        let client = client_with(sender.clone());

        client
            .broadcast_message_signatures(vec![
                BroadcastMessageSignatureIn {
                    id: 123,
                    queue_type_name: "abc".to_owned(),
                    signature: Bytes::from_static(b"sig-123"),
                    signed_by_address: "0xaa".to_owned(),
                },
                BroadcastMessageSignatureIn {
                    id: 456,
                    queue_type_name: "def".to_owned(),
                    signature: Bytes::from_static(b"sig-789"),
                    signed_by_address: "0xaa".to_owned(),
                },
            ])
            .await
            .unwrap();

        let sent = sender.sent();
        assert_eq!(sent.len(), 1);
        let HomeMsg::AddMessagesSignatures(msg) = &sent[0].0 else {
            panic!("expected AddMessagesSignatures, got {:?}", sent[0].0);
        };
        assert_eq!(msg.creator, "bob");
        assert_eq!(msg.signed_messages.len(), 2);
        assert_eq!(msg.signed_messages[0].id, 123);
        assert_eq!(msg.signed_messages[0].queue_type_name, "abc");
        assert_eq!(msg.signed_messages[1].id, 456);
        assert_eq!(msg.signed_messages[1].queue_type_name, "def");
    }

    #[tokio::test]
    async fn broadcast_error_surfaces() {
        let sender = RecordingSender::failing();
        let client = client_with(sender);

        let err = client
            .broadcast_message_signatures(vec![BroadcastMessageSignatureIn {
                id: 1,
                queue_type_name: "q".to_owned(),
                signature: Bytes::new(),
                signed_by_address: String::new(),
            }])
            .await
            .unwrap_err();
        assert!(matches!(err, HomeError::Transport(_)));
    }
}
