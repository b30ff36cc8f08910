use alloy_primitives::{Address, B256, Bytes, U256};
use courier_types::{ChainReferenceId, ExternalChainInfo};
use serde::{Deserialize, Serialize};

/// One signature over one queued message, as carried inside
/// [`MsgAddMessagesSignatures`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusMessageSignature {
    pub id: u64,
    pub queue_type_name: String,
    pub signature: Bytes,
    pub signed_by_address: String,
}

/// Posts a batch of message signatures in one transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgAddMessagesSignatures {
    pub creator: String,
    pub signed_messages: Vec<ConsensusMessageSignature>,
}

/// Registers (or refreshes) this validator's presence on external chains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgAddExternalChainInfoForValidator {
    pub creator: String,
    pub chain_infos: Vec<ExternalChainInfo>,
}

/// Liveness announcement carrying the relayer's version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgKeepAlive {
    pub creator: String,
    pub pigeon_version: String,
}

/// Evidence that an external-chain event backing a message was observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Proof {
    TxProof {
        block_height: u64,
        tx_hash: B256,
        log_index: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgAddEvidence {
    pub creator: String,
    pub queue_type_name: String,
    pub message_id: u64,
    pub proof: Proof,
}

/// Records the transaction hash (or other public data) produced by relaying
/// a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgSetPublicAccessData {
    pub creator: String,
    pub queue_type_name: String,
    pub message_id: u64,
    pub data: Bytes,
}

/// Records a relay failure against a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgSetErrorData {
    pub creator: String,
    pub queue_type_name: String,
    pub message_id: u64,
    pub data: Bytes,
}

/// A validator's confirmation of an outgoing token batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgConfirmBatch {
    pub orchestrator: String,
    pub nonce: u64,
    pub token_contract: Address,
    pub eth_signer: Address,
    pub signature: Bytes,
}

/// Claim that a token batch was executed on the external chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgBatchSendToEthClaim {
    pub orchestrator: String,
    pub chain_reference_id: ChainReferenceId,
    pub event_nonce: u64,
    pub block_height: u64,
    pub batch_nonce: u64,
    pub token_contract: Address,
}

/// Claim that tokens were deposited on the external chain for bridging to
/// the home chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgSendToPalomaClaim {
    pub orchestrator: String,
    pub chain_reference_id: ChainReferenceId,
    pub event_nonce: u64,
    pub block_height: u64,
    pub token_contract: Address,
    pub ethereum_sender: Address,
    pub receiver: String,
    pub amount: U256,
}

/// The typed union of every home-chain transaction the relayer submits.
///
/// Stands in for the chain's proto message set; the transport behind
/// [`MessageSender`](crate::MessageSender) encodes each variant into the
/// corresponding wire message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "msg", rename_all = "snake_case")]
pub enum HomeMsg {
    AddMessagesSignatures(MsgAddMessagesSignatures),
    AddExternalChainInfoForValidator(MsgAddExternalChainInfoForValidator),
    KeepAlive(MsgKeepAlive),
    AddEvidence(MsgAddEvidence),
    SetPublicAccessData(MsgSetPublicAccessData),
    SetErrorData(MsgSetErrorData),
    ConfirmBatch(MsgConfirmBatch),
    BatchSendToEthClaim(MsgBatchSendToEthClaim),
    SendToPalomaClaim(MsgSendToPalomaClaim),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keep_alive_carries_the_version_field() {
        let msg = HomeMsg::KeepAlive(MsgKeepAlive {
            creator: "bob".to_owned(),
            pigeon_version: "v1.3.0".to_owned(),
        });
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"msg\":\"keep_alive\""));
        assert!(json.contains("\"pigeon_version\":\"v1.3.0\""));
        let back: HomeMsg = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn tx_proof_round_trips() {
        let msg = HomeMsg::AddEvidence(MsgAddEvidence {
            creator: "bob".to_owned(),
            queue_type_name: "evm/eth-main/evm-compass-message".to_owned(),
            message_id: 77,
            proof: Proof::TxProof {
                block_height: 1234,
                tx_hash: B256::repeat_byte(5),
                log_index: 2,
            },
        });
        let json = serde_json::to_string(&msg).unwrap();
        let back: HomeMsg = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }
}
