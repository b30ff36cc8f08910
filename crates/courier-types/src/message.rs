use alloy_primitives::{Address, Bytes, keccak256};
use serde::{Deserialize, Serialize};

use crate::chain_ref::ChainReferenceId;

/// A unit of cross-chain work as returned by the home chain's
/// messages-for-signing query.
///
/// `id` is unique within its queue and monotonically non-decreasing in the
/// order the home chain returns messages. The derivation of `bytes_to_sign`
/// is opaque to the relayer; it signs exactly what it is handed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedMessage {
    pub id: u64,
    pub nonce: Bytes,
    pub bytes_to_sign: Bytes,
}

/// A signature collected from one validator over a message's `bytes_to_sign`.
///
/// `val_address` is the validator's operator address on the home chain;
/// `external_account_address` is the key registered for that validator on the
/// target external chain, used to align signatures with valset entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorSignature {
    pub val_address: String,
    pub external_account_address: Address,
    pub signature: Bytes,
}

/// The relay action attached to a message that has gathered enough
/// signatures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageAction {
    /// Execute an arbitrary call through the compass contract.
    SubmitLogicCall {
        logic_contract_address: Address,
        payload: Bytes,
        deadline: u64,
    },
    /// Attest a new validator set on the compass contract.
    UpdateValset { valset: Valset },
}

/// A message ready for relaying: the queued message plus its action and the
/// signatures gathered so far.
///
/// `public_access_data` is set by the home chain once a relayer has reported
/// a transaction hash for the message; `error_data` once a relayer has
/// reported a failure. Either being present means the message is past the
/// relay stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageWithSignatures {
    #[serde(flatten)]
    pub message: QueuedMessage,
    pub action: MessageAction,
    pub signatures: Vec<ValidatorSignature>,
    #[serde(default)]
    pub public_access_data: Option<Bytes>,
    #[serde(default)]
    pub error_data: Option<Bytes>,
}

/// A validator set as registered on an external chain.
///
/// `validators` and `powers` are parallel arrays; `valset_id` is
/// monotonically non-decreasing across updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Valset {
    pub validators: Vec<Address>,
    pub powers: Vec<u64>,
    pub valset_id: u64,
}

/// Error returned when a public key handed to [`ExternalChainInfo::evm`] is
/// not a 64-byte uncompressed secp256k1 point body.
#[derive(Debug, thiserror::Error)]
#[error("expected a 64-byte uncompressed public key, got {0} bytes")]
pub struct InvalidPubkeyError(pub usize);

/// A validator's presence on one external chain, registered with the home
/// chain so that the per-chain validator set is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalChainInfo {
    pub chain_type: String,
    pub chain_reference_id: ChainReferenceId,
    pub address: String,
    pub pubkey: Bytes,
}

impl ExternalChainInfo {
    /// Builds the EVM-flavoured chain info for a public key.
    ///
    /// The address is derived as `keccak256(pubkey)[12..]`, which keeps the
    /// registered address consistent with what the external chain recovers
    /// from this validator's signatures.
    pub fn evm(
        chain_reference_id: ChainReferenceId,
        pubkey: &[u8],
    ) -> Result<Self, InvalidPubkeyError> {
        if pubkey.len() != 64 {
            return Err(InvalidPubkeyError(pubkey.len()));
        }
        let digest = keccak256(pubkey);
        let address = Address::from_slice(&digest[12..]);
        Ok(Self {
            chain_type: "evm".to_owned(),
            chain_reference_id,
            address: address.to_checksum(None),
            pubkey: Bytes::copy_from_slice(pubkey),
        })
    }
}
