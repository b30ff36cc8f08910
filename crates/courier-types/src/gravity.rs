use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

/// One transfer inside an outgoing token batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingTransferTx {
    pub id: u64,
    pub sender: String,
    pub dest_address: Address,
    pub amount: U256,
}

/// A batch of token transfers the home chain wants executed on an external
/// chain.
///
/// `bytes_to_sign` is the batch checkpoint digest; validators sign it the
/// same way they sign queued messages. `batch_timeout` is the external-chain
/// block height after which the batch must not be submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingTxBatch {
    pub batch_nonce: u64,
    pub token_contract: Address,
    pub batch_timeout: u64,
    pub transactions: Vec<OutgoingTransferTx>,
    pub bytes_to_sign: Bytes,
}

/// A validator's recorded confirmation of an outgoing batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfirm {
    pub eth_signer: Address,
    pub signature: Bytes,
}
