//! Shared data model for the courier relayer.
//!
//! These types describe the units of cross-chain work as the home chain hands
//! them out: queued messages awaiting signatures, messages carrying collected
//! signatures and a relay action, validator sets anchored on external chains,
//! and the gravity token-bridge batches. The home-chain transport and the EVM
//! client both speak in terms of this crate.

mod chain_ref;
mod gravity;
mod message;
mod timestamp;

pub use chain_ref::{ChainReferenceId, message_queue_name};
pub use gravity::{BatchConfirm, OutgoingTransferTx, OutgoingTxBatch};
pub use message::{
    ExternalChainInfo, InvalidPubkeyError, MessageAction, MessageWithSignatures, QueuedMessage,
    Valset, ValidatorSignature,
};
pub use timestamp::UnixTimestamp;
