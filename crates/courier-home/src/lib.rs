//! Home-chain client for the courier relayer.
//!
//! The home chain owns the message queues, the validator set, and the
//! attestation records. This crate models its messages as a typed union
//! ([`HomeMsg`]) and talks to it through two seams: [`MessageSender`] for
//! transaction broadcast and [`HomeQuerier`] for queries. The concrete gRPC
//! plumbing behind those traits lives outside this repository; [`HomeClient`]
//! implements everything above the transport: batching, no-op guards, and
//! message construction.

mod client;
mod error;
mod msgs;

pub use client::{BroadcastMessageSignatureIn, HomeClient, HomeQuerier, MessageSender, TxResponse};
pub use error::HomeError;
pub use msgs::{
    ConsensusMessageSignature, HomeMsg, MsgAddExternalChainInfoForValidator,
    MsgAddMessagesSignatures, MsgAddEvidence, MsgBatchSendToEthClaim, MsgConfirmBatch,
    MsgKeepAlive, MsgSendToPalomaClaim, MsgSetErrorData, MsgSetPublicAccessData, Proof,
};
