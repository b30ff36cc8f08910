use alloy_primitives::{Address, B256};
use std::path::PathBuf;

/// Errors produced by the EVM client.
///
/// The configuration family (`InvalidAddress`, `AddressNotFoundInKeyStore`,
/// `KeystoreUnlock`, `MissingKeyringPassword`, `UnknownContract`) only occurs
/// during [`EvmClient::connect`](crate::EvmClient::connect) and is
/// unrecoverable: callers surface it at startup instead of retrying. The
/// transport family is retried implicitly by the next scheduler tick.
#[derive(Debug, thiserror::Error)]
pub enum EvmError {
    #[error("invalid signing address: {0}")]
    InvalidAddress(String),

    #[error("address {0} not found in keystore at {1:?}")]
    AddressNotFoundInKeyStore(Address, PathBuf),

    #[error("could not unlock keystore account: {0}")]
    KeystoreUnlock(#[source] alloy_signer_local::LocalSignerError),

    #[error("keyring password environment variable {0} is not set")]
    MissingKeyringPassword(String),

    #[error("keystore directory: {0}")]
    KeystoreIo(#[from] std::io::Error),

    #[error("contract {0} is not in the embedded catalogue")]
    UnknownContract(String),

    #[error("method {0} not present in contract abi")]
    UnknownMethod(String),

    #[error("abi encoding: {0}")]
    Encoding(#[from] alloy_dyn_abi::Error),

    #[error("unexpected call output for {0}")]
    BadCallOutput(&'static str),

    #[error(transparent)]
    Transport(#[from] alloy_transport::TransportError),

    #[error("building transaction: {0}")]
    TxBuild(String),

    #[error("signer: {0}")]
    Signer(#[from] alloy_signer::Error),

    #[error("signature must be 65 bytes, got {0}")]
    MalformedSignature(usize),

    #[error("mev relay returned mismatched hash: expected {expected}, got {got}")]
    MevHashMismatch { expected: B256, got: B256 },

    #[error("block {0} not found")]
    BlockNotFound(B256),

    #[error("header for height {0} not available")]
    MissingHeader(u64),

    #[error("starting block is already at or past the requested time")]
    StartingBlockInFuture,

    #[error("no block past the requested time has been generated yet")]
    BlockNotYetGenerated,
}

impl EvmError {
    /// True for configuration errors that must abort startup rather than be
    /// retried on the next tick.
    pub fn is_unrecoverable(&self) -> bool {
        matches!(
            self,
            Self::InvalidAddress(_)
                | Self::AddressNotFoundInKeyStore(_, _)
                | Self::KeystoreUnlock(_)
                | Self::MissingKeyringPassword(_)
                | Self::UnknownContract(_)
        )
    }
}
