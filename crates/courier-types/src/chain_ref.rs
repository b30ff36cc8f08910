use serde::{Deserialize, Serialize};
use std::fmt;

/// The home chain's name for an external chain, e.g. `eth-main` or `bnb-main`.
///
/// This is not the numeric EVM chain id: the same numeric id can in principle
/// be registered under several reference ids (forks, test deployments). Queue
/// names and validator registrations are keyed by this reference.
///
/// Serializes as a plain string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainReferenceId(String);

impl ChainReferenceId {
    pub fn new<S: Into<String>>(s: S) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChainReferenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChainReferenceId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Builds the name of a message queue scoped to an EVM chain.
///
/// Queues on the home chain are named `evm/{chain_reference_id}/{suffix}`,
/// where the suffix identifies the message family handled by the queue.
pub fn message_queue_name(chain_reference_id: &ChainReferenceId, suffix: &str) -> String {
    format!("evm/{chain_reference_id}/{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_name_is_scoped_by_chain_reference() {
        let chain = ChainReferenceId::new("eth-main");
        assert_eq!(
            message_queue_name(&chain, "evm-compass-message"),
            "evm/eth-main/evm-compass-message"
        );
    }

    #[test]
    fn chain_reference_serializes_as_string() {
        let chain = ChainReferenceId::new("bnb-main");
        assert_eq!(serde_json::to_string(&chain).unwrap(), "\"bnb-main\"");
        let back: ChainReferenceId = serde_json::from_str("\"bnb-main\"").unwrap();
        assert_eq!(back, chain);
    }
}
