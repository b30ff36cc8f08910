use alloy_json_abi::JsonAbi;
use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::error::EvmError;

/// An embedded contract descriptor: the parsed ABI plus the raw artefact
/// bytes for callers that need to re-serialize it.
#[derive(Debug)]
pub struct StoredContract {
    pub abi: JsonAbi,
    pub source: &'static str,
}

// Keep sample.json: the catalogue tests decode against it.
static EMBEDDED: &[(&str, &str)] = &[
    ("compass", include_str!("../contracts/compass.json")),
    ("sample", include_str!("../contracts/sample.json")),
];

static CATALOGUE: Lazy<HashMap<&'static str, StoredContract>> = Lazy::new(|| {
    EMBEDDED
        .iter()
        .map(|&(name, source)| {
            let abi: JsonAbi = serde_json::from_str(source)
                .unwrap_or_else(|e| panic!("embedded contract {name} is corrupt: {e}"));
            (name, StoredContract { abi, source })
        })
        .collect()
});

/// The full embedded catalogue, parsed once on first use. Corrupt artefacts
/// abort the process; the catalogue is static configuration and a bad entry
/// means a bad build.
pub fn stored_contracts() -> &'static HashMap<&'static str, StoredContract> {
    &CATALOGUE
}

/// Looks a contract up by its file stem.
pub fn contract(name: &str) -> Result<&'static StoredContract, EvmError> {
    stored_contracts()
        .get(name)
        .ok_or_else(|| EvmError::UnknownContract(name.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_contains_compass() {
        let compass = contract("compass").unwrap();
        assert!(compass.abi.functions.contains_key("submit_logic_call"));
        assert!(compass.abi.functions.contains_key("update_valset"));
        assert!(compass.abi.functions.contains_key("submit_batch"));
        assert!(compass.abi.functions.contains_key("last_valset_id"));
    }

    #[test]
    fn unknown_contract_is_a_config_error() {
        let err = contract("nope").unwrap_err();
        assert!(err.is_unrecoverable());
    }

    #[test]
    fn sample_contract_parses() {
        let sample = contract("sample").unwrap();
        assert!(sample.abi.functions.contains_key("store_value"));
        assert!(!sample.source.is_empty());
    }
}
