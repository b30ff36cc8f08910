use alloy_primitives::Address;
use alloy_signer_local::PrivateKeySigner;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::EvmError;

/// The only field of a keystore JSON we need before deciding to decrypt it.
#[derive(Deserialize)]
struct KeystoreEnvelope {
    address: String,
}

/// Finds the keystore file in `dir` whose `address` field matches `addr`.
///
/// The directory is created if absent, mirroring geth's open-or-construct
/// keystore semantics. Files that are not keystore JSON are skipped.
pub fn find_keystore_file(dir: &Path, addr: Address) -> Result<PathBuf, EvmError> {
    fs::create_dir_all(dir)?;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Ok(contents) = fs::read_to_string(&path) else {
            continue;
        };
        let Ok(envelope) = serde_json::from_str::<KeystoreEnvelope>(&contents) else {
            continue;
        };
        let stored = envelope.address.trim_start_matches("0x");
        if let Ok(stored_addr) = Address::from_str(stored)
            && stored_addr == addr
        {
            return Ok(path);
        }
    }
    Err(EvmError::AddressNotFoundInKeyStore(addr, dir.to_path_buf()))
}

/// Unlocks the signing account: locates the matching keystore file and
/// decrypts it with the passphrase. Both failure modes are configuration
/// errors and abort startup.
pub fn unlock_keystore_account(
    dir: &Path,
    addr: Address,
    password: &str,
) -> Result<PrivateKeySigner, EvmError> {
    let path = find_keystore_file(dir, addr)?;
    PrivateKeySigner::decrypt_keystore(&path, password).map_err(EvmError::KeystoreUnlock)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    const ADDR: Address = address!("7e5f4552091a69125d5dfcb7b8c2659029395bdf");

    #[test]
    fn finds_matching_keystore_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("other.json"), r#"{"address":"00000000000000000000aaaaaaaaaaaaaaaaaaaa"}"#).unwrap();
        fs::write(
            dir.path().join("key.json"),
            r#"{"address":"7e5f4552091a69125d5dfcb7b8c2659029395bdf"}"#,
        )
        .unwrap();
        fs::write(dir.path().join("junk.txt"), "not json").unwrap();

        let found = find_keystore_file(dir.path(), ADDR).unwrap();
        assert_eq!(found, dir.path().join("key.json"));
    }

    #[test]
    fn missing_address_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("key.json"),
            r#"{"address":"00000000000000000000aaaaaaaaaaaaaaaaaaaa"}"#,
        )
        .unwrap();

        let err = find_keystore_file(dir.path(), ADDR).unwrap_err();
        assert!(matches!(err, EvmError::AddressNotFoundInKeyStore(a, _) if a == ADDR));
        assert!(err.is_unrecoverable());
    }

    #[test]
    fn creates_missing_keystore_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("keys");

        let err = find_keystore_file(&nested, ADDR).unwrap_err();
        assert!(matches!(err, EvmError::AddressNotFoundInKeyStore(_, _)));
        assert!(nested.is_dir());
    }
}
