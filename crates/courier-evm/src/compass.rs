//! Compass contract surface: event shapes and consensus argument packing.
//!
//! The compass contract verifies validator-set signatures before executing
//! anything. Its transactions all start with a `consensus` argument: the
//! current valset plus one `(v, r, s)` triple per valset entry, in valset
//! order, zeroed where a validator did not sign.

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::U256;
use alloy_sol_types::sol;
use courier_types::{Valset, ValidatorSignature};

use crate::error::EvmError;

sol! {
    event LogicCallEvent(address logic_contract_address, bytes payload, uint256 message_id, uint256 event_nonce);
    event ValsetUpdated(bytes32 checkpoint, uint256 valset_id, uint256 event_nonce);
    event BatchSendEvent(address token, uint256 batch_nonce, uint256 event_nonce);
    event SendToPalomaEvent(address token, address sender, string receiver, uint256 amount, uint256 event_nonce);
}

/// Splits a 65-byte `r || s || v` signature into the compass `(v, r, s)`
/// triple. Recovery ids below 27 are shifted into the 27/28 convention.
pub fn split_signature(sig: &[u8]) -> Result<(U256, U256, U256), EvmError> {
    if sig.len() != 65 {
        return Err(EvmError::MalformedSignature(sig.len()));
    }
    let r = U256::from_be_slice(&sig[..32]);
    let s = U256::from_be_slice(&sig[32..64]);
    let mut v = u64::from(sig[64]);
    if v < 27 {
        v += 27;
    }
    Ok((U256::from(v), r, s))
}

fn uint(value: u64) -> DynSolValue {
    DynSolValue::Uint(U256::from(value), 256)
}

/// Packs a valset into the compass `Valset` tuple.
pub fn valset_arg(valset: &Valset) -> DynSolValue {
    DynSolValue::Tuple(vec![
        DynSolValue::Array(
            valset
                .validators
                .iter()
                .map(|a| DynSolValue::Address(*a))
                .collect(),
        ),
        DynSolValue::Array(valset.powers.iter().map(|p| uint(*p)).collect()),
        uint(valset.valset_id),
    ])
}

/// Packs the compass `consensus` argument: the valset plus signatures
/// aligned to its validator order. Validators without a signature get a
/// zeroed triple; compass skips those when tallying power.
pub fn consensus_arg(
    valset: &Valset,
    signatures: &[ValidatorSignature],
) -> Result<DynSolValue, EvmError> {
    let mut packed = Vec::with_capacity(valset.validators.len());
    for validator in &valset.validators {
        let entry = signatures
            .iter()
            .find(|s| s.external_account_address == *validator);
        let (v, r, s) = match entry {
            Some(found) => split_signature(&found.signature)?,
            None => (U256::ZERO, U256::ZERO, U256::ZERO),
        };
        packed.push(DynSolValue::Tuple(vec![
            DynSolValue::Uint(v, 256),
            DynSolValue::Uint(r, 256),
            DynSolValue::Uint(s, 256),
        ]));
    }
    Ok(DynSolValue::Tuple(vec![
        valset_arg(valset),
        DynSolValue::Array(packed),
    ]))
}
