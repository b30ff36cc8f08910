//! Gas pricing for the submission engine.
//!
//! Two pricing modes, selected by the configured transaction type: legacy
//! chains take the node's suggested price scaled by the configured
//! adjustment; EIP-1559 chains take a fee cap of twice the suggested base
//! price plus the suggested tip. The doubling over-bids on purpose so that
//! inclusion survives base-fee growth between pricing and mining.

/// Transaction type marker for EIP-1559 pricing.
pub const TX_TYPE_EIP1559: u8 = 2;

/// Resolved pricing attached to an outgoing transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GasPricing {
    Legacy {
        gas_price: u128,
    },
    Eip1559 {
        max_fee_per_gas: u128,
        max_priority_fee_per_gas: u128,
    },
}

/// Scales a suggested legacy gas price. Adjustments at or below 1.0 leave
/// the suggestion untouched; the multiplication happens in float space and
/// truncates back to an integer.
pub fn legacy_gas_price(suggested: u128, gas_adjustment: f64) -> u128 {
    if gas_adjustment > 1.0 {
        (suggested as f64 * gas_adjustment) as u128
    } else {
        suggested
    }
}

/// EIP-1559 fee caps from the suggested base price and tip:
/// `max_fee = 2 * suggested + tip`.
pub fn eip1559_fee_caps(suggested: u128, tip: u128) -> GasPricing {
    GasPricing::Eip1559 {
        max_fee_per_gas: suggested * 2 + tip,
        max_priority_fee_per_gas: tip,
    }
}
