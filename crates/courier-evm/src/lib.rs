//! EVM client for the courier relayer.
//!
//! One [`EvmClient`] per external chain: it owns the unlocked signing key,
//! the RPC connection, and (optionally) a private-orderflow relay. On top of
//! the raw RPC surface it provides the pieces the relayer pipelines need:
//!
//! - the submission engine ([`EvmClient::execute_smart_contract`]) with
//!   legacy and EIP-1559 pricing and at-most-one-in-flight nonce choice,
//! - the bisecting log scanner ([`scanner::filter_logs`]) that hides
//!   provider-imposed `eth_getLogs` range caps,
//! - binary search from wall-clock time to block height ([`search`]),
//! - the embedded contract catalogue ([`contracts`]) and the compass
//!   argument packing ([`compass`]),
//! - the Arbitrum header shim ([`blocks`]).

pub mod blocks;
mod client;
pub mod compass;
mod config;
pub mod contracts;
mod error;
pub mod gas;
mod keystore;
pub mod mev;
pub mod scanner;
pub mod search;

pub use client::EvmClient;
pub use config::{ChainFamily, EvmChainConfig, EvmChainConfigInner};
pub use error::EvmError;
pub use keystore::{find_keystore_file, unlock_keystore_account};
pub use mev::{HttpMevRelay, MevRelay};
