//! courier, a validator-side relayer daemon.
//!
//! The relayer watches message queues on a Cosmos-style home chain, signs
//! queued messages with the validator's EVM key, submits the approved ones
//! to the target EVM chains (optionally through a private-orderflow relay),
//! and attests the on-chain outcome back to the home chain. A parallel
//! gravity pipeline does the same dance for token batches.
//!
//! The crate is the engine, not the binary: an embedder wires up a
//! [`courier_home::HomeClient`] (the gRPC transport lives with the
//! embedder), loads a [`Config`], and drives [`Relayer::start`] with a
//! cancellation token. [`util::SigDown`] turns Unix signals into exactly
//! that token.

pub mod config;
pub mod relayer;
pub mod telemetry;
pub mod util;

pub use config::{Config, ConfigError, RelayerSettings};
pub use relayer::{ChainPipeline, RelayError, Relayer};
