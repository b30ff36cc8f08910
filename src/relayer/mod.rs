//! The relayer control loop and its per-queue pipelines.
//!
//! A [`Relayer`] owns one [`ChainPipeline`] per configured external chain
//! and a [`HomeClient`] for the home chain. [`Relayer::start`] ticks each
//! pipeline operation on its own interval; operations are idempotent under
//! repeated invocation because the home chain is the source of truth for
//! every message's terminal state, and a failed tick is simply retried on
//! the next one.

mod attest;
mod chain_info;
mod gravity;
mod relay;
mod sign;
mod start;

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use alloy_primitives::U256;
use courier_evm::{EvmClient, EvmError};
use courier_home::{HomeClient, HomeError};
use courier_types::{ChainReferenceId, InvalidPubkeyError, message_queue_name};
use tokio::sync::{Mutex, MutexGuard};

use crate::config::{Config, RelayerSettings};

/// Queue suffix for compass-bound messages; the full queue name is
/// `evm/{chain_reference_id}/{suffix}`.
pub const MESSAGE_QUEUE_SUFFIX: &str = "evm-compass-message";

/// A tick-level failure. Logged at the loop boundary and swallowed; the
/// next tick retries from the home chain's state.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error(transparent)]
    Home(#[from] HomeError),
    #[error(transparent)]
    Evm(#[from] EvmError),
    #[error(transparent)]
    Pubkey(#[from] InvalidPubkeyError),
}

/// Serialisation token for keystore-mutating work.
///
/// Pipelines that share an [`EvmClient`] hold this across signing and
/// nonce-sensitive submission so that two concurrent ticks cannot pick the
/// same pending nonce. Nothing else may be done under it; in particular no
/// loop holds it across an idle query round-trip.
#[derive(Clone)]
pub(crate) struct SigningLock(Arc<Mutex<()>>);

impl SigningLock {
    fn new() -> Self {
        Self(Arc::new(Mutex::new(())))
    }

    pub(crate) async fn hold(&self) -> MutexGuard<'_, ()> {
        self.0.lock().await
    }
}

/// One external chain's worth of queue machinery.
pub struct ChainPipeline {
    chain_reference_id: ChainReferenceId,
    queue: String,
    evm: Arc<EvmClient>,
}

impl ChainPipeline {
    pub fn new(evm: Arc<EvmClient>) -> Self {
        let chain_reference_id = evm.config().chain_reference_id().clone();
        let queue = message_queue_name(&chain_reference_id, MESSAGE_QUEUE_SUFFIX);
        Self {
            chain_reference_id,
            queue,
            evm,
        }
    }

    pub fn chain_reference_id(&self) -> &ChainReferenceId {
        &self.chain_reference_id
    }

    pub fn queue(&self) -> &str {
        &self.queue
    }
}

/// The daemon: home-chain client, per-chain pipelines, staking gate.
pub struct Relayer {
    home: HomeClient,
    chains: Vec<ChainPipeline>,
    staking: AtomicBool,
    lock: SigningLock,
    settings: RelayerSettings,
    version: String,
}

impl Relayer {
    pub fn new(
        home: HomeClient,
        settings: RelayerSettings,
        version: impl Into<String>,
        chains: Vec<ChainPipeline>,
    ) -> Self {
        Self {
            home,
            chains,
            staking: AtomicBool::new(false),
            lock: SigningLock::new(),
            settings,
            version: version.into(),
        }
    }

    /// Builds a relayer from configuration, connecting one [`EvmClient`] per
    /// configured chain. Any chain failing its init aborts startup.
    pub fn connect(
        home: HomeClient,
        config: &Config,
        version: impl Into<String>,
    ) -> Result<Self, EvmError> {
        let chains = config
            .chain_configs()
            .into_iter()
            .map(|chain_config| EvmClient::connect(chain_config).map(Arc::new))
            .map(|client| client.map(ChainPipeline::new))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(home, config.relayer.clone(), version, chains))
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

/// Contract return values that must fit a u64 (ids, nonces, heights).
pub(crate) fn u256_as_u64(value: U256, what: &'static str) -> Result<u64, EvmError> {
    u64::try_from(value).map_err(|_| EvmError::BadCallOutput(what))
}
