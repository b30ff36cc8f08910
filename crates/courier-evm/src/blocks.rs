//! Block providers.
//!
//! Most chains serve canonical headers directly. Arbitrum-family chains
//! return headers with extra rollup fields and quantity encodings the
//! standard block decoder rejects, so those are fetched raw and rewritten
//! into the canonical shape before anyone downstream sees them.

use alloy_primitives::{Address, B64, B256, Bloom, Bytes, U64, U256};
use alloy_provider::{Provider, RootProvider};
use alloy_rpc_client::RpcClient;
use alloy_rpc_types_eth::{Block, BlockTransactions, Header};
use async_trait::async_trait;
use serde::Deserialize;

use crate::error::EvmError;

/// Single-method seam over "where do blocks come from".
#[async_trait]
pub trait BlockSource: Send + Sync {
    async fn block_by_hash(&self, hash: B256) -> Result<Block, EvmError>;
}

/// Passthrough block source for chains with canonical headers.
pub struct CanonicalBlocks {
    provider: RootProvider,
}

impl CanonicalBlocks {
    pub fn new(provider: RootProvider) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl BlockSource for CanonicalBlocks {
    async fn block_by_hash(&self, hash: B256) -> Result<Block, EvmError> {
        self.provider
            .get_block_by_hash(hash)
            .await?
            .ok_or(EvmError::BlockNotFound(hash))
    }
}

/// Arbitrum block source: fetches the raw header and rewrites it into the
/// canonical shape, dropping the rollup-specific trailer fields.
pub struct ArbitrumBlocks {
    client: RpcClient,
}

impl ArbitrumBlocks {
    pub fn new(client: RpcClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BlockSource for ArbitrumBlocks {
    async fn block_by_hash(&self, hash: B256) -> Result<Block, EvmError> {
        let raw: Option<ArbBlock> = self
            .client
            .request("eth_getBlockByHash", (hash, false))
            .await?;
        raw.map(ArbBlock::into_canonical)
            .ok_or(EvmError::BlockNotFound(hash))
    }
}

/// The raw Arbitrum header shape, including the rollup trailers we accept
/// but do not carry over.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArbBlock {
    hash: B256,
    parent_hash: B256,
    sha3_uncles: B256,
    miner: Address,
    state_root: B256,
    transactions_root: B256,
    receipts_root: B256,
    logs_bloom: Bloom,
    difficulty: U256,
    number: U64,
    gas_limit: U64,
    gas_used: U64,
    timestamp: U64,
    extra_data: Bytes,
    mix_hash: B256,
    nonce: B64,
    #[serde(default)]
    base_fee_per_gas: Option<U64>,
    #[serde(default)]
    withdrawals_root: Option<B256>,
    #[serde(default)]
    l1_block_number: Option<U64>,
    #[serde(default)]
    send_root: Option<B256>,
}

impl ArbBlock {
    fn into_canonical(self) -> Block {
        let inner = alloy_consensus::Header {
            parent_hash: self.parent_hash,
            ommers_hash: self.sha3_uncles,
            beneficiary: self.miner,
            state_root: self.state_root,
            transactions_root: self.transactions_root,
            receipts_root: self.receipts_root,
            logs_bloom: self.logs_bloom,
            difficulty: self.difficulty,
            number: self.number.to(),
            gas_limit: self.gas_limit.to(),
            gas_used: self.gas_used.to(),
            timestamp: self.timestamp.to(),
            extra_data: self.extra_data,
            mix_hash: self.mix_hash,
            nonce: self.nonce,
            base_fee_per_gas: self.base_fee_per_gas.map(|v| v.to()),
            withdrawals_root: self.withdrawals_root,
            blob_gas_used: None,
            excess_blob_gas: None,
            parent_beacon_block_root: None,
            requests_hash: None,
        };
        Block {
            header: Header {
                hash: self.hash,
                inner,
                total_difficulty: None,
                size: None,
            },
            uncles: Vec::new(),
            transactions: BlockTransactions::Hashes(Vec::new()),
            withdrawals: None,
        }
    }
}
