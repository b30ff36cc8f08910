use alloy_consensus::TxEnvelope;
use alloy_dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt};
use alloy_eips::eip2718::Encodable2718;
use alloy_json_abi::JsonAbi;
use alloy_network::{EthereumWallet, TransactionBuilder};
use alloy_primitives::{Address, B256, Bytes, U256, keccak256};
use alloy_provider::{Provider, RootProvider};
use alloy_rpc_client::RpcClient;
use alloy_rpc_types_eth::{BlockId, Filter, Log, Transaction, TransactionRequest};
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use std::sync::Arc;
use tracing::{debug, info, warn};

use courier_types::UnixTimestamp;

use crate::blocks::{ArbitrumBlocks, BlockSource, CanonicalBlocks};
use crate::config::{ChainFamily, EvmChainConfig};
use crate::contracts;
use crate::error::EvmError;
use crate::gas::{GasPricing, TX_TYPE_EIP1559, eip1559_fee_caps, legacy_gas_price};
use crate::keystore;
use crate::mev::{HttpMevRelay, MevRelay, ensure_relayed_hash};
use crate::scanner;
use crate::search;

/// One client per external chain. Owns the unlocked signing key, the RPC
/// connection, and the optional MEV relay for that chain.
pub struct EvmClient {
    config: EvmChainConfig,
    addr: Address,
    signer: PrivateKeySigner,
    wallet: EthereumWallet,
    provider: RootProvider,
    blocks: Arc<dyn BlockSource>,
    mev: Option<Arc<dyn MevRelay>>,
}

impl EvmClient {
    /// Opens the keystore, unlocks the configured account, and dials the RPC
    /// endpoint. All failures here are configuration errors; a successful
    /// dial does not imply a reachable node.
    pub fn connect(config: EvmChainConfig) -> Result<Self, EvmError> {
        let addr: Address = config
            .signing_key()
            .parse()
            .map_err(|_| EvmError::InvalidAddress(config.signing_key().to_owned()))?;
        let password = config.keyring_password()?;
        let signer = keystore::unlock_keystore_account(config.keyring_dir(), addr, &password)?;
        Self::from_signer(config, signer)
    }

    /// Builds a client around an already-unlocked key. [`Self::connect`] is
    /// the keystore-backed path; this one exists for embedders that manage
    /// key material themselves.
    pub fn from_signer(config: EvmChainConfig, signer: PrivateKeySigner) -> Result<Self, EvmError> {
        let addr = signer.address();
        let rpc = RpcClient::new_http(config.base_rpc_url().clone());
        let provider = RootProvider::new(rpc);
        let blocks: Arc<dyn BlockSource> = match config.chain_family() {
            ChainFamily::Arbitrum => Arc::new(ArbitrumBlocks::new(RpcClient::new_http(
                config.base_rpc_url().clone(),
            ))),
            ChainFamily::Canonical => Arc::new(CanonicalBlocks::new(provider.clone())),
        };
        let mev: Option<Arc<dyn MevRelay>> = config
            .mev_rpc_url()
            .map(|url| Arc::new(HttpMevRelay::new(url.clone())) as Arc<dyn MevRelay>);
        let wallet = EthereumWallet::from(signer.clone());
        Ok(Self {
            config,
            addr,
            signer,
            wallet,
            provider,
            blocks,
            mev,
        })
    }

    pub fn config(&self) -> &EvmChainConfig {
        &self.config
    }

    pub fn address(&self) -> Address {
        self.addr
    }

    pub fn mev(&self) -> Option<Arc<dyn MevRelay>> {
        self.mev.clone()
    }

    /// The 64-byte uncompressed public key body of the signing account,
    /// as registered with the home chain.
    pub fn uncompressed_pubkey(&self) -> Vec<u8> {
        let point = self
            .signer
            .credential()
            .verifying_key()
            .to_encoded_point(false);
        point.as_bytes()[1..].to_vec()
    }

    /// Signs opaque message bytes the compass way: keccak digest, then a raw
    /// secp256k1 signature with the recovery id in 27/28 form.
    pub async fn sign_message_bytes(&self, bytes: &[u8]) -> Result<Bytes, EvmError> {
        let digest = keccak256(bytes);
        let sig = self.signer.sign_hash(&digest).await?;
        let mut out = Vec::with_capacity(65);
        out.extend_from_slice(sig.r().to_be_bytes::<32>().as_slice());
        out.extend_from_slice(sig.s().to_be_bytes::<32>().as_slice());
        out.push(27 + u8::from(sig.v()));
        Ok(out.into())
    }

    /// Packs `method(args…)` through `abi` and submits it to `contract`.
    ///
    /// The nonce is the node's pending nonce at submission time, which is
    /// what keeps retried ticks from stacking duplicate transactions. With
    /// MEV routing the transaction is signed but not broadcast; the relay
    /// must echo the local hash back or the submission counts as failed.
    pub async fn execute_smart_contract(
        &self,
        chain_id: u64,
        abi: &JsonAbi,
        contract: Address,
        use_mev: bool,
        method: &str,
        args: &[DynSolValue],
    ) -> Result<TxEnvelope, EvmError> {
        let func = abi
            .functions
            .get(method)
            .and_then(|overloads| overloads.first())
            .ok_or_else(|| EvmError::UnknownMethod(method.to_owned()))?;
        let calldata = func.abi_encode_input(args)?;

        let nonce = self
            .provider
            .get_transaction_count(self.addr)
            .pending()
            .await?;
        let suggested = self.provider.get_gas_price().await?;

        let pricing = if self.config.tx_type() == TX_TYPE_EIP1559 {
            let tip = self.provider.get_max_priority_fee_per_gas().await?;
            eip1559_fee_caps(suggested, tip)
        } else {
            GasPricing::Legacy {
                gas_price: legacy_gas_price(suggested, self.config.gas_adjustment()),
            }
        };

        let mut txr = TransactionRequest::default()
            .with_from(self.addr)
            .with_to(contract)
            .with_input(Bytes::from(calldata))
            .with_nonce(nonce)
            .with_chain_id(chain_id);
        match pricing {
            GasPricing::Legacy { gas_price } => {
                debug!(
                    chain_id,
                    contract_addr = %contract,
                    method,
                    signing_addr = %self.addr,
                    nonce,
                    gas_price,
                    "pricing legacy tx"
                );
                txr.set_gas_price(gas_price);
            }
            GasPricing::Eip1559 {
                max_fee_per_gas,
                max_priority_fee_per_gas,
            } => {
                debug!(
                    chain_id,
                    contract_addr = %contract,
                    method,
                    signing_addr = %self.addr,
                    nonce,
                    gas_fee_cap = max_fee_per_gas,
                    gas_tip_cap = max_priority_fee_per_gas,
                    "pricing eip-1559 tx"
                );
                txr.set_max_fee_per_gas(max_fee_per_gas);
                txr.set_max_priority_fee_per_gas(max_priority_fee_per_gas);
            }
        }

        let gas_limit = self.provider.estimate_gas(txr.clone()).await?;
        txr.set_gas_limit(gas_limit);

        let envelope = txr
            .build(&self.wallet)
            .await
            .map_err(|e| EvmError::TxBuild(e.to_string()))?;
        let tx_hash = *envelope.tx_hash();

        let relay = if use_mev { self.mev.as_ref() } else { None };
        match relay {
            Some(relay) => {
                let relay_hash = relay.relay(chain_id, &envelope).await.inspect_err(|e| {
                    warn!(
                        chain_id,
                        contract_addr = %contract,
                        method,
                        signing_addr = %self.addr,
                        tx_hash = %tx_hash,
                        error = %e,
                        "mev relay rejected transaction"
                    );
                })?;
                ensure_relayed_hash(tx_hash, relay_hash)?;
                info!(
                    chain_id,
                    contract_addr = %contract,
                    method,
                    signing_addr = %self.addr,
                    nonce,
                    gas_limit,
                    tx_hash = %tx_hash,
                    relay_hash = %relay_hash,
                    "tx relayed"
                );
            }
            None => {
                let _pending = self
                    .provider
                    .send_raw_transaction(&envelope.encoded_2718())
                    .await
                    .inspect_err(|e| {
                        warn!(
                            chain_id,
                            contract_addr = %contract,
                            method,
                            signing_addr = %self.addr,
                            tx_hash = %tx_hash,
                            error = %e,
                            "broadcast failed"
                        );
                    })?;
                info!(
                    chain_id,
                    contract_addr = %contract,
                    method,
                    signing_addr = %self.addr,
                    nonce,
                    gas_limit,
                    tx_hash = %tx_hash,
                    "tx executed"
                );
            }
        }

        Ok(envelope)
    }

    /// Scans logs over the filter's range, newest chunks first, bisecting
    /// around provider range limits. See [`scanner::filter_logs`].
    pub async fn filter_logs<F>(
        &self,
        filter: &Filter,
        current_height: Option<u64>,
        on_chunk: F,
    ) -> Result<bool, EvmError>
    where
        F: FnMut(Vec<Log>) -> bool,
    {
        scanner::filter_logs(&self.provider, filter, current_height, true, on_chunk).await
    }

    pub async fn transaction_by_hash(
        &self,
        hash: B256,
    ) -> Result<Option<(Transaction, bool)>, EvmError> {
        let tx = self.provider.get_transaction_by_hash(hash).await?;
        Ok(tx.map(|tx| {
            let is_pending = tx.block_hash.is_none();
            (tx, is_pending)
        }))
    }

    pub async fn block_by_hash(
        &self,
        hash: B256,
    ) -> Result<alloy_rpc_types_eth::Block, EvmError> {
        self.blocks.block_by_hash(hash).await
    }

    /// Balance at a height; height 0 means latest.
    pub async fn balance_at(&self, address: Address, block_height: u64) -> Result<U256, EvmError> {
        let call = self.provider.get_balance(address);
        let balance = if block_height > 0 {
            call.block_id(BlockId::number(block_height)).await?
        } else {
            call.await?
        };
        Ok(balance)
    }

    /// See [`search::find_block_nearest_to_time`].
    pub async fn find_block_nearest_to_time(
        &self,
        starting_height: u64,
        when: UnixTimestamp,
    ) -> Result<u64, EvmError> {
        search::find_block_nearest_to_time(&self.provider, starting_height, when).await
    }

    pub async fn find_current_block_number(&self) -> Result<U256, EvmError> {
        Ok(U256::from(self.provider.get_block_number().await?))
    }

    /// Read-only call for the id of the valset currently attested on the
    /// compass contract.
    pub async fn last_valset_id(&self, compass: Address) -> Result<U256, EvmError> {
        let stored = contracts::contract("compass")?;
        let func = stored
            .abi
            .functions
            .get("last_valset_id")
            .and_then(|overloads| overloads.first())
            .ok_or_else(|| EvmError::UnknownMethod("last_valset_id".to_owned()))?;
        let calldata = func.abi_encode_input(&[])?;
        let req = TransactionRequest::default()
            .with_to(compass)
            .with_input(Bytes::from(calldata));
        let returned = self.provider.call(req).await?;
        let values = func.abi_decode_output(&returned)?;
        values
            .first()
            .and_then(|v| v.as_uint())
            .map(|(id, _)| id)
            .ok_or(EvmError::BadCallOutput("last_valset_id"))
    }
}
