//! Transaction submission and contract reads for the AgroAI contracts.
//!
//! One service account signs every transaction on behalf of users. That key
//! and its nonce counter are the only mutable state shared across requests,
//! so reserve-and-broadcast runs under a single lock.

use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, TransactionReceipt, U256};
use ethers::utils::{format_ether, parse_ether};
use log::{error, info};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::timeout;

use super::contracts::{AgroCore, AgroToken};
use super::nonce::NonceAllocator;
use super::{ChainError, TransactionOutcome};
use crate::config::Config;

type Client = SignerMiddleware<Provider<Http>, LocalWallet>;

/// User statistics held by the token contract.
#[derive(Debug, Clone, Serialize)]
pub struct UserStats {
    pub token_balance: f64,
    pub photo_count: u64,
    pub disease_detections: u64,
    pub total_purchases: f64,
    pub total_savings: f64,
    pub user_tier: u64,
    pub last_activity: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct NetworkInfo {
    pub chain_id: u64,
    pub block_number: u64,
    pub gas_price: u128,
    pub connected: bool,
}

pub struct ChainService {
    client: Arc<Client>,
    token: AgroToken<Client>,
    core: AgroCore<Client>,
    nonces: NonceAllocator,
    /// Serializes reserve-nonce through broadcast so concurrent requests
    /// cannot reuse a nonce or leave the mempool with gaps.
    submit_lock: Mutex<()>,
    address: Address,
    gas_price: U256,
    gas_limit: U256,
    chain_id: u64,
    confirmation_timeout: Duration,
}

impl ChainService {
    /// Connect to the configured node and bind both contracts.
    pub async fn connect(config: &Config) -> Result<Self, ChainError> {
        if config.web3.private_key.is_empty() {
            return Err(ChainError::Config("private key not provided".into()));
        }

        let provider = Provider::<Http>::try_from(config.web3.rpc_url.as_str())
            .map_err(|e| ChainError::Config(format!("bad RPC url: {e}")))?;
        let chain_id = provider
            .get_chainid()
            .await
            .map_err(|e| ChainError::NodeUnavailable(e.to_string()))?
            .as_u64();

        let wallet = config
            .web3
            .private_key
            .parse::<LocalWallet>()
            .map_err(|e| ChainError::Config(format!("bad private key: {e}")))?
            .with_chain_id(chain_id);
        let address = wallet.address();

        let token_address = config
            .contracts
            .agro_token
            .parse::<Address>()
            .map_err(|e| ChainError::Config(format!("bad token contract address: {e}")))?;
        let core_address = config
            .contracts
            .agro_core
            .parse::<Address>()
            .map_err(|e| ChainError::Config(format!("bad core contract address: {e}")))?;

        let client = Arc::new(SignerMiddleware::new(provider, wallet));
        let token = AgroToken::new(token_address, client.clone());
        let core = AgroCore::new(core_address, client.clone());

        info!("connected to chain {chain_id} as {address:?}");
        Ok(Self {
            client,
            token,
            core,
            nonces: NonceAllocator::new(address),
            submit_lock: Mutex::new(()),
            address,
            gas_price: U256::from(config.web3.gas_price),
            gas_limit: U256::from(config.web3.gas_limit),
            chain_id,
            confirmation_timeout: Duration::from_secs(config.web3.confirmation_timeout_secs),
        })
    }

    pub fn account(&self) -> Address {
        self.address
    }

    /// Pay the flat photo-upload reward.
    pub async fn reward_photo_upload(&self, farmer: Address) -> TransactionOutcome {
        let tx = self.token.reward_photo_upload(farmer).tx;
        self.outcome(tx, "rewardPhotoUpload").await
    }

    /// Pay the disease-detection bonus.
    pub async fn reward_disease_detection(
        &self,
        farmer: Address,
        is_early_detection: bool,
        disease: String,
    ) -> TransactionOutcome {
        let tx = self
            .token
            .reward_disease_detection(farmer, is_early_detection, disease)
            .tx;
        self.outcome(tx, "rewardDiseaseDetection").await
    }

    /// Record a purchase on-chain; the contract applies discount and cashback.
    pub async fn process_purchase(&self, buyer: Address, amount_ether: f64) -> TransactionOutcome {
        let amount = match parse_ether(amount_ether) {
            Ok(wei) => wei,
            Err(e) => {
                let err = ChainError::Config(format!("bad purchase amount: {e}"));
                return TransactionOutcome::failed(&err);
            }
        };
        let tx = self.token.process_purchase(buyer, amount).tx;
        self.outcome(tx, "processPurchase").await
    }

    /// Ask the core contract to run an oracle-backed photo analysis.
    pub async fn request_photo_analysis(
        &self,
        backend_url: String,
        ipfs_hash: String,
        crop_type: String,
        location: String,
        latitude: String,
        longitude: String,
    ) -> TransactionOutcome {
        let tx = self
            .core
            .request_photo_analysis(backend_url, ipfs_hash, crop_type, location, latitude, longitude)
            .tx;
        self.outcome(tx, "requestPhotoAnalysis").await
    }

    /// AGRO balance of an account, in whole tokens.
    pub async fn token_balance(&self, account: Address) -> Result<f64, ChainError> {
        let wei = self
            .token
            .balance_of(account)
            .call()
            .await
            .map_err(|e| ChainError::NodeUnavailable(e.to_string()))?;
        Ok(to_ether(wei))
    }

    /// Full user statistics tuple from the token contract.
    pub async fn user_stats(&self, account: Address) -> Result<UserStats, ChainError> {
        let (balance, photos, detections, purchases, savings, tier, last_activity) = self
            .token
            .get_user_stats(account)
            .call()
            .await
            .map_err(|e| ChainError::NodeUnavailable(e.to_string()))?;
        Ok(UserStats {
            token_balance: to_ether(balance),
            photo_count: photos.as_u64(),
            disease_detections: detections.as_u64(),
            total_purchases: to_ether(purchases),
            total_savings: to_ether(savings),
            user_tier: tier.as_u64(),
            last_activity: last_activity.as_u64(),
        })
    }

    /// ETH balance of the service account, in ether.
    pub async fn account_balance(&self) -> Result<f64, ChainError> {
        let wei = self
            .client
            .get_balance(self.address, None)
            .await
            .map_err(|e| ChainError::NodeUnavailable(e.to_string()))?;
        Ok(to_ether(wei))
    }

    pub async fn network_info(&self) -> Result<NetworkInfo, ChainError> {
        let block_number = self
            .client
            .get_block_number()
            .await
            .map_err(|e| ChainError::NodeUnavailable(e.to_string()))?;
        let gas_price = self
            .client
            .get_gas_price()
            .await
            .map_err(|e| ChainError::NodeUnavailable(e.to_string()))?;
        Ok(NetworkInfo {
            chain_id: self.chain_id,
            block_number: block_number.as_u64(),
            gas_price: gas_price.as_u128(),
            connected: true,
        })
    }

    async fn outcome(&self, tx: TypedTransaction, label: &str) -> TransactionOutcome {
        match self.submit(tx, label).await {
            Ok(receipt) => {
                info!(
                    "{label} confirmed in block {:?}, tx {:#x}",
                    receipt.block_number, receipt.transaction_hash
                );
                TransactionOutcome::confirmed(
                    format!("{:#x}", receipt.transaction_hash),
                    receipt.gas_used.map(|gas| gas.as_u64()),
                )
            }
            Err(e) => {
                error!("{label} failed: {e}");
                TransactionOutcome::failed(&e)
            }
        }
    }

    /// Estimate, reserve a nonce, sign, broadcast and await the receipt.
    /// Exactly one attempt; callers decide whether to re-invoke.
    async fn submit(
        &self,
        mut tx: TypedTransaction,
        label: &str,
    ) -> Result<TransactionReceipt, ChainError> {
        tx.set_from(self.address);

        let gas = self
            .client
            .estimate_gas(&tx, None)
            .await
            .map_err(|e| ChainError::Estimation(e.to_string()))?;
        if gas > self.gas_limit {
            return Err(ChainError::Estimation(format!(
                "{label}: estimate {gas} exceeds configured gas limit {}",
                self.gas_limit
            )));
        }
        tx.set_gas(gas);
        tx.set_gas_price(self.gas_price);

        let pending = {
            let _guard = self.submit_lock.lock().await;
            let nonce = self.nonces.reserve(self.client.as_ref()).await?;
            tx.set_nonce(nonce);
            match self.client.send_transaction(tx, None).await {
                Ok(pending) => pending,
                Err(e) => {
                    // The reserved nonce was never broadcast; forget the
                    // counter so the next submission re-reads the chain.
                    self.nonces.reset().await;
                    return Err(ChainError::Broadcast(e.to_string()));
                }
            }
        };

        match timeout(self.confirmation_timeout, pending).await {
            Ok(Ok(Some(receipt))) => Ok(receipt),
            Ok(Ok(None)) => Err(ChainError::Broadcast(format!(
                "{label}: transaction dropped from the mempool"
            ))),
            Ok(Err(e)) => Err(ChainError::Broadcast(e.to_string())),
            Err(_) => Err(ChainError::ConfirmationTimeout(self.confirmation_timeout.as_secs())),
        }
    }
}

fn to_ether(wei: U256) -> f64 {
    format_ether(wei).parse().unwrap_or(0.0)
}
