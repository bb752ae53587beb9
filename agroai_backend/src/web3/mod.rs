//! EVM chain integration: contract bindings, nonce allocation and the
//! transaction submission service for the AGRO token and core contracts.

pub mod contracts;
pub mod nonce;
pub mod service;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use nonce::NonceAllocator;
pub use service::{ChainService, NetworkInfo, UserStats};

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("chain node unavailable: {0}")]
    NodeUnavailable(String),
    #[error("gas estimation failed: {0}")]
    Estimation(String),
    #[error("transaction broadcast failed: {0}")]
    Broadcast(String),
    #[error("no receipt within {0} seconds; transaction outcome unknown")]
    ConfirmationTimeout(u64),
    #[error("invalid chain configuration: {0}")]
    Config(String),
}

/// Terminal result of one submission attempt. There is no retry state: a
/// timeout means the outcome is unknown, not that the transaction failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_used: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TransactionOutcome {
    pub fn confirmed(transaction_hash: String, gas_used: Option<u64>) -> Self {
        Self {
            success: true,
            transaction_hash: Some(transaction_hash),
            gas_used,
            error: None,
        }
    }

    pub fn failed(error: &ChainError) -> Self {
        Self {
            success: false,
            transaction_hash: None,
            gas_used: None,
            error: Some(error.to_string()),
        }
    }
}
