//! Serialized nonce allocation for the shared service account.

use ethers::providers::Middleware;
use ethers::types::{Address, BlockNumber, U256};
use tokio::sync::Mutex;

use super::ChainError;

/// Hands out strictly increasing nonces for the single service signing key.
///
/// The first reservation reads the pending-block transaction count from the
/// node; later reservations increment a local counter under the lock.
/// Concurrent submissions therefore never observe the same nonce, which the
/// node-side `get_transaction_count` alone cannot guarantee.
pub struct NonceAllocator {
    address: Address,
    next: Mutex<Option<U256>>,
}

impl NonceAllocator {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            next: Mutex::new(None),
        }
    }

    /// Seed the counter without touching the chain.
    pub fn with_start(address: Address, start: U256) -> Self {
        Self {
            address,
            next: Mutex::new(Some(start)),
        }
    }

    /// Reserve the next nonce. The reservation is final: a reserved nonce is
    /// never handed out again, even if the transaction it was meant for is
    /// still unconfirmed.
    pub async fn reserve<M: Middleware>(&self, node: &M) -> Result<U256, ChainError> {
        let mut next = self.next.lock().await;
        let nonce = match *next {
            Some(n) => n,
            None => node
                .get_transaction_count(self.address, Some(BlockNumber::Pending.into()))
                .await
                .map_err(|e| ChainError::NodeUnavailable(e.to_string()))?,
        };
        *next = Some(nonce + U256::one());
        Ok(nonce)
    }

    /// Forget the local counter so the next reservation re-reads the chain.
    /// Called after a failed broadcast to avoid building on a nonce hole.
    pub async fn reset(&self) {
        *self.next.lock().await = None;
    }
}
