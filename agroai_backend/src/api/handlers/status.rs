//! Liveness and blockchain connectivity endpoints.

use axum::{Extension, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::api::server::AppState;

/// `GET /health` — liveness plus a feature map of degraded subsystems.
pub async fn health(Extension(state): Extension<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "features": {
            "blockchain": state.chain.is_some(),
            "ai_model": state.detector.model_loaded(),
            "ipfs": state.ipfs.available().await,
            "weather": state.weather.is_configured(),
        },
    }))
}

/// `GET /blockchain-status` — chain id, head block, gas price and the
/// service account balance. Reports disconnected rather than failing when
/// the node is unreachable.
pub async fn blockchain_status(Extension(state): Extension<Arc<AppState>>) -> Json<Value> {
    let ipfs_available = state.ipfs.available().await;

    let chain = match state.chain.as_ref() {
        Some(chain) => chain,
        None => {
            return Json(json!({
                "connected": false,
                "contracts_loaded": false,
                "ipfs_available": ipfs_available,
                "error": "Blockchain service not available",
            }))
        }
    };

    let network = match chain.network_info().await {
        Ok(network) => network,
        Err(e) => {
            return Json(json!({
                "connected": false,
                "contracts_loaded": true,
                "ipfs_available": ipfs_available,
                "error": e.to_string(),
            }))
        }
    };
    let account_balance = chain.account_balance().await.unwrap_or(0.0);

    Json(json!({
        "connected": true,
        "network": network,
        "account": format!("{:?}", chain.account()),
        "account_balance": account_balance,
        "contracts_loaded": true,
        "ipfs_available": ipfs_available,
    }))
}
