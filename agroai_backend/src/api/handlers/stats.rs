//! On-chain user statistics.

use axum::extract::Path;
use axum::{Extension, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::api::errors::{ApiError, ApiResult};
use crate::api::server::AppState;
use crate::api::validation::validate_wallet_address;

/// `GET /user-stats/:wallet_address`
pub async fn user_stats(
    Extension(state): Extension<Arc<AppState>>,
    Path(wallet_address): Path<String>,
) -> ApiResult<Json<Value>> {
    let address = validate_wallet_address(&wallet_address)?;
    let chain = state
        .chain
        .as_ref()
        .ok_or_else(|| ApiError::service_unavailable("Blockchain service not available"))?;

    let stats = chain
        .user_stats(address)
        .await
        .map_err(|e| ApiError::service_unavailable(&format!("Failed to read user stats: {e}")))?;

    Ok(Json(json!({
        "wallet_address": wallet_address,
        "stats": stats,
    })))
}
