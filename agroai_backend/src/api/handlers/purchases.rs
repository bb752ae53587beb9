//! Marketplace discount quoting and purchase settlement.

use axum::{Extension, Json};
use log::info;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::errors::{ApiError, ApiResult};
use crate::api::server::AppState;
use crate::api::validation::{validate_purchase_amount, validate_wallet_address};
use crate::rewards::calculate_discount;
use crate::web3::ChainService;

#[derive(Debug, Deserialize)]
pub struct DiscountRequest {
    #[serde(default)]
    pub wallet_address: String,
    #[serde(default)]
    pub purchase_amount: f64,
}

#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    #[serde(default)]
    pub wallet_address: String,
    #[serde(default)]
    pub purchase_amount: f64,
    #[serde(default)]
    pub product_id: String,
}

fn require_chain(state: &AppState) -> ApiResult<Arc<ChainService>> {
    state
        .chain
        .clone()
        .ok_or_else(|| ApiError::service_unavailable("Blockchain service not available"))
}

/// `POST /calculate-discount` — quote a discount against the caller's
/// on-chain loyalty tier and token balance. Read-only; nothing is settled.
pub async fn calculate_discount_quote(
    Extension(state): Extension<Arc<AppState>>,
    Json(request): Json<DiscountRequest>,
) -> ApiResult<Json<Value>> {
    let address = validate_wallet_address(&request.wallet_address)?;
    validate_purchase_amount(request.purchase_amount)?;
    let chain = require_chain(&state)?;

    let stats = chain
        .user_stats(address)
        .await
        .map_err(|e| ApiError::service_unavailable(&format!("Failed to read user stats: {e}")))?;

    let decision = calculate_discount(request.purchase_amount, stats.user_tier)
        .map_err(|e| ApiError::bad_request(&e.to_string()))?;
    let can_afford_discount = stats.token_balance >= decision.discount_amount;

    Ok(Json(json!({
        "wallet_address": request.wallet_address,
        "purchase_amount": request.purchase_amount,
        "discount_info": {
            "discount_rate": decision.discount_rate,
            "discount_amount": decision.discount_amount,
            "final_price": decision.final_price,
            "cashback_amount": decision.cashback_amount,
            "can_afford_discount": can_afford_discount,
            "tier_multiplier": decision.discount_rate,
        },
    })))
}

/// `POST /process-purchase` — settle a purchase on-chain. The contract
/// burns the discount and mints the cashback; this endpoint reports the
/// transaction outcome alongside the locally computed pricing.
pub async fn process_purchase(
    Extension(state): Extension<Arc<AppState>>,
    Json(request): Json<PurchaseRequest>,
) -> ApiResult<Json<Value>> {
    let address = validate_wallet_address(&request.wallet_address)?;
    validate_purchase_amount(request.purchase_amount)?;
    let chain = require_chain(&state)?;

    let stats = chain
        .user_stats(address)
        .await
        .map_err(|e| ApiError::service_unavailable(&format!("Failed to read user stats: {e}")))?;
    let decision = calculate_discount(request.purchase_amount, stats.user_tier)
        .map_err(|e| ApiError::bad_request(&e.to_string()))?;

    info!(
        "processing purchase of {} for {} (tier {})",
        request.purchase_amount, request.wallet_address, stats.user_tier
    );
    let outcome = chain.process_purchase(address, request.purchase_amount).await;

    Ok(Json(json!({
        "wallet_address": request.wallet_address,
        "product_id": request.product_id,
        "purchase_result": {
            "success": outcome.success,
            "purchase_id": Uuid::new_v4(),
            "transaction_hash": outcome.transaction_hash,
            "gas_used": outcome.gas_used,
            "error": outcome.error,
            "purchase_amount": request.purchase_amount,
            "discount_applied": decision.discount_amount,
            "cashback_earned": decision.cashback_amount,
            "final_price": decision.final_price,
        },
    })))
}
