//! Photo upload and disease detection endpoints.

use axum::body::Bytes;
use axum::extract::multipart::MultipartError;
use axum::extract::Multipart;
use axum::http::StatusCode;
use axum::{Extension, Json};
use ethers::types::Address;
use log::{info, warn};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::ai_engine::InferenceResult;
use crate::api::errors::{ApiError, ApiResult};
use crate::api::server::AppState;
use crate::api::validation::{allowed_file, validate_wallet_address, MAX_FILE_SIZE};
use crate::rewards::token_rewards::HEALTHY_BONUS;
use crate::rewards::{calculate_token_reward, evaluate_community_alert};

/// Multipart fields accepted by the detection endpoints.
#[derive(Default)]
struct UploadForm {
    file: Option<Bytes>,
    filename: String,
    wallet_address: String,
    crop_type: String,
    location: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

async fn parse_upload(mut multipart: Multipart) -> ApiResult<UploadForm> {
    let mut form = UploadForm {
        crop_type: "unknown".to_string(),
        location: "unknown".to_string(),
        ..Default::default()
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(&format!("malformed multipart body: {e}")))?
    {
        match field.name().unwrap_or("") {
            "file" => {
                form.filename = field.file_name().unwrap_or("upload").to_string();
                form.file = Some(field.bytes().await.map_err(file_read_error)?);
            }
            "wallet_address" => form.wallet_address = text(field).await?,
            "crop_type" => form.crop_type = text(field).await?,
            "location" => form.location = text(field).await?,
            "latitude" => form.latitude = text(field).await?.parse().ok(),
            "longitude" => form.longitude = text(field).await?.parse().ok(),
            _ => {}
        }
    }

    Ok(form)
}

/// Only a body-limit overflow is an oversize upload; a truncated or
/// malformed stream is the client's framing problem, not a size problem.
fn file_read_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large("File too large")
    } else {
        ApiError::bad_request(&format!("malformed multipart body: {e}"))
    }
}

async fn text(field: axum::extract::multipart::Field<'_>) -> ApiResult<String> {
    field
        .text()
        .await
        .map_err(|e| ApiError::bad_request(&format!("unreadable form field: {e}")))
}

fn validated_file(form: &UploadForm) -> ApiResult<&Bytes> {
    let bytes = form
        .file
        .as_ref()
        .ok_or_else(|| ApiError::bad_request("No file provided"))?;
    if !allowed_file(&form.filename) {
        return Err(ApiError::bad_request("File type not allowed"));
    }
    if bytes.len() > MAX_FILE_SIZE {
        return Err(ApiError::payload_too_large("File too large"));
    }
    Ok(bytes)
}

/// `POST /detect-enhanced` — the full upload pipeline: store the photo,
/// classify it, compute rewards and alerts, then submit reward transactions
/// best-effort. Storage and chain failures degrade; they never fail the
/// request once the input has validated.
pub async fn detect_enhanced(
    Extension(state): Extension<Arc<AppState>>,
    multipart: Multipart,
) -> ApiResult<Json<Value>> {
    let form = parse_upload(multipart).await?;
    let bytes = validated_file(&form)?;
    let wallet = if form.wallet_address.is_empty() {
        None
    } else {
        Some(validate_wallet_address(&form.wallet_address)?)
    };

    info!(
        "processing enhanced detection for wallet {:?}, file {} ({} bytes)",
        form.wallet_address, form.filename, bytes.len()
    );

    // Content storage is best-effort; a deterministic digest stands in when
    // the store is down.
    let ipfs_hash = state.ipfs.add_or_fallback(bytes, &form.filename).await;

    let inference = state.detector.predict(bytes);
    let reward = calculate_token_reward(&inference.disease, inference.confidence);
    let alert = evaluate_community_alert(
        &inference.disease,
        inference.confidence,
        inference.severity,
        &form.location,
    );

    if alert.should_alert {
        let mut alerts = state.alerts.write().await;
        let id = super::alerts::push_alert(&mut alerts, &alert);
        info!("community alert #{id}: {} in {}", alert.disease, alert.location);
    }

    let mut blockchain = json!({
        "ipfs_hash": ipfs_hash,
        "rewards": reward,
        "community_alert": alert,
        "timestamp": chrono::Utc::now().timestamp(),
    });

    if let Some(address) = wallet {
        match state.chain.as_ref() {
            Some(chain) => {
                submit_rewards(
                    &state, chain.clone(), address, &form, &ipfs_hash, &inference, &mut blockchain,
                )
                .await?;
            }
            None => {
                warn!("wallet provided but blockchain service is unavailable");
                blockchain["reward_error"] = json!("Blockchain service not available");
            }
        }
    }

    Ok(Json(json!({
        "disease": inference.disease,
        "confidence": inference.confidence,
        "severity": inference.severity,
        "treatment": inference.treatment,
        "description": inference.description,
        "blockchain": blockchain,
        "metadata": {
            "crop_type": form.crop_type,
            "location": form.location,
            "coordinates": {
                "latitude": form.latitude,
                "longitude": form.longitude,
            },
            "file_size": bytes.len(),
            "filename": form.filename,
        },
    })))
}

async fn submit_rewards(
    state: &AppState,
    chain: Arc<crate::web3::ChainService>,
    address: Address,
    form: &UploadForm,
    ipfs_hash: &str,
    inference: &InferenceResult,
    blockchain: &mut Value,
) -> ApiResult<()> {
    let reward = calculate_token_reward(&inference.disease, inference.confidence);

    let photo_reward = chain.reward_photo_upload(address).await;
    blockchain["photo_reward"] = serde_json::to_value(&photo_reward)?;

    // Anything above the healthy bonus means a disease was detected.
    if reward.bonus_reward > HEALTHY_BONUS {
        let disease_reward = chain
            .reward_disease_detection(address, reward.is_early_detection, inference.disease.clone())
            .await;
        blockchain["disease_reward"] = serde_json::to_value(&disease_reward)?;
    }

    if state.config.server.enable_chainlink_verification {
        let verification = chain
            .request_photo_analysis(
                state.config.server.public_url.clone(),
                ipfs_hash.to_string(),
                form.crop_type.clone(),
                form.location.clone(),
                form.latitude.map(|v| v.to_string()).unwrap_or_default(),
                form.longitude.map(|v| v.to_string()).unwrap_or_default(),
            )
            .await;
        blockchain["chainlink_verification"] = serde_json::to_value(&verification)?;
    }

    Ok(())
}

/// `POST /predict` — bare inference without any blockchain involvement.
pub async fn predict(
    Extension(state): Extension<Arc<AppState>>,
    multipart: Multipart,
) -> ApiResult<Json<InferenceResult>> {
    let form = parse_upload(multipart).await?;
    let bytes = validated_file(&form)?;
    Ok(Json(state.detector.predict(bytes)))
}
