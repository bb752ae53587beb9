//! Axum router and shared application state.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Router,
};
use log::info;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};

use super::handlers;
use super::validation::MAX_FILE_SIZE;
use crate::ai_engine::DiseaseDetector;
use crate::config::Config;
use crate::ipfs::IpfsClient;
use crate::weather::WeatherClient;
use crate::web3::ChainService;

/// Shared, request-scoped application state.
///
/// The chain service is optional: without signing credentials the backend
/// runs in degraded mode and every blockchain feature reports unavailable.
pub struct AppState {
    pub config: Config,
    pub chain: Option<Arc<ChainService>>,
    pub ipfs: Arc<IpfsClient>,
    pub detector: Arc<DiseaseDetector>,
    pub weather: Arc<WeatherClient>,
    pub alerts: RwLock<Vec<handlers::alerts::CommunityAlert>>,
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::status::health))
        .route("/blockchain-status", get(handlers::status::blockchain_status))
        .route("/detect-enhanced", post(handlers::detection::detect_enhanced))
        .route("/predict", post(handlers::detection::predict))
        .route("/user-stats/:wallet_address", get(handlers::stats::user_stats))
        .route("/calculate-discount", post(handlers::purchases::calculate_discount_quote))
        .route("/process-purchase", post(handlers::purchases::process_purchase))
        .route("/community-alerts", get(handlers::alerts::community_alerts))
        .route("/weather/:location", get(handlers::weather::current_weather))
        // Leave headroom above the per-file cap for multipart framing.
        .layer(DefaultBodyLimit::max(MAX_FILE_SIZE + 64 * 1024))
        .layer(Extension(state))
        .layer(cors)
}

pub async fn run(state: Arc<AppState>, port: u16) -> anyhow::Result<()> {
    let app = router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("AgroAI backend listening on {addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
