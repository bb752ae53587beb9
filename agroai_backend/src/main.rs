use std::sync::Arc;

use anyhow::Result;
use log::{info, warn};
use tokio::sync::RwLock;

use agroai_backend::ai_engine::DiseaseDetector;
use agroai_backend::api::server::{self, AppState};
use agroai_backend::config::Config;
use agroai_backend::ipfs::IpfsClient;
use agroai_backend::weather::WeatherClient;
use agroai_backend::web3::ChainService;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::load()?;
    info!("starting AgroAI backend on port {}", config.server.port);

    let detector = Arc::new(DiseaseDetector::new(config.ai.model_path.as_deref()));
    if !detector.model_loaded() {
        warn!("no trained model available, using heuristic fallback predictions");
    }

    let ipfs = Arc::new(IpfsClient::new(&config.ipfs)?);
    let weather = Arc::new(WeatherClient::new(config.weather.api_key.clone())?);

    // Without chain credentials the service still serves detection and
    // weather; every blockchain feature reports unavailable instead.
    let chain = match ChainService::connect(&config).await {
        Ok(service) => Some(Arc::new(service)),
        Err(e) => {
            warn!("blockchain service unavailable: {e}");
            None
        }
    };

    let port = config.server.port;
    let state = Arc::new(AppState {
        config,
        chain,
        ipfs,
        detector,
        weather,
        alerts: RwLock::new(Vec::new()),
    });

    server::run(state, port).await
}
