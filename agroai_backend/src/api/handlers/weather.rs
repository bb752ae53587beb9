//! Weather conditions for disease-risk context.

use axum::extract::Path;
use axum::{Extension, Json};
use std::sync::Arc;

use crate::api::errors::{ApiError, ApiResult};
use crate::api::server::AppState;
use crate::weather::{WeatherError, WeatherReport};

/// `GET /weather/:location`
pub async fn current_weather(
    Extension(state): Extension<Arc<AppState>>,
    Path(location): Path<String>,
) -> ApiResult<Json<WeatherReport>> {
    let report = state.weather.current(&location).await.map_err(|e| match e {
        WeatherError::NotConfigured => {
            ApiError::service_unavailable("Weather service not configured")
        }
        WeatherError::NotFound => ApiError::not_found("Weather data not available for location"),
        other => ApiError::service_unavailable(&other.to_string()),
    })?;
    Ok(Json(report))
}
