//! OpenWeatherMap client used for disease-risk context.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const API_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("weather API key not configured")]
    NotConfigured,
    #[error("weather data not available for location")]
    NotFound,
    #[error("weather provider returned status {0}")]
    Status(StatusCode),
    #[error("weather request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Serialize)]
pub struct WeatherReport {
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub weather: String,
    pub wind_speed: f64,
    pub location: String,
}

#[derive(Debug, Deserialize)]
struct OwmResponse {
    main: OwmMain,
    #[serde(default)]
    weather: Vec<OwmCondition>,
    wind: OwmWind,
    name: String,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
    humidity: f64,
    pressure: f64,
}

#[derive(Debug, Deserialize)]
struct OwmCondition {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwmWind {
    speed: f64,
}

pub struct WeatherClient {
    http: reqwest::Client,
    api_key: Option<String>,
}

impl WeatherClient {
    pub fn new(api_key: Option<String>) -> Result<Self, WeatherError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { http, api_key })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Fetch current conditions for a named location.
    pub async fn current(&self, location: &str) -> Result<WeatherReport, WeatherError> {
        let api_key = self.api_key.as_deref().ok_or(WeatherError::NotConfigured)?;

        let response = self
            .http
            .get(API_URL)
            .query(&[("q", location), ("appid", api_key), ("units", "metric")])
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => return Err(WeatherError::NotFound),
            status => return Err(WeatherError::Status(status)),
        }

        let body: OwmResponse = response.json().await?;
        Ok(WeatherReport {
            temperature: body.main.temp,
            humidity: body.main.humidity,
            pressure: body.main.pressure,
            weather: body
                .weather
                .first()
                .map(|c| c.description.clone())
                .unwrap_or_else(|| "unknown".to_string()),
            wind_speed: body.wind.speed,
            location: body.name,
        })
    }
}
