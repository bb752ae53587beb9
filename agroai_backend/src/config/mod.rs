//! Runtime configuration.
//!
//! A JSON config file with per-field environment fallback, so deployments
//! can run from a mounted file, plain environment variables, or a mix.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_CONFIG_PATH: &str = "config/agroai.json";
pub const DEFAULT_RPC_URL: &str = "https://sepolia.infura.io/v3/";
pub const DEFAULT_IPFS_ENDPOINT: &str = "https://ipfs.infura.io:5001";
pub const DEFAULT_GAS_LIMIT: u64 = 500_000;
pub const DEFAULT_GAS_PRICE: u64 = 20_000_000_000; // 20 gwei
pub const DEFAULT_CONFIRMATION_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_PORT: u16 = 5000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub web3: Web3Config,
    #[serde(default)]
    pub contracts: ContractsConfig,
    #[serde(default)]
    pub ipfs: IpfsConfig,
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub ai: AiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Web3Config {
    pub rpc_url: String,
    pub private_key: String,
    pub gas_limit: u64,
    pub gas_price: u64,
    /// How long to wait for a transaction receipt before reporting an
    /// unknown outcome.
    pub confirmation_timeout_secs: u64,
}

impl Default for Web3Config {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            private_key: String::new(),
            gas_limit: DEFAULT_GAS_LIMIT,
            gas_price: DEFAULT_GAS_PRICE,
            confirmation_timeout_secs: DEFAULT_CONFIRMATION_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractsConfig {
    pub agro_token: String,
    pub agro_core: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IpfsConfig {
    pub project_id: Option<String>,
    pub project_secret: Option<String>,
    pub endpoint: String,
}

impl Default for IpfsConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            project_secret: None,
            endpoint: DEFAULT_IPFS_ENDPOINT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    /// Advertised base URL handed to the oracle verification request.
    pub public_url: String,
    pub enable_chainlink_verification: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            public_url: format!("http://localhost:{DEFAULT_PORT}"),
            enable_chainlink_verification: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub model_path: Option<String>,
}

impl Config {
    /// Load from the file named by `AGROAI_CONFIG` (default
    /// `config/agroai.json`), then let environment variables override
    /// individual fields. A missing file is not an error; a malformed one is.
    pub fn load() -> Result<Self> {
        let path = env::var("AGROAI_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = if Path::new(&path).exists() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    fn apply_env(&mut self) {
        override_string(&mut self.web3.rpc_url, "SEPOLIA_RPC_URL");
        override_string(&mut self.web3.private_key, "PRIVATE_KEY");
        override_parsed(&mut self.web3.gas_limit, "GAS_LIMIT");
        override_parsed(&mut self.web3.gas_price, "GAS_PRICE");
        override_parsed(&mut self.web3.confirmation_timeout_secs, "CONFIRMATION_TIMEOUT");
        override_string(&mut self.contracts.agro_token, "AGRO_TOKEN_ADDRESS");
        override_string(&mut self.contracts.agro_core, "AGRO_CORE_ADDRESS");
        override_optional(&mut self.ipfs.project_id, "IPFS_PROJECT_ID");
        override_optional(&mut self.ipfs.project_secret, "IPFS_PROJECT_SECRET");
        override_string(&mut self.ipfs.endpoint, "IPFS_ENDPOINT");
        override_optional(&mut self.weather.api_key, "WEATHER_API_KEY");
        override_parsed(&mut self.server.port, "PORT");
        override_string(&mut self.server.public_url, "PUBLIC_URL");
        override_optional(&mut self.ai.model_path, "MODEL_PATH");
    }
}

fn override_string(field: &mut String, var: &str) {
    if let Ok(value) = env::var(var) {
        if !value.is_empty() {
            *field = value;
        }
    }
}

fn override_optional(field: &mut Option<String>, var: &str) {
    if let Ok(value) = env::var(var) {
        if !value.is_empty() {
            *field = Some(value);
        }
    }
}

fn override_parsed<T: FromStr>(field: &mut T, var: &str) {
    if let Ok(value) = env::var(var) {
        if let Ok(parsed) = value.parse() {
            *field = parsed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.web3.gas_limit, DEFAULT_GAS_LIMIT);
        assert_eq!(
            config.web3.confirmation_timeout_secs,
            DEFAULT_CONFIRMATION_TIMEOUT_SECS
        );
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.ipfs.endpoint, DEFAULT_IPFS_ENDPOINT);
        assert!(config.web3.private_key.is_empty());
        assert!(!config.server.enable_chainlink_verification);
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_sections() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"web3": {{"gas_limit": 750000}}, "contracts": {{"agro_token": "0xabc"}}}}"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.web3.gas_limit, 750_000);
        assert_eq!(config.web3.gas_price, DEFAULT_GAS_PRICE);
        assert_eq!(config.contracts.agro_token, "0xabc");
        assert_eq!(config.server.port, DEFAULT_PORT);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(Config::from_file(file.path()).is_err());
    }

    #[test]
    fn env_overrides_file_values() {
        env::set_var("AGROAI_TEST_GAS_LIMIT", "900000");
        let mut limit = DEFAULT_GAS_LIMIT;
        override_parsed(&mut limit, "AGROAI_TEST_GAS_LIMIT");
        assert_eq!(limit, 900_000);
        env::remove_var("AGROAI_TEST_GAS_LIMIT");

        let mut key = None;
        override_optional(&mut key, "AGROAI_TEST_UNSET_VAR");
        assert!(key.is_none());
    }
}
