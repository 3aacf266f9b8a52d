use std::path::PathBuf;
use tracing::Level;
use url::Url;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub api_base_url: Url,
    pub voice_url: Url,
    pub output_dir: PathBuf,
    pub segment_secs: u64,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let api_base_str = std::env::var("BANKVOICE_API_URL")
            .map_err(|_| ConfigError::MissingVar("BANKVOICE_API_URL".to_string()))?;
        let api_base_url = Url::parse(&api_base_str).map_err(|e| {
            ConfigError::InvalidValue("BANKVOICE_API_URL".to_string(), e.to_string())
        })?;
        if !matches!(api_base_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidValue(
                "BANKVOICE_API_URL".to_string(),
                format!("'{api_base_str}' is not an http(s) url"),
            ));
        }

        let voice_url = match std::env::var("BANKVOICE_VOICE_URL") {
            Ok(raw) => Url::parse(&raw).map_err(|e| {
                ConfigError::InvalidValue("BANKVOICE_VOICE_URL".to_string(), e.to_string())
            })?,
            Err(_) => derive_voice_url(&api_base_url)?,
        };
        if !matches!(voice_url.scheme(), "ws" | "wss") {
            return Err(ConfigError::InvalidValue(
                "BANKVOICE_VOICE_URL".to_string(),
                format!("'{voice_url}' is not a ws(s) url"),
            ));
        }

        let output_dir = std::env::var("BANKVOICE_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./replies"));

        let segment_secs_str =
            std::env::var("BANKVOICE_SEGMENT_SECS").unwrap_or_else(|_| "4".to_string());
        let segment_secs = segment_secs_str
            .parse::<u64>()
            .ok()
            .filter(|&secs| secs >= 1)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "BANKVOICE_SEGMENT_SECS".to_string(),
                    format!("'{segment_secs_str}' is not a positive number of seconds"),
                )
            })?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{log_level_str}' is not a valid log level"),
            )
        })?;

        Ok(Self {
            api_base_url,
            voice_url,
            output_dir,
            segment_secs,
            log_level,
        })
    }
}

/// Derives the voice WebSocket endpoint from the HTTP base: same host,
/// `ws`/`wss` scheme, `/voice` path.
fn derive_voice_url(api_base_url: &Url) -> Result<Url, ConfigError> {
    let mut url = api_base_url.clone();
    let scheme = if api_base_url.scheme() == "https" {
        "wss"
    } else {
        "ws"
    };
    url.set_scheme(scheme).map_err(|_| {
        ConfigError::InvalidValue(
            "BANKVOICE_API_URL".to_string(),
            format!("cannot derive a voice url from '{api_base_url}'"),
        )
    })?;
    url.set_path("/voice");
    Ok(url)
}
