use std::net::SocketAddr;
use std::time::Duration;

use tracing::Level;
use vesper_core::ResolverConfig;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// Absent key disables the classifier fallback entirely; the assistant
    /// still handles every built-in command.
    pub gemini_api_key: Option<String>,
    pub classifier_model: String,
    pub log_level: Level,
    pub wake_phrase: String,
    pub awake_secs: u64,
    pub dedup_secs: u64,
    pub compound_delay_ms: u64,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// This function will look for a `.env` file in the current directory
    /// and load the following variables:
    ///
    /// *   `BIND_ADDRESS`: The address and port to bind the server to. Defaults to "0.0.0.0:3000".
    /// *   `GEMINI_API_KEY`: (Optional) Key for the Gemini intent classifier. Without it,
    ///     unrecognized utterances get a canned "didn't catch that" reply.
    /// *   `CLASSIFIER_MODEL`: (Optional) The Gemini model name. Defaults to "gemini-2.0-flash".
    /// *   `WAKE_PHRASE`: (Optional) The wake word. Defaults to "vesper".
    /// *   `AWAKE_SECS`: (Optional) How long the session stays awake after activity. Defaults to 30.
    /// *   `DEDUP_SECS`: (Optional) Window for dropping repeated utterances. Defaults to 5.
    /// *   `COMPOUND_DELAY_MS`: (Optional) Pause between the halves of a compound command. Defaults to 2000.
    /// *   `RUST_LOG`: (Optional) The logging level. Defaults to "INFO".
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let gemini_api_key = std::env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty());
        let classifier_model =
            std::env::var("CLASSIFIER_MODEL").unwrap_or_else(|_| "gemini-2.0-flash".to_string());

        let wake_phrase = std::env::var("WAKE_PHRASE")
            .unwrap_or_else(|_| "vesper".to_string())
            .trim()
            .to_lowercase();
        if wake_phrase.is_empty() {
            return Err(ConfigError::InvalidValue(
                "WAKE_PHRASE".to_string(),
                "must not be empty".to_string(),
            ));
        }

        let awake_secs = parse_var("AWAKE_SECS", 30)?;
        let dedup_secs = parse_var("DEDUP_SECS", 5)?;
        let compound_delay_ms = parse_var("COMPOUND_DELAY_MS", 2000)?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            bind_address,
            gemini_api_key,
            classifier_model,
            log_level,
            wake_phrase,
            awake_secs,
            dedup_secs,
            compound_delay_ms,
        })
    }

    /// The resolver tunables derived from this configuration.
    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            wake_phrase: self.wake_phrase.clone(),
            awake_duration: Duration::from_secs(self.awake_secs),
            dedup_window: Duration::from_secs(self.dedup_secs),
            compound_delay: Duration::from_millis(self.compound_delay_ms),
            ..ResolverConfig::default()
        }
    }
}

fn parse_var(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}
