use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    /// Quiet period before a mutated session is persisted.
    pub autosave_debounce_ms: u64,
    pub entitlement_mode: EntitlementMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntitlementMode {
    /// Every key may run the calculator.
    Open,
    /// Initialize/fast-forward require an active entitlement row.
    Enforced,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let autosave_debounce_ms = env_map
            .get("AUTOSAVE_DEBOUNCE_MS")
            .map(|s| s.as_str())
            .unwrap_or("1000")
            .parse::<u64>()
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "AUTOSAVE_DEBOUNCE_MS".to_string(),
                    "must be a valid u64".to_string(),
                )
            })?;

        let entitlement_mode = match env_map
            .get("ENTITLEMENT_MODE")
            .map(|s| s.as_str())
            .unwrap_or("open")
        {
            "open" => EntitlementMode::Open,
            "enforced" => EntitlementMode::Enforced,
            other => {
                return Err(ConfigError::InvalidValue(
                    "ENTITLEMENT_MODE".to_string(),
                    format!("must be open or enforced, got {}", other),
                ))
            }
        };

        Ok(Config {
            port,
            database_path,
            autosave_debounce_ms,
            entitlement_mode,
        })
    }
}
