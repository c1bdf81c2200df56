//! Application configuration loaded from a TOML file.
//!
//! Default location is `<config dir>/flashdeck/config.toml`. A missing file
//! is not an error: the defaults describe a local free-plan user. The provider
//! key can also come from `OPENAI_API_KEY`, which wins over the file.

use crate::models::{Entitlements, Feature, Identity, PlanTier};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Could not determine a config directory for this platform")]
    NoConfigDir,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub identity: IdentityConfig,
    pub ai: AiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("flashdeck.sqlite3"),
        }
    }
}

/// Stand-in for the identity/billing provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub user_id: Option<String>,
    pub plan: PlanTier,
    pub features: Vec<Feature>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            user_id: Some("local-user".to_string()),
            plan: PlanTier::Free,
            features: vec![Feature::ThreeDecksLimit, Feature::OneAiFlashcardsGeneration],
        }
    }
}

impl IdentityConfig {
    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.user_id.clone().filter(|id| !id.trim().is_empty()),
            entitlements: Entitlements::new(self.plan, self.features.iter().copied()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
    /// Total attempts when the provider returns malformed output
    pub max_attempts: u32,
    pub timeout_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.5,
            max_attempts: 2,
            timeout_secs: 60,
            api_key: None,
        }
    }
}

impl AppConfig {
    /// Loads the config from `path`, or from the default location when `None`
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => default_config_path()?,
        };

        let mut config = if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;
            toml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })?
        } else {
            tracing::info!("No config file at {:?}, using defaults", path);
            AppConfig::default()
        };

        config.apply_env(std::env::var(API_KEY_ENV).ok());
        Ok(config)
    }

    fn apply_env(&mut self, api_key: Option<String>) {
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            self.ai.api_key = Some(key);
        }
    }
}

pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join("flashdeck").join("config.toml"))
        .ok_or(ConfigError::NoConfigDir)
}
