use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "splitledger", "splitledger")
        .context("Could not determine project directories")
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct InsightConfig {
    pub base_url: String,
    pub model: String,
    /// Takes precedence over `api_key_env`.
    pub api_key: Option<String>,
    pub api_key_env: String,
    /// Language the summary is written in.
    pub language: String,
}

impl Default for InsightConfig {
    fn default() -> Self {
        InsightConfig {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-3-flash-preview".to_string(),
            api_key: None,
            api_key_env: "GEMINI_API_KEY".to_string(),
            language: "Chinese".to_string(),
        }
    }
}

impl InsightConfig {
    /// The configured key, else the value of `api_key_env`. Blank values
    /// count as missing.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|key| !key.trim().is_empty())
    }
}

fn default_currency_symbol() -> String {
    "¥".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AppConfig {
    pub data_path: Option<String>,
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
    #[serde(default)]
    pub insight: InsightConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            data_path: None,
            currency_symbol: default_currency_symbol(),
            insight: InsightConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads the config from the default location, or defaults when no
    /// config file has been created yet.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!("No config at {}, using defaults", config_path.display());
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.yaml"))
    }

    /// Directory holding the ledger store.
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        Ok(project_dirs()?.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
