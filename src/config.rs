use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub listen: String,
    pub interval_secs: u64,
    #[serde(default = "default_bot_name")]
    pub bot_name: String,
    #[serde(default)]
    pub assets: AssetsConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssetsConfig {
    #[serde(default = "default_font_path")]
    pub font_path: PathBuf,
    #[serde(default = "default_background_path")]
    pub background_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_bot_token_env")]
    pub bot_token_env: String,
    #[serde(default)]
    pub bot_token: Option<String>,
    #[serde(default)]
    pub allowed_chat_ids: Vec<i64>,
    #[serde(default = "default_rate_limit_per_minute")]
    pub rate_limit_per_minute: u32,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            font_path: default_font_path(),
            background_path: default_background_path(),
        }
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bot_token_env: default_bot_token_env(),
            bot_token: None,
            allowed_chat_ids: Vec::new(),
            rate_limit_per_minute: default_rate_limit_per_minute(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse YAML in {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },
    #[error("invalid configuration: {0}")]
    Validation(String),
}

impl Config {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let path_display = path_ref.display().to_string();
        let text = fs::read_to_string(path_ref).map_err(|source| ConfigError::Read {
            path: path_display.clone(),
            source,
        })?;

        let cfg: Config = serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path_display,
            source,
        })?;

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listen.trim().is_empty() {
            return Err(ConfigError::Validation("listen is required".to_string()));
        }
        if SocketAddr::from_str(&self.listen).is_err() {
            return Err(ConfigError::Validation(
                "listen must be a valid host:port socket address".to_string(),
            ));
        }
        if self.interval_secs < 1 {
            return Err(ConfigError::Validation(
                "interval_secs must be >= 1".to_string(),
            ));
        }
        if self.bot_name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "bot_name must not be empty".to_string(),
            ));
        }

        validate_assets(&self.assets)?;
        validate_telegram(&self.telegram)?;

        Ok(())
    }

    /// Label shown in the dashboard's backend badge.
    pub fn backend_label(&self) -> &'static str {
        if self.telegram.enabled {
            "telegram"
        } else {
            "standalone"
        }
    }

    pub fn example_yaml() -> &'static str {
        include_str!("../config.yaml.example")
    }
}

fn validate_assets(cfg: &AssetsConfig) -> Result<(), ConfigError> {
    if cfg.font_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "assets.font_path must not be empty".to_string(),
        ));
    }
    if cfg.background_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "assets.background_path must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_telegram(cfg: &TelegramConfig) -> Result<(), ConfigError> {
    if cfg.rate_limit_per_minute < 1 {
        return Err(ConfigError::Validation(
            "telegram.rate_limit_per_minute must be >= 1".to_string(),
        ));
    }
    if cfg.bot_token_env.trim().is_empty() {
        return Err(ConfigError::Validation(
            "telegram.bot_token_env must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn default_bot_name() -> String {
    "statuscard".to_string()
}

fn default_font_path() -> PathBuf {
    PathBuf::from("./assets/font.ttf")
}

fn default_background_path() -> PathBuf {
    PathBuf::from("./assets/background.png")
}

fn default_bot_token_env() -> String {
    "TELEGRAM_BOT_TOKEN".to_string()
}

const fn default_rate_limit_per_minute() -> u32 {
    30
}
