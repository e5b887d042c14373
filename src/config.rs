//! Config layer (spec §2 layer J / §6 paths): built-in defaults, overlaid
//! by `~/<data-dir>/taskctl/config.json`, overlaid by environment
//! variables — the latter always win.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const ENV_DB_PATH: &str = "TASKCTL_DB_PATH";
const ENV_LOG_LEVEL: &str = "TASKCTL_LOG_LEVEL";
const ENV_ANTHROPIC_KEY: &str = "ANTHROPIC_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub log_level: Option<String>,
    #[serde(default)]
    pub max_concurrency: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub log_path: PathBuf,
    pub log_level: String,
    pub anthropic_api_key: Option<String>,
    pub default_max_concurrency: u32,
}

fn data_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|d| d.join("taskctl"))
        .ok_or_else(|| Error::Invalid("could not determine platform data directory".into()))
}

fn config_file_path() -> Result<PathBuf> {
    Ok(data_dir()?.join("config.json"))
}

fn load_config_file() -> ConfigFile {
    config_file_path()
        .ok()
        .and_then(|p| std::fs::read_to_string(p).ok())
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default()
}

impl Config {
    /// Resolve the effective configuration: defaults, then config.json,
    /// then environment overrides (§6 "Override:" list).
    pub fn load() -> Result<Self> {
        let base = data_dir()?;
        let file = load_config_file();

        let db_path = std::env::var(ENV_DB_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| base.join("taskctl.db"));

        let log_path = base.join("logs");

        let log_level = std::env::var(ENV_LOG_LEVEL)
            .ok()
            .or(file.log_level)
            .unwrap_or_else(|| "info".to_string());

        let anthropic_api_key = std::env::var(ENV_ANTHROPIC_KEY).ok();

        Ok(Self {
            db_path,
            log_path,
            log_level,
            anthropic_api_key,
            default_max_concurrency: file.max_concurrency.unwrap_or(4),
        })
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        if let Some(parent) = self.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::create_dir_all(&self.log_path)?;
        Ok(())
    }
}
