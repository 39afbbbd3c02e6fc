//! Runtime configuration: defaults, then an optional TOML file, then `RESILIENT__*` env vars.

use crate::ai_bridge::{DEFAULT_CAPABLE_MODEL, DEFAULT_LIGHT_MODEL, OPENROUTER_API_BASE};
use crate::recommendation::{EngineSettings, MAX_WINDOW_DAYS};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_PATH_VAR: &str = "RESILIENT_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/resilient.toml";

const API_KEY_VARS: [&str; 2] = ["RESILIENT_AI_API_KEY", "OPENROUTER_API_KEY"];

#[derive(Debug, Clone, Deserialize)]
pub struct ResilienceConfig {
    pub storage_path: String,
    pub ai_api_url: String,
    pub ai_light_model: String,
    pub ai_capable_model: String,
    pub ai_timeout_secs: u64,
    pub recommendation_window_days: i64,
    pub high_intensity_threshold: u8,
    pub daily_reminder_hour: u32,
    pub daily_reminder_minute: u32,
    /// Optional TOML catalog replacing the built-in strategies.
    #[serde(default)]
    pub strategy_catalog_path: Option<String>,
    pub tick_rate_secs: u64,
}

impl ResilienceConfig {
    /// Loads from `RESILIENT_CONFIG` (default `config/resilient.toml`) when that file exists.
    pub fn load() -> Result<Self, config::ConfigError> {
        let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(Path::new(&path))
    }

    pub fn load_from(path: &Path) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .set_default("storage_path", "./data/resilient")?
            .set_default("ai_api_url", OPENROUTER_API_BASE)?
            .set_default("ai_light_model", DEFAULT_LIGHT_MODEL)?
            .set_default("ai_capable_model", DEFAULT_CAPABLE_MODEL)?
            .set_default("ai_timeout_secs", 30_i64)?
            .set_default("recommendation_window_days", 7_i64)?
            .set_default("high_intensity_threshold", 4_i64)?
            .set_default("daily_reminder_hour", 20_i64)?
            .set_default("daily_reminder_minute", 0_i64)?
            .set_default("tick_rate_secs", 60_i64)?;

        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else {
            builder
        };

        let built = builder
            .add_source(config::Environment::with_prefix("RESILIENT").separator("__"))
            .build()?;

        built.try_deserialize()
    }

    /// API key for the chat service, if any is set.
    pub fn api_key() -> Option<String> {
        API_KEY_VARS.iter().find_map(|name| env_opt_string(name))
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            window_days: self.recommendation_window_days.clamp(1, MAX_WINDOW_DAYS),
            high_intensity_threshold: self.high_intensity_threshold.clamp(1, 5),
            ai_timeout: Duration::from_secs(self.ai_timeout_secs.max(1)),
        }
    }

    pub fn mood_db_path(&self) -> PathBuf {
        Path::new(&self.storage_path).join("mood_log")
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_secs(self.tick_rate_secs.max(1))
    }
}

fn env_opt_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
