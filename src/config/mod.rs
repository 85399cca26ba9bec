use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::constants::{
    DEFAULT_CREATE_PROMPTS, DEFAULT_MAX_CONCURRENT, DEFAULT_POLL_INTERVAL_MS, MAX_CONFIG_BYTES,
};
use crate::error::AppError;
use crate::utils::paths;

/// Root sandbox configuration (stored in ~/.mugen/config.yaml)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SandboxConfig {
    #[serde(default)]
    pub connections: Connections,
    #[serde(default)]
    pub auto: AutoConfig,
    #[serde(default)]
    pub gemini: GeminiDefaults,
    /// Prompts used when auto-play creates a concept from scratch
    #[serde(default = "default_create_prompts")]
    pub create_prompts: Vec<String>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            connections: Connections::default(),
            auto: AutoConfig::default(),
            gemini: GeminiDefaults::default(),
            create_prompts: default_create_prompts(),
        }
    }
}

fn default_create_prompts() -> Vec<String> {
    DEFAULT_CREATE_PROMPTS.iter().map(|p| p.to_string()).collect()
}

/// Credentials for the generation service
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Connections {
    #[serde(default)]
    pub gemini_api_key: String,
}

impl Connections {
    pub fn has_api_key(&self) -> bool {
        !self.gemini_api_key.trim().is_empty()
    }

    /// Overlay `update` onto `self`, ignoring blank values
    pub fn merged(&self, update: &Connections) -> Connections {
        let mut merged = self.clone();
        if !update.gemini_api_key.trim().is_empty() {
            merged.gemini_api_key = update.gemini_api_key.clone();
        }
        merged
    }
}

/// Auto-play scheduler parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AutoConfig {
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Drop duplicate concepts from the board after every settled action
    #[serde(default = "default_true")]
    pub dedupe_after_action: bool,
    /// Fixed RNG seed for reproducible runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for AutoConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            dedupe_after_action: true,
            seed: None,
        }
    }
}

impl AutoConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn default_max_concurrent() -> usize { DEFAULT_MAX_CONCURRENT }
fn default_poll_interval_ms() -> u64 { DEFAULT_POLL_INTERVAL_MS }
fn default_true() -> bool { true }

/// Gemini endpoint and model names
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeminiDefaults {
    pub base_url: String,
    /// Model used for create, mix and split
    pub model: String,
    /// Cheap model used by the connection check
    pub probe_model: String,
}

impl Default for GeminiDefaults {
    fn default() -> Self {
        GeminiDefaults {
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-3-flash-preview".to_string(),
            probe_model: "gemini-flash-lite-latest".to_string(),
        }
    }
}

impl GeminiDefaults {
    /// Apply environment variable overrides
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = env::var("GEMINI_BASE_URL") {
            self.base_url = url;
        }
        if let Ok(model) = env::var("GEMINI_MODEL") {
            self.model = model;
        }
        self
    }
}

impl SandboxConfig {
    /// Apply environment variable overrides
    ///
    /// - GEMINI_API_KEY: connections.gemini_api_key
    /// - GEMINI_BASE_URL / GEMINI_MODEL: gemini endpoint and model
    /// - MUGEN_MAX_CONCURRENT / MUGEN_POLL_INTERVAL_MS: auto-play tuning
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = env::var("GEMINI_API_KEY") {
            self.connections = self.connections.merged(&Connections {
                gemini_api_key: key,
            });
        }
        self.gemini = self.gemini.with_env_overrides();
        if let Some(max) = env::var("MUGEN_MAX_CONCURRENT")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.auto.max_concurrent = max;
        }
        if let Some(ms) = env::var("MUGEN_POLL_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.auto.poll_interval_ms = ms;
        }
        self
    }

    /// Validate configuration constraints
    pub fn validate(&self) -> Result<(), AppError> {
        if self.auto.max_concurrent == 0 {
            return Err(AppError::config("auto.max_concurrent must be at least 1"));
        }
        if self.auto.poll_interval_ms == 0 {
            return Err(AppError::config("auto.poll_interval_ms must be at least 1"));
        }
        if self.create_prompts.iter().all(|p| p.trim().is_empty()) {
            return Err(AppError::config("create_prompts must contain a non-empty prompt"));
        }
        Ok(())
    }
}

/// Load sandbox configuration from the default location
///
/// A missing file yields the defaults. Environment overrides are applied last:
/// - GEMINI_API_KEY, GEMINI_BASE_URL, GEMINI_MODEL
/// - MUGEN_MAX_CONCURRENT, MUGEN_POLL_INTERVAL_MS
pub fn load_config() -> Result<SandboxConfig, AppError> {
    let path = paths::get_config_path().map_err(AppError::config)?;
    let config = read_config_file(&path)?.with_env_overrides();
    config.validate()?;
    Ok(config)
}

/// Load configuration from an explicit path without environment overrides
pub fn load_config_from(path: &Path) -> Result<SandboxConfig, AppError> {
    let config = read_config_file(path)?;
    config.validate()?;
    Ok(config)
}

fn read_config_file(path: &Path) -> Result<SandboxConfig, AppError> {
    if !path.exists() {
        return Ok(SandboxConfig::default());
    }

    // Size limit (DoS protection)
    let metadata = fs::metadata(path)?;
    if metadata.len() > MAX_CONFIG_BYTES {
        return Err(AppError::config("Config file exceeds 1MB limit")
            .with_details(path.display().to_string()));
    }

    let content = fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&content)?)
}

/// Save configuration to the default location
pub fn save_config(config: &SandboxConfig) -> Result<(), AppError> {
    let path = paths::get_config_path().map_err(AppError::config)?;
    save_config_to(config, &path)
}

/// Save configuration as YAML, creating parent directories as needed
pub fn save_config_to(config: &SandboxConfig, path: &Path) -> Result<(), AppError> {
    config.validate()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let yaml = serde_yaml::to_string(config)
        .map_err(|e| AppError::config(format!("Failed to serialize config: {}", e)))?;
    fs::write(path, yaml)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SandboxConfig::default();
        assert_eq!(config.auto.max_concurrent, 3);
        assert_eq!(config.auto.poll_interval_ms, 500);
        assert!(config.auto.dedupe_after_action);
        assert_eq!(config.create_prompts.len(), 5);
        assert!(!config.connections.has_api_key());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "auto:\n  poll_interval_ms: 3000\n";
        let config: SandboxConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.auto.poll_interval_ms, 3000);
        assert_eq!(config.auto.max_concurrent, 3);
        assert_eq!(config.gemini, GeminiDefaults::default());
        assert_eq!(config.create_prompts[0], "Universe");
    }

    #[test]
    fn test_merge_ignores_blank_values() {
        let stored = Connections {
            gemini_api_key: "stored-key".to_string(),
        };
        let blank = Connections {
            gemini_api_key: "   ".to_string(),
        };
        assert_eq!(stored.merged(&blank).gemini_api_key, "stored-key");

        let fresh = Connections {
            gemini_api_key: "fresh-key".to_string(),
        };
        assert_eq!(stored.merged(&fresh).gemini_api_key, "fresh-key");
    }

    #[test]
    fn test_validate_rejects_zero_cap() {
        let mut config = SandboxConfig::default();
        config.auto.max_concurrent = 0;
        assert!(config.validate().is_err());

        let mut config = SandboxConfig::default();
        config.create_prompts = vec![" ".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let mut config = SandboxConfig::default();
        config.connections.gemini_api_key = "secret".to_string();
        config.auto.seed = Some(7);
        save_config_to(&config, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_config_from(&dir.path().join("absent.yaml")).unwrap();
        assert_eq!(loaded, SandboxConfig::default());
    }

    #[test]
    fn test_oversized_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let padding = "#".repeat(MAX_CONFIG_BYTES as usize + 1);
        fs::write(&path, padding).unwrap();

        let err = load_config_from(&path).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::ConfigError);
    }
}
