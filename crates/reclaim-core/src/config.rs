//! TOML-based application configuration.
//!
//! Stores local preferences: lockdown duration, nutrition defaults,
//! backend endpoint, and feedback toggles. Persistence and query
//! semantics for user data live in the backend; this file only holds
//! client-side knobs.
//!
//! Configuration is stored at `~/.config/reclaim/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;

/// Lockdown (focus session) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockdownConfig {
    /// Countdown length in seconds.
    #[serde(default = "default_lockdown_secs")]
    pub duration_secs: u64,
}

/// Nutrition defaults used before onboarding sets a personal target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NutritionConfig {
    #[serde(default = "default_protein_target")]
    pub default_protein_target_g: u32,
}

/// Backend endpoint. When absent the CLI runs against the local
/// file-backed store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub bearer_token: Option<String>,
}

/// Feedback configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub haptics: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/reclaim/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub lockdown: LockdownConfig,
    #[serde(default)]
    pub nutrition: NutritionConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

fn default_lockdown_secs() -> u64 {
    1800
}

fn default_protein_target() -> u32 {
    120
}

fn default_true() -> bool {
    true
}

impl Default for LockdownConfig {
    fn default() -> Self {
        Self {
            duration_secs: default_lockdown_secs(),
        }
    }
}

impl Default for NutritionConfig {
    fn default() -> Self {
        Self {
            default_protein_target_g: default_protein_target(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            haptics: default_true(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lockdown: Default::default(),
            nutrition: Default::default(),
            backend: Default::default(),
            notifications: Default::default(),
        }
    }
}

/// Returns `~/.config/reclaim[-dev]/` based on RECLAIM_ENV.
///
/// Set RECLAIM_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("RECLAIM_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("reclaim-dev")
    } else {
        base_dir.join("reclaim")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::LoadFailed {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}

impl Config {
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default path; missing file yields defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &PathBuf) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        toml::from_str(&raw).map_err(|e| ConfigError::ParseFailed(e.to_string()))
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &PathBuf) -> Result<(), ConfigError> {
        let raw = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(path, raw).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_missing_sections() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.lockdown.duration_secs, 1800);
        assert_eq!(config.nutrition.default_protein_target_g, 120);
        assert!(config.backend.base_url.is_none());
        assert!(config.notifications.haptics);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config: Config = toml::from_str(
            r#"
            [lockdown]
            duration_secs = 600
        "#,
        )
        .unwrap();
        assert_eq!(config.lockdown.duration_secs, 600);
        assert_eq!(config.nutrition.default_protein_target_g, 120);
    }

    #[test]
    fn save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.lockdown.duration_secs = 900;
        config.backend.base_url = Some("https://api.example.com/".to_string());
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.lockdown.duration_secs, 900);
        assert_eq!(
            loaded.backend.base_url.as_deref(),
            Some("https://api.example.com/")
        );
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.lockdown.duration_secs, 1800);
    }
}
