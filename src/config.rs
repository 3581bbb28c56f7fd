//! Configuration module - the three checkpoint-store directories, loaded
//! from `~/.reverter/config.toml` (or the platform config dir).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::reverter::checkpoint::IN_PROGRESS_DIR;

/// The three directories a [`crate::reverter::Reverter`] is built from.
/// All three keys are always populated and non-empty after construction —
/// either all three come from the config file, or all three fall back to
/// state-directory defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReverterConfig {
    /// Root for finalized permanent checkpoints and the in-progress one.
    pub backup: PathBuf,
    /// The single temporary checkpoint for this run.
    pub temp: PathBuf,
    /// The in-progress permanent checkpoint, typically `backup/<well-known name>`.
    pub progress: PathBuf,
}

impl Default for ReverterConfig {
    fn default() -> Self {
        let data_dir = directories::ProjectDirs::from("com", "letsencrypt", "reverter")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".reverter")
            });

        let backup = data_dir.join("backup");
        let progress = backup.join(IN_PROGRESS_DIR);
        let temp = data_dir.join("temp");

        Self {
            backup,
            temp,
            progress,
        }
    }
}

impl ReverterConfig {
    /// Load config from the default path, or fall back to defaults if
    /// absent or unparsable. Never errors.
    pub fn load() -> Self {
        Self::load_from(&Self::default_path()).unwrap_or_default()
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        let config: ReverterConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;

        Ok(config)
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path())
    }

    /// Save config to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;

        Ok(())
    }

    /// Default config path: `<platform config dir>/config.toml`, falling
    /// back to `~/.reverter/config.toml`.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "letsencrypt", "reverter")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".reverter")
                    .join("config.toml")
            })
    }

    /// Check if a config file exists at the default path.
    pub fn exists() -> bool {
        Self::default_path().exists()
    }

    /// Create a default config file if one doesn't exist yet.
    pub fn ensure_exists() -> Result<()> {
        let path = Self::default_path();
        if !path.exists() {
            let config = ReverterConfig::default();
            config.save_to(&path)?;
            tracing::info!("Created default config at {}", path.display());
        }
        Ok(())
    }
}
