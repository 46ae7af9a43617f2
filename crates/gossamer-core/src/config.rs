//! Configuration system for Gossamer.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $GOSSAMER_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/gossamer/config.toml
//!   3. ~/.config/gossamer/config.toml

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::admission::ATTEMPTS_TO_FIND_HAPPY_NONCE;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GossamerConfig {
    pub admission: AdmissionConfig,
    pub relay: RelayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdmissionConfig {
    /// Hops an admission proof must stay valid for. Search cost grows as 8^diameter.
    pub diameter: usize,
    /// Candidate nonces tried before a search gives up.
    pub max_attempts: u64,
    /// Spread the nonce search over all cores.
    pub parallel: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Hours an announcement stays in the seen-cache. Older epochs are rejected.
    pub cache_ttl_hours: u64,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            diameter: 4,
            max_attempts: ATTEMPTS_TO_FIND_HAPPY_NONCE,
            parallel: false,
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self { cache_ttl_hours: 2 }
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

pub fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("gossamer")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl GossamerConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::file_path())
    }

    /// Load from an explicit path, falling back to defaults if it is absent.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        Self::load_from_with(path, |key| std::env::var(key).ok())
    }

    /// `load_from` with the environment supplied by `lookup`.
    pub fn load_from_with(
        path: &Path,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(path)
                .map_err(|e| ConfigError::ReadFailed(path.to_path_buf(), e))?;
            Self::from_toml(&text).map_err(|e| ConfigError::ParseFailed(path.to_path_buf(), e))?
        } else {
            GossamerConfig::default()
        };
        config.apply_overrides(lookup);
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("GOSSAMER_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
            }
            let text = toml::to_string_pretty(&GossamerConfig::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(&path, text).map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    /// Apply GOSSAMER_* overrides. `lookup` is `std::env::var` outside tests.
    /// Values that fail to parse are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("GOSSAMER_ADMISSION__DIAMETER").and_then(|v| v.parse().ok()) {
            self.admission.diameter = v;
        }
        if let Some(v) = lookup("GOSSAMER_ADMISSION__MAX_ATTEMPTS").and_then(|v| v.parse().ok()) {
            self.admission.max_attempts = v;
        }
        if let Some(v) = lookup("GOSSAMER_ADMISSION__PARALLEL") {
            self.admission.parallel = v == "true" || v == "1";
        }
        if let Some(v) = lookup("GOSSAMER_RELAY__CACHE_TTL_HOURS").and_then(|v| v.parse().ok()) {
            self.relay.cache_ttl_hours = v;
        }
    }
}
