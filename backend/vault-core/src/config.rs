//! Bridge configuration with JSON persistence.

use crate::error::ConfigError;
use crate::NATIVE_LIBRARY_FILE_NAME;

use common::ErrorLocation;

use std::panic::Location;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::info;
use serde::{Deserialize, Serialize};

const CONFIG_FILE_NAME: &str = "bridge.json";

/// Longest accepted readiness timeout (ms).
const READY_TIMEOUT_MAX_MS: u64 = 600_000;

/// Longest accepted progress-throttle interval (ms).
const PROGRESS_INTERVAL_MAX_MS: u64 = 60_000;

/// Configuration of one [`DecryptBridge`](crate::DecryptBridge).
///
/// Missing fields fall back to defaults on load; an existing but corrupted
/// file is an error, not a silent reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Location of the vendor decryption library. No discovery heuristics
    /// are applied: the path (or bare file name, resolved by the platform
    /// loader) is used as given.
    #[serde(default = "default_library_path")]
    pub library_path: PathBuf,

    /// How long a starting worker may take to signal readiness.
    #[serde(default = "default_ready_timeout_ms")]
    pub ready_timeout_ms: u64,

    /// Minimum spacing between non-forced progress messages. The first and
    /// terminal steps of a task always pass regardless. Zero disables the
    /// throttle.
    #[serde(default = "default_progress_interval_ms")]
    pub progress_interval_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            library_path: default_library_path(),
            ready_timeout_ms: default_ready_timeout_ms(),
            progress_interval_ms: default_progress_interval_ms(),
        }
    }
}

fn default_library_path() -> PathBuf {
    PathBuf::from(NATIVE_LIBRARY_FILE_NAME)
}
fn default_ready_timeout_ms() -> u64 {
    10_000
}
fn default_progress_interval_ms() -> u64 {
    100
}

impl BridgeConfig {
    /// Config with defaults and an explicit library path.
    pub fn new(library_path: impl Into<PathBuf>) -> Self {
        Self {
            library_path: library_path.into(),
            ..Self::default()
        }
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }

    /// Load config from `{config_dir}/bridge.json`.
    ///
    /// # Returns
    ///
    /// Returns `Ok(BridgeConfig)` with defaults if the file is missing.
    /// Returns `Err(ConfigError)` if the file exists but is unreadable,
    /// corrupted or invalid.
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            info!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents =
            std::fs::read_to_string(&config_path).map_err(|e| ConfigError::Read {
                path: config_path.clone(),
                location: ErrorLocation::from(Location::caller()),
                source: e,
            })?;

        let config: BridgeConfig =
            serde_json::from_str(&contents).map_err(|e| ConfigError::Parse {
                path: config_path.clone(),
                reason: e.to_string(),
                location: ErrorLocation::from(Location::caller()),
            })?;

        config.validate()?;

        info!("Config loaded from {}", config_path.display());
        Ok(config)
    }

    /// Save config to `{config_dir}/bridge.json` using atomic write.
    ///
    /// Uses temp file + rename for atomicity (no corruption on crash).
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        std::fs::create_dir_all(config_dir).map_err(|e| ConfigError::Write {
            path: config_dir.to_path_buf(),
            location: ErrorLocation::from(Location::caller()),
            source: e,
        })?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let temp_path = config_dir.join(format!("{CONFIG_FILE_NAME}.tmp"));

        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::Serialize {
            reason: e.to_string(),
            location: ErrorLocation::from(Location::caller()),
        })?;

        std::fs::write(&temp_path, json).map_err(|e| ConfigError::Write {
            path: temp_path.clone(),
            location: ErrorLocation::from(Location::caller()),
            source: e,
        })?;

        // Atomic rename (POSIX guarantees atomicity)
        std::fs::rename(&temp_path, &config_path).map_err(|e| ConfigError::Write {
            path: config_path.clone(),
            location: ErrorLocation::from(Location::caller()),
            source: e,
        })?;

        info!("Config saved to {}", config_path.display());
        Ok(())
    }

    /// Validate config values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.library_path.as_os_str().is_empty() {
            return Err(ConfigError::Validation {
                reason: "library_path cannot be empty".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        if self.ready_timeout_ms == 0 || self.ready_timeout_ms > READY_TIMEOUT_MAX_MS {
            return Err(ConfigError::Validation {
                reason: format!(
                    "Invalid ready_timeout_ms: {} (must be 1-{READY_TIMEOUT_MAX_MS})",
                    self.ready_timeout_ms
                ),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        if self.progress_interval_ms > PROGRESS_INTERVAL_MAX_MS {
            return Err(ConfigError::Validation {
                reason: format!(
                    "Invalid progress_interval_ms: {} (must be 0-{PROGRESS_INTERVAL_MAX_MS})",
                    self.progress_interval_ms
                ),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(())
    }
}
