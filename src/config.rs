//! Application-level configuration loading, including the playback sync tuning knobs.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "LOFI_LOUNGE_BACK_CONFIG_PATH";

/// Drift (seconds) a member tolerates before seeking to the admin's position.
const DEFAULT_SYNC_THRESHOLD_SECS: f64 = 2.0;
/// Interval (milliseconds) between the admin's periodic playback announcements.
const DEFAULT_BROADCAST_INTERVAL_MS: u64 = 1500;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    sync_threshold_secs: f64,
    broadcast_interval_ms: u64,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to baked-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        threshold = config.sync_threshold_secs,
                        interval_ms = config.broadcast_interval_ms,
                        "loaded sync tuning from config"
                    );
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Drift tolerance in seconds for member-side reconciliation.
    pub fn sync_threshold_secs(&self) -> f64 {
        self.sync_threshold_secs
    }

    /// Interval between the admin's periodic `playbackState` announcements.
    pub fn broadcast_interval(&self) -> Duration {
        Duration::from_millis(self.broadcast_interval_ms)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sync_threshold_secs: DEFAULT_SYNC_THRESHOLD_SECS,
            broadcast_interval_ms: DEFAULT_BROADCAST_INTERVAL_MS,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    sync_threshold_secs: Option<f64>,
    broadcast_interval_ms: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            sync_threshold_secs: value
                .sync_threshold_secs
                .filter(|secs| secs.is_finite() && *secs >= 0.0)
                .unwrap_or(DEFAULT_SYNC_THRESHOLD_SECS),
            broadcast_interval_ms: value
                .broadcast_interval_ms
                .filter(|ms| *ms > 0)
                .unwrap_or(DEFAULT_BROADCAST_INTERVAL_MS),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_fields_missing() {
        let raw = RawConfig {
            sync_threshold_secs: None,
            broadcast_interval_ms: None,
        };
        let config: AppConfig = raw.into();
        assert_eq!(config.sync_threshold_secs(), DEFAULT_SYNC_THRESHOLD_SECS);
        assert_eq!(
            config.broadcast_interval(),
            Duration::from_millis(DEFAULT_BROADCAST_INTERVAL_MS)
        );
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let raw = RawConfig {
            sync_threshold_secs: Some(-1.0),
            broadcast_interval_ms: Some(0),
        };
        let config: AppConfig = raw.into();
        assert_eq!(config.sync_threshold_secs(), DEFAULT_SYNC_THRESHOLD_SECS);
        assert_eq!(
            config.broadcast_interval(),
            Duration::from_millis(DEFAULT_BROADCAST_INTERVAL_MS)
        );
    }

    #[test]
    fn explicit_values_are_kept() {
        let raw = RawConfig {
            sync_threshold_secs: Some(0.5),
            broadcast_interval_ms: Some(2000),
        };
        let config: AppConfig = raw.into();
        assert_eq!(config.sync_threshold_secs(), 0.5);
        assert_eq!(config.broadcast_interval(), Duration::from_millis(2000));
    }
}
