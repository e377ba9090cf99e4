//! TOML-based application configuration.
//!
//! Stores:
//! - Scrub tuning (pan threshold, skip fraction)
//! - Alert loop replay interval
//! - Length of one time unit in real milliseconds
//! - Duration options offered by the pickers
//!
//! Configuration is stored at `~/.config/meditation-timer/config.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;
use crate::timer::{ClockTuning, ControllerSettings, DurationOptions};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClockConfig {
    #[serde(default = "default_pan_threshold")]
    pub pan_threshold: f64,
    #[serde(default = "default_rewind_skip_fraction")]
    pub rewind_skip_fraction: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertConfig {
    #[serde(default = "default_repeat_interval_units")]
    pub repeat_interval_units: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickConfig {
    /// Real milliseconds per time unit.
    #[serde(default = "default_unit_ms")]
    pub unit_ms: u64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/meditation-timer/config.toml`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub clock: ClockConfig,
    #[serde(default)]
    pub alert: AlertConfig,
    #[serde(default)]
    pub tick: TickConfig,
    #[serde(default)]
    pub options: DurationOptions,
}

fn default_pan_threshold() -> f64 {
    3.0
}
fn default_rewind_skip_fraction() -> f64 {
    0.0001
}
fn default_repeat_interval_units() -> u32 {
    3
}
fn default_unit_ms() -> u64 {
    1000
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            pan_threshold: default_pan_threshold(),
            rewind_skip_fraction: default_rewind_skip_fraction(),
        }
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            repeat_interval_units: default_repeat_interval_units(),
        }
    }
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            unit_ms: default_unit_ms(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;
            let new_value = match existing {
                serde_json::Value::Number(_) => {
                    if let Ok(n) = value.parse::<u64>() {
                        serde_json::Value::Number(n.into())
                    } else {
                        value
                            .parse::<f64>()
                            .ok()
                            .and_then(serde_json::Number::from_f64)
                            .map(serde_json::Value::Number)
                            .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                    }
                }
                serde_json::Value::Array(_) => {
                    serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                }
                _ => serde_json::Value::String(value.into()),
            };
            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, fails
    /// validation, or defaults cannot be written.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let load_failed = |message: String| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message,
        };
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| load_failed(e.to_string()))?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(load_failed(e.to_string())),
        }
    }

    /// Persist to the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(error = %e, "falling back to default configuration");
                Self::default()
            }
        }
    }

    /// Reject values the engine cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first bad key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, message: &str| -> Result<(), ConfigError> {
            Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message: message.to_string(),
            })
        };
        if !self.clock.pan_threshold.is_finite() || self.clock.pan_threshold < 0.0 {
            return invalid("clock.pan_threshold", "must be a finite, non-negative number");
        }
        if !self.clock.rewind_skip_fraction.is_finite() || self.clock.rewind_skip_fraction <= 0.0 {
            return invalid("clock.rewind_skip_fraction", "must be a finite, positive number");
        }
        if self.alert.repeat_interval_units == 0 {
            return invalid("alert.repeat_interval_units", "must be at least 1");
        }
        if self.tick.unit_ms == 0 {
            return invalid("tick.unit_ms", "must be at least 1");
        }
        if self.options.meditate_minutes.is_empty() {
            return invalid("options.meditate_minutes", "must offer at least one duration");
        }
        if self.options.rest_minutes.is_empty() {
            return invalid("options.rest_minutes", "must offer at least one duration");
        }
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key, in memory only.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the result fails validation. `self` is unchanged on error.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    pub fn clock_tuning(&self) -> ClockTuning {
        ClockTuning {
            pan_threshold: self.clock.pan_threshold,
            rewind_skip_fraction: self.clock.rewind_skip_fraction,
        }
    }

    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            unit: Duration::from_millis(self.tick.unit_ms),
            alert_repeat_units: self.alert.repeat_interval_units,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
        assert_eq!(parsed.options.meditate_minutes, vec![5, 10, 15]);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[tick]\nunit_ms = 50\n").unwrap();
        assert_eq!(parsed.tick.unit_ms, 50);
        assert_eq!(parsed.alert.repeat_interval_units, 3);
        assert_eq!(parsed.clock_tuning(), ClockTuning::default());
    }

    #[test]
    fn get_by_dotted_key() {
        let cfg = Config::default();
        assert_eq!(cfg.get("alert.repeat_interval_units").as_deref(), Some("3"));
        assert_eq!(cfg.get("clock.pan_threshold").as_deref(), Some("3.0"));
        assert!(cfg.get("nope").is_none());
    }

    #[test]
    fn set_by_dotted_key() {
        let mut cfg = Config::default();
        cfg.set("tick.unit_ms", "250").unwrap();
        cfg.set("clock.rewind_skip_fraction", "0.001").unwrap();
        cfg.set("options.rest_minutes", "[0, 10]").unwrap();
        assert_eq!(cfg.controller_settings().unit, Duration::from_millis(250));
        assert_eq!(cfg.clock.rewind_skip_fraction, 0.001);
        assert_eq!(cfg.options.rest_minutes, vec![0, 10]);
    }

    #[test]
    fn set_rejects_unknown_and_invalid() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("tick.nope", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(
            cfg.set("tick.unit_ms", "0"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(cfg.set("tick.unit_ms", "fast").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn set_rejects_zero_skip_fraction() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("clock.rewind_skip_fraction", "0"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(cfg.set("clock.rewind_skip_fraction", "-0.5").is_err());
        assert_eq!(cfg.clock_tuning(), ClockTuning::default());
    }

    #[test]
    fn load_from_writes_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());

        let mut changed = cfg.clone();
        changed.set("alert.repeat_interval_units", "5").unwrap();
        changed.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().alert.repeat_interval_units, 5);
    }

    #[test]
    fn load_from_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "tick = \"soon\"").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }
}
