//! TOML-based application configuration.
//!
//! Stores local preferences including:
//! - Push delivery endpoint and timeout
//! - Log level
//! - Analytics lookback windows
//! - Currency display symbol
//! - Which user id may send admin broadcasts
//!
//! Configuration is stored at `~/.config/smokeless/config.toml`.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use super::data_dir;
use crate::error::ConfigError;
use crate::push::EXPO_PUSH_ENDPOINT;
use crate::stats::{DEFAULT_STREAK_LOOKBACK_DAYS, DEFAULT_ZERO_DAY_LOOKBACK_DAYS};

/// Push delivery configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_push_endpoint")]
    pub endpoint: Url,
    #[serde(default = "default_push_timeout")]
    pub timeout_secs: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default filter when SMOKELESS_LOG is unset (e.g. "warn", "smokeless_core=debug").
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Analytics windows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    #[serde(default = "default_streak_lookback")]
    pub streak_lookback_days: u32,
    #[serde(default = "default_zero_day_lookback")]
    pub zero_day_lookback_days: u32,
}

/// Currency display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyConfig {
    #[serde(default = "default_currency_symbol")]
    pub symbol: String,
}

/// Admin privileges.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminConfig {
    /// User id allowed to send broadcasts. Empty means nobody.
    #[serde(default)]
    pub user_id: String,
}

/// Environment variable that overrides `admin.user_id`.
pub const ADMIN_USER_ID_ENV: &str = "SMOKELESS_ADMIN_UID";

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/smokeless/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub push: PushConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub currency: CurrencyConfig,
    #[serde(default)]
    pub admin: AdminConfig,
}

fn default_true() -> bool {
    true
}
fn default_push_endpoint() -> Url {
    Url::parse(EXPO_PUSH_ENDPOINT).expect("EXPO_PUSH_ENDPOINT is a valid URL")
}
fn default_push_timeout() -> u64 {
    10
}
fn default_log_level() -> String {
    "warn".into()
}
fn default_streak_lookback() -> u32 {
    DEFAULT_STREAK_LOOKBACK_DAYS
}
fn default_zero_day_lookback() -> u32 {
    DEFAULT_ZERO_DAY_LOOKBACK_DAYS
}
fn default_currency_symbol() -> String {
    "₺".into()
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: default_push_endpoint(),
            timeout_secs: default_push_timeout(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            streak_lookback_days: default_streak_lookback(),
            zero_day_lookback_days: default_zero_day_lookback(),
        }
    }
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            symbol: default_currency_symbol(),
        }
    }
}

impl PushConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl AdminConfig {
    /// The admin user id, with SMOKELESS_ADMIN_UID taking precedence over the
    /// file. `None` when neither is set.
    pub fn resolved_user_id(&self) -> Option<String> {
        resolve_admin(std::env::var(ADMIN_USER_ID_ENV).ok(), &self.user_id)
    }
}

fn resolve_admin(from_env: Option<String>, configured: &str) -> Option<String> {
    from_env
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| Some(configured.trim().to_string()).filter(|v| !v.is_empty()))
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
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path,
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.clone(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(&path, content).map_err(|e| save_failed(e.to_string()))?;
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

    /// Set a config value by key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit the
    /// field's type.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Set a config value by key and save. Returns error if key is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to load config, using defaults");
            Self::default()
        })
    }
}
