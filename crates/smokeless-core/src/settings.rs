//! Per-user settings record.
//!
//! One [`Settings`] document per user. It is created with defaults on first
//! load and afterwards only changed through [`SettingsPatch`] merges or a
//! reset back to defaults.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};
use crate::storage::Store;

pub const DEFAULT_DAILY_LIMIT: i64 = 20;
pub const DEFAULT_PACK_PRICE: f64 = 75.0;
pub const DEFAULT_CIGARETTES_PER_PACK: i64 = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub daily_limit: i64,
    pub pack_price: f64,
    pub cigarettes_per_pack: i64,
    pub user_name: String,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
}

impl Settings {
    /// Default settings stamped with `created_at = now`.
    pub fn defaults(now: i64) -> Self {
        Self {
            daily_limit: DEFAULT_DAILY_LIMIT,
            pack_price: DEFAULT_PACK_PRICE,
            cigarettes_per_pack: DEFAULT_CIGARETTES_PER_PACK,
            user_name: String::new(),
            created_at: now,
        }
    }

    /// Price of a single cigarette.
    ///
    /// A non-positive pack size is a configuration error and prices every
    /// cigarette at zero.
    pub fn price_per_unit(&self) -> f64 {
        if self.cigarettes_per_pack <= 0 || !self.pack_price.is_finite() {
            return 0.0;
        }
        self.pack_price / self.cigarettes_per_pack as f64
    }

    /// The daily limit clamped to zero.
    pub fn effective_daily_limit(&self) -> i64 {
        self.daily_limit.max(0)
    }

    pub fn apply(&mut self, patch: &SettingsPatch) {
        if let Some(v) = patch.daily_limit {
            self.daily_limit = v;
        }
        if let Some(v) = patch.pack_price {
            self.pack_price = v;
        }
        if let Some(v) = patch.cigarettes_per_pack {
            self.cigarettes_per_pack = v;
        }
        if let Some(ref v) = patch.user_name {
            self.user_name = v.clone();
        }
    }
}

/// A partial settings update. `None` fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_limit: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pack_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cigarettes_per_pack: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
}

impl SettingsPatch {
    /// Build a patch from raw text fields.
    ///
    /// # Errors
    /// Returns [`ValidationError::InvalidValue`] for the first field that is
    /// not a number.
    pub fn parse(
        daily_limit: Option<&str>,
        pack_price: Option<&str>,
        cigarettes_per_pack: Option<&str>,
        user_name: Option<&str>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            daily_limit: daily_limit.map(|v| parse_int("daily_limit", v)).transpose()?,
            pack_price: pack_price.map(|v| parse_price("pack_price", v)).transpose()?,
            cigarettes_per_pack: cigarettes_per_pack
                .map(|v| parse_int("cigarettes_per_pack", v))
                .transpose()?,
            user_name: user_name.map(|v| v.trim().to_string()),
        })
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn parse_int(field: &str, raw: &str) -> Result<i64, ValidationError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|e| ValidationError::InvalidValue {
            field: field.to_string(),
            message: format!("'{raw}' is not a whole number ({e})"),
        })
}

fn parse_price(field: &str, raw: &str) -> Result<f64, ValidationError> {
    let value = raw
        .trim()
        .replace(',', ".")
        .parse::<f64>()
        .map_err(|e| ValidationError::InvalidValue {
            field: field.to_string(),
            message: format!("'{raw}' is not a number ({e})"),
        })?;
    if !value.is_finite() {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            message: format!("'{raw}' is not a finite number"),
        });
    }
    Ok(value)
}

/// Load a user's settings, creating and persisting defaults if none exist.
///
/// A failed read falls back to defaults without writing anything. A failed
/// write of fresh defaults is logged and the defaults are still returned.
pub fn load<S: Store + ?Sized>(store: &S, user_id: &str, now: i64) -> Settings {
    match store.get_settings(user_id) {
        Ok(Some(settings)) => settings,
        Ok(None) => {
            let settings = Settings::defaults(now);
            if let Err(e) = store.put_settings(user_id, &settings) {
                tracing::warn!(user_id, error = %e, "failed to persist default settings");
            }
            settings
        }
        Err(e) => {
            tracing::warn!(user_id, error = %e, "failed to load settings, using defaults");
            Settings::defaults(now)
        }
    }
}

/// Merge `patch` into `current` and persist the result.
///
/// # Errors
/// Returns the store error if the write fails.
pub fn update<S: Store + ?Sized>(
    store: &S,
    user_id: &str,
    current: &Settings,
    patch: &SettingsPatch,
) -> Result<Settings> {
    let mut merged = current.clone();
    merged.apply(patch);
    store.put_settings(user_id, &merged)?;
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn first_load_persists_defaults() {
        let store = MemoryStore::new();
        let settings = load(&store, "u", 1_234);
        assert_eq!(settings, Settings::defaults(1_234));
        assert_eq!(store.get_settings("u").unwrap(), Some(settings));
    }

    #[test]
    fn existing_settings_are_returned() {
        let store = MemoryStore::new();
        let mut stored = Settings::defaults(1);
        stored.daily_limit = 5;
        store.put_settings("u", &stored).unwrap();
        assert_eq!(load(&store, "u", 99).daily_limit, 5);
    }

    #[test]
    fn read_failure_falls_back_to_defaults() {
        let store = MemoryStore::new();
        store.set_offline(true);
        assert_eq!(load(&store, "u", 7), Settings::defaults(7));
    }

    #[test]
    fn update_merges_only_given_fields() {
        let store = MemoryStore::new();
        let current = Settings::defaults(0);
        let patch = SettingsPatch {
            pack_price: Some(100.0),
            ..Default::default()
        };
        let merged = update(&store, "u", &current, &patch).unwrap();
        assert_eq!(merged.pack_price, 100.0);
        assert_eq!(merged.daily_limit, DEFAULT_DAILY_LIMIT);
        assert_eq!(store.get_settings("u").unwrap(), Some(merged));
    }

    #[test]
    fn update_surfaces_write_failure() {
        let store = MemoryStore::new();
        store.set_offline(true);
        let patch = SettingsPatch {
            daily_limit: Some(3),
            ..Default::default()
        };
        assert!(update(&store, "u", &Settings::defaults(0), &patch).is_err());
    }

    #[test]
    fn parse_rejects_non_numeric_input() {
        let err = SettingsPatch::parse(Some("ten"), None, None, None).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidValue { ref field, .. } if field == "daily_limit"));

        let err = SettingsPatch::parse(None, Some("NaN"), None, None).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidValue { ref field, .. } if field == "pack_price"));
    }

    #[test]
    fn parse_accepts_decimal_comma() {
        let patch = SettingsPatch::parse(Some(" 12 "), Some("82,5"), Some("20"), Some(" Ada ")).unwrap();
        assert_eq!(patch.daily_limit, Some(12));
        assert_eq!(patch.pack_price, Some(82.5));
        assert_eq!(patch.cigarettes_per_pack, Some(20));
        assert_eq!(patch.user_name.as_deref(), Some("Ada"));
    }

    #[test]
    fn price_per_unit_guards_zero_pack_size() {
        let mut settings = Settings::defaults(0);
        settings.pack_price = 100.0;
        assert_eq!(settings.price_per_unit(), 5.0);
        settings.cigarettes_per_pack = 0;
        assert_eq!(settings.price_per_unit(), 0.0);
        settings.cigarettes_per_pack = -4;
        assert_eq!(settings.price_per_unit(), 0.0);
    }
}
