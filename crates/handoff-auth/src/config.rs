//! SSO broker configuration.
//!
//! The downstream application table and the token lifetime are the only
//! inputs the broker reads from configuration. Everything here is read-only
//! to the core.
//!
//! # Example (TOML)
//!
//! ```toml
//! [sso]
//! token_ttl_minutes = 5
//! store_timeout = "2s"
//! portal_url = "/dashboard"
//!
//! [sso.apps.cobit]
//! name = "COBIT Assessment"
//! url = "http://cobit.example.local/sso/callback"
//! enabled = true
//! ```

use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::types::AppDescriptor;

/// Longest accepted app key, matching the `app` column width.
pub const MAX_APP_KEY_LENGTH: usize = 50;

/// Longest accepted token lifetime (one day).
pub const MAX_TOKEN_TTL_MINUTES: u64 = 24 * 60;

/// Root SSO broker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SsoConfig {
    /// Token lifetime in minutes, counted from issuance.
    pub token_ttl_minutes: u64,

    /// Upper bound for a single token store call.
    #[serde(with = "humantime_serde")]
    pub store_timeout: Duration,

    /// Portal page the browser is sent back to when a redirect handoff
    /// targets an unavailable app.
    pub portal_url: String,

    /// Downstream applications keyed by app key, in display order.
    pub apps: IndexMap<String, AppEntry>,
}

impl Default for SsoConfig {
    fn default() -> Self {
        Self {
            token_ttl_minutes: 5,
            store_timeout: Duration::from_secs(2),
            portal_url: "/dashboard".to_string(),
            apps: IndexMap::new(),
        }
    }
}

impl SsoConfig {
    /// Token lifetime as a `time::Duration`, capped at
    /// [`MAX_TOKEN_TTL_MINUTES`] for configs that skipped [`Self::validate`].
    #[must_use]
    pub fn token_ttl(&self) -> time::Duration {
        let minutes = self.token_ttl_minutes.min(MAX_TOKEN_TTL_MINUTES);
        time::Duration::minutes(i64::try_from(minutes).unwrap_or(0))
    }

    /// Builds the app descriptors in configuration order.
    #[must_use]
    pub fn app_descriptors(&self) -> Vec<AppDescriptor> {
        self.apps
            .iter()
            .map(|(key, entry)| entry.to_descriptor(key))
            .collect()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token_ttl_minutes == 0 {
            return Err(ConfigError::invalid(
                "sso.token_ttl_minutes",
                "must be > 0",
            ));
        }
        if self.token_ttl_minutes > MAX_TOKEN_TTL_MINUTES {
            return Err(ConfigError::invalid(
                "sso.token_ttl_minutes",
                format!("must be <= {MAX_TOKEN_TTL_MINUTES}"),
            ));
        }
        if self.store_timeout.is_zero() {
            return Err(ConfigError::invalid("sso.store_timeout", "must be > 0"));
        }
        if self.portal_url.is_empty() {
            return Err(ConfigError::invalid("sso.portal_url", "must not be empty"));
        }
        for (key, entry) in &self.apps {
            if key.is_empty() || key.len() > MAX_APP_KEY_LENGTH {
                return Err(ConfigError::invalid(
                    format!("sso.apps.{key}"),
                    format!("app key must be 1..={MAX_APP_KEY_LENGTH} characters"),
                ));
            }
            if entry.enabled && entry.url.trim().is_empty() {
                return Err(ConfigError::invalid(
                    format!("sso.apps.{key}.url"),
                    "enabled apps require a callback url",
                ));
            }
        }
        Ok(())
    }
}

/// One downstream application entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppEntry {
    /// Display name shown on the portal dashboard.
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Callback URL the browser is redirected to with `?token=`.
    pub url: String,

    /// Heroicons name used by the dashboard.
    #[serde(default)]
    pub icon: Option<String>,

    #[serde(default)]
    pub color: Option<String>,

    /// Disabled apps behave exactly like unknown ones.
    #[serde(default)]
    pub enabled: bool,
}

impl AppEntry {
    fn to_descriptor(&self, key: &str) -> AppDescriptor {
        AppDescriptor {
            key: key.to_string(),
            name: self.name.clone(),
            description: self.description.clone(),
            callback_url: self.url.clone(),
            icon: self.icon.clone(),
            color: self.color.clone(),
            enabled: self.enabled,
        }
    }
}

/// Configuration validation error.
#[derive(Debug, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ConfigError {
    /// Dotted path of the offending field.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl ConfigError {
    /// Creates a validation error for `field`.
    #[must_use]
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(url: &str, enabled: bool) -> AppEntry {
        AppEntry {
            name: "Test".to_string(),
            description: None,
            url: url.to_string(),
            icon: None,
            color: None,
            enabled,
        }
    }

    #[test]
    fn test_defaults() {
        let config = SsoConfig::default();
        assert_eq!(config.token_ttl_minutes, 5);
        assert_eq!(config.token_ttl(), time::Duration::minutes(5));
        assert_eq!(config.store_timeout, Duration::from_secs(2));
        assert!(config.apps.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let config = SsoConfig {
            token_ttl_minutes: 0,
            ..SsoConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(err.field, "sso.token_ttl_minutes");
    }

    #[test]
    fn test_ttl_upper_bound() {
        let at_bound = SsoConfig {
            token_ttl_minutes: MAX_TOKEN_TTL_MINUTES,
            ..SsoConfig::default()
        };
        assert!(at_bound.validate().is_ok());
        assert_eq!(at_bound.token_ttl(), time::Duration::days(1));

        let huge = SsoConfig {
            token_ttl_minutes: 10_000_000_000,
            ..SsoConfig::default()
        };
        let err = huge.validate().unwrap_err();
        assert_eq!(err.field, "sso.token_ttl_minutes");
        assert_eq!(huge.token_ttl(), time::Duration::days(1));
    }

    #[test]
    fn test_enabled_app_without_url_rejected() {
        let mut config = SsoConfig::default();
        config.apps.insert("cobit".to_string(), entry("  ", true));
        assert!(config.validate().is_err());

        // Disabled entries may omit a usable url.
        config.apps.insert("cobit".to_string(), entry("", false));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_descriptors_keep_order() {
        let mut config = SsoConfig::default();
        config
            .apps
            .insert("pmo".to_string(), entry("http://pmo.local", true));
        config
            .apps
            .insert("cobit".to_string(), entry("http://cobit.local", true));

        let keys: Vec<_> = config
            .app_descriptors()
            .into_iter()
            .map(|d| d.key)
            .collect();
        assert_eq!(keys, vec!["pmo", "cobit"]);
    }

    #[test]
    fn test_deserialize_from_json() {
        let config: SsoConfig = serde_json::from_value(serde_json::json!({
            "token_ttl_minutes": 10,
            "store_timeout": "500ms",
            "apps": {
                "cobit": {
                    "name": "COBIT Assessment",
                    "url": "http://cobit.local/sso/callback",
                    "enabled": true
                },
                "hr": { "name": "HR", "url": "http://hr.local" }
            }
        }))
        .unwrap();

        assert_eq!(config.token_ttl_minutes, 10);
        assert_eq!(config.store_timeout, Duration::from_millis(500));
        assert!(config.apps["cobit"].enabled);
        assert!(!config.apps["hr"].enabled);
        assert_eq!(config.portal_url, "/dashboard");
    }
}
