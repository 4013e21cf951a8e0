//! Downstream application descriptors.

use serde::{Deserialize, Serialize};

/// A downstream application that can receive a handoff.
///
/// Descriptors are built from configuration and never mutated while a
/// request is in flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppDescriptor {
    /// Unique short key, e.g. `cobit`.
    pub key: String,

    /// Human-readable app name.
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// URL the browser is sent to with the token attached.
    pub callback_url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    /// Whether handoffs to this app are allowed.
    pub enabled: bool,
}

impl AppDescriptor {
    /// Creates an enabled descriptor with only the fields the broker needs.
    pub fn new(key: impl Into<String>, callback_url: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            name: key.clone(),
            key,
            description: None,
            callback_url: callback_url.into(),
            icon: None,
            color: None,
            enabled: true,
        }
    }

    /// Returns a copy with `enabled` set to `false`.
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Builds the URL the browser is redirected to for `token`.
    ///
    /// The token is appended as the `token` query parameter. An existing
    /// query string on the callback URL is preserved.
    #[must_use]
    pub fn redirect_url(&self, token: &str) -> String {
        append_query_param(&self.callback_url, "token", token)
    }
}

/// Appends `name=value` to `url`, using `&` if `url` already has a query.
///
/// `value` is inserted as is; callers pass URL-safe values only.
#[must_use]
pub fn append_query_param(url: &str, name: &str, value: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{name}={value}")
}
