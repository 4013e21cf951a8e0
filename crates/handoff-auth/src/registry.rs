//! Downstream application registry.
//!
//! The registry answers one question for the issuer: where does a handoff
//! to `key` go, and is it allowed? Unknown and disabled keys are
//! indistinguishable to callers of [`AppRegistry::is_enabled`].

use std::sync::Arc;

use arc_swap::ArcSwap;
use indexmap::IndexMap;

use crate::config::SsoConfig;
use crate::types::AppDescriptor;

/// Read access to the configured downstream applications.
pub trait AppRegistry: Send + Sync {
    /// Returns the descriptor for `key`, enabled or not.
    fn lookup(&self, key: &str) -> Option<AppDescriptor>;

    /// Returns `true` if `key` names an enabled application.
    fn is_enabled(&self, key: &str) -> bool {
        self.lookup(key).is_some_and(|app| app.enabled)
    }

    /// Returns all enabled applications in configuration order.
    fn enabled_apps(&self) -> Vec<AppDescriptor>;
}

type AppTable = IndexMap<String, AppDescriptor>;

/// Registry built from the `sso.apps` configuration table.
///
/// The table can be swapped at runtime with [`replace`](Self::replace)
/// (e.g. on SIGHUP). Readers never block and always see either the old or
/// the new table in full.
#[derive(Debug)]
pub struct ConfigAppRegistry {
    apps: ArcSwap<AppTable>,
}

impl ConfigAppRegistry {
    /// Creates a registry from descriptors. Later duplicates of a key win.
    #[must_use]
    pub fn new(apps: impl IntoIterator<Item = AppDescriptor>) -> Self {
        Self {
            apps: ArcSwap::from_pointee(Self::table(apps)),
        }
    }

    /// Creates a registry from SSO configuration.
    #[must_use]
    pub fn from_config(config: &SsoConfig) -> Self {
        Self::new(config.app_descriptors())
    }

    /// Replaces the whole application table.
    pub fn replace(&self, apps: impl IntoIterator<Item = AppDescriptor>) {
        self.apps.store(Arc::new(Self::table(apps)));
        tracing::info!(apps = self.apps.load().len(), "App registry replaced");
    }

    /// Number of configured applications, enabled or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.apps.load().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn table(apps: impl IntoIterator<Item = AppDescriptor>) -> AppTable {
        apps.into_iter().map(|app| (app.key.clone(), app)).collect()
    }
}

impl AppRegistry for ConfigAppRegistry {
    fn lookup(&self, key: &str) -> Option<AppDescriptor> {
        self.apps.load().get(key).cloned()
    }

    fn enabled_apps(&self) -> Vec<AppDescriptor> {
        self.apps
            .load()
            .values()
            .filter(|app| app.enabled)
            .cloned()
            .collect()
    }
}
