// SPDX-FileCopyrightText: 2026 Leasehold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin registry keyed by resource type.
//!
//! The registry is filled at startup, set up once from configuration, and
//! then shared read-only (behind `Arc`) with the reservation manager.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

use leasehold_config::{check_declarations, resolve_plugin_conf, ConfigError, LeaseholdConfig};
use leasehold_core::{LeaseholdError, PluginInfo, PluginOption, ResourcePlugin};

/// Startup failure while setting up registered plugins.
#[derive(Debug, Error)]
pub enum SetupError {
    /// Plugin sections do not match the registered plugins' declarations.
    #[error("invalid plugin configuration ({} error(s))", .0.len())]
    Config(Vec<ConfigError>),

    /// A plugin's own `setup` failed.
    #[error("plugin `{resource_type}` failed to set up: {source}")]
    Plugin {
        resource_type: String,
        #[source]
        source: LeaseholdError,
    },
}

/// A plugin together with the options it declared at registration.
struct PluginEntry {
    plugin: Arc<dyn ResourcePlugin>,
    options: Vec<PluginOption>,
}

impl std::fmt::Debug for PluginEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginEntry")
            .field("resource_type", &self.plugin.resource_type())
            .field("options", &self.options)
            .finish()
    }
}

/// Registry of resource plugins, one per resource type.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    entries: BTreeMap<String, PluginEntry>,
    set_up: Mutex<bool>,
}

impl PluginRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin under its resource type.
    ///
    /// Calls `declare_options` once and keeps the result. Fails if the
    /// resource type is taken or the plugin declares an option twice.
    pub fn register(&mut self, plugin: Arc<dyn ResourcePlugin>) -> Result<(), LeaseholdError> {
        let resource_type = plugin.resource_type().to_string();
        if self.entries.contains_key(&resource_type) {
            return Err(LeaseholdError::DuplicatePlugin { resource_type });
        }

        let options = plugin.declare_options();
        check_declarations(&resource_type, &options)
            .map_err(|e| LeaseholdError::Config(e.to_string()))?;

        info!(resource_type = %resource_type, options = options.len(), "registered plugin");
        self.entries
            .insert(resource_type, PluginEntry { plugin, options });
        Ok(())
    }

    /// Get the plugin for a resource type.
    pub fn get(&self, resource_type: &str) -> Result<Arc<dyn ResourcePlugin>, LeaseholdError> {
        self.entries
            .get(resource_type)
            .map(|e| e.plugin.clone())
            .ok_or_else(|| LeaseholdError::PluginNotFound {
                resource_type: resource_type.to_string(),
            })
    }

    pub fn contains(&self, resource_type: &str) -> bool {
        self.entries.contains_key(resource_type)
    }

    /// Registered resource types, sorted.
    pub fn resource_types(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Identity of every registered plugin, sorted by resource type.
    pub fn list_all(&self) -> Vec<PluginInfo> {
        self.entries.values().map(|e| e.plugin.info()).collect()
    }

    /// Declared options per resource type, for merging into the global schema.
    pub fn option_schema(&self) -> BTreeMap<String, Vec<PluginOption>> {
        self.entries
            .iter()
            .map(|(k, e)| (k.clone(), e.options.clone()))
            .collect()
    }

    /// Resolve each plugin's options from `[plugins.<resource_type>]` and call `setup`.
    ///
    /// Configuration problems across all plugins are collected before any
    /// plugin is set up. Once every plugin has set up, later calls are
    /// no-ops; after a failure the next call runs setup again.
    pub async fn setup_all(&self, config: &LeaseholdConfig) -> Result<(), SetupError> {
        let mut set_up = self.set_up.lock().await;
        if *set_up {
            debug!("plugins already set up");
            return Ok(());
        }

        let mut errors = Vec::new();
        let known = self.resource_types();
        for section in config.plugins.keys() {
            if !self.contains(section) {
                errors.push(ConfigError::unknown_key(
                    format!("plugins.{section}"),
                    section,
                    &known,
                ));
            }
        }

        let mut confs = Vec::with_capacity(self.entries.len());
        for (resource_type, entry) in &self.entries {
            match resolve_plugin_conf(
                resource_type,
                &entry.options,
                config.plugin_section(resource_type),
            ) {
                Ok(conf) => confs.push((entry, conf)),
                Err(mut errs) => errors.append(&mut errs),
            }
        }
        if !errors.is_empty() {
            return Err(SetupError::Config(errors));
        }

        for (entry, conf) in confs {
            let resource_type = entry.plugin.resource_type();
            entry
                .plugin
                .setup(&conf)
                .await
                .map_err(|source| SetupError::Plugin {
                    resource_type: resource_type.to_string(),
                    source,
                })?;
            info!(resource_type, "plugin set up");
        }
        *set_up = true;
        Ok(())
    }

    /// Returns the number of registered plugins.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no plugins are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
