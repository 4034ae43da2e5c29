// SPDX-FileCopyrightText: 2026 Leasehold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Leasehold framework.
//!
//! Fixed sections use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup. Plugin sections are free-form here and checked
//! against each plugin's declared options once plugins are registered.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use leasehold_catalog::FallbackPolicy;

/// Top-level Leasehold configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LeaseholdConfig {
    /// Reservation manager settings.
    #[serde(default)]
    pub manager: ManagerConfig,

    /// Service catalog lookup settings.
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Per-plugin option values, keyed by resource type.
    ///
    /// ```toml
    /// [plugins.physical_host]
    /// hosts = ["compute-1", "compute-2"]
    /// ```
    #[serde(default)]
    pub plugins: BTreeMap<String, Map<String, Value>>,
}

/// Reservation manager configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ManagerConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Resource types to load plugins for.
    #[serde(default = "default_plugins")]
    pub plugins: Vec<String>,

    /// Minutes before a lease ends at which `before_end` is due. The
    /// lifecycle driver turns this into a due time for a scheduler.
    #[serde(default = "default_before_end_lead_minutes")]
    pub before_end_lead_minutes: u64,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            plugins: default_plugins(),
            before_end_lead_minutes: default_before_end_lead_minutes(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_plugins() -> Vec<String> {
    vec!["physical_host".to_string()]
}

fn default_before_end_lead_minutes() -> u64 {
    60
}

/// Service catalog lookup configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogConfig {
    /// Interface used when a caller does not request one. `public` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_interface: Option<String>,

    /// When to fall back to `<interface>URL` descriptor fields.
    #[serde(default)]
    pub fallback: FallbackPolicy,
}

impl LeaseholdConfig {
    /// Option values supplied for a resource type, if any.
    pub fn plugin_section(&self, resource_type: &str) -> Option<&Map<String, Value>> {
        self.plugins.get(resource_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_physical_host() {
        let config = LeaseholdConfig::default();
        assert_eq!(config.manager.log_level, "info");
        assert_eq!(config.manager.plugins, vec!["physical_host"]);
        assert_eq!(config.manager.before_end_lead_minutes, 60);
        assert_eq!(config.catalog.fallback, FallbackPolicy::Structural);
        assert!(config.catalog.endpoint_interface.is_none());
        assert!(config.plugins.is_empty());
    }

    #[test]
    fn plugin_section_lookup() {
        let mut config = LeaseholdConfig::default();
        let mut section = Map::new();
        section.insert("hosts".into(), Value::from(vec!["a", "b"]));
        config.plugins.insert("physical_host".into(), section);

        assert!(config.plugin_section("physical_host").is_some());
        assert!(config.plugin_section("network").is_none());
    }
}
