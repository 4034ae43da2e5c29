// SPDX-FileCopyrightText: 2026 Leasehold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end lifecycle testing.
//!
//! `TestHarness` assembles a plugin registry, an in-memory reservation store,
//! and a lifecycle driver, then runs plugin setup from an inline config.

use std::sync::Arc;

use serde_json::{Map, Value};

use leasehold_config::LeaseholdConfig;
use leasehold_core::{ReservationStore, ResourcePlugin};
use leasehold_plugin::{LifecycleDriver, PluginRegistry, SetupError};
use leasehold_storage::MemoryStore;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    plugins: Vec<Arc<dyn ResourcePlugin>>,
    config: LeaseholdConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            plugins: Vec::new(),
            config: LeaseholdConfig::default(),
        }
    }

    /// Register a plugin.
    pub fn with_plugin(mut self, plugin: Arc<dyn ResourcePlugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Supply the `[plugins.<resource_type>]` section.
    pub fn with_plugin_conf(mut self, resource_type: &str, section: Value) -> Self {
        let section = match section {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        self.config.plugins.insert(resource_type.to_string(), section);
        self
    }

    /// Replace the whole configuration.
    pub fn with_config(mut self, config: LeaseholdConfig) -> Self {
        self.config = config;
        self
    }

    /// Register all plugins and run setup.
    pub async fn build(self) -> Result<TestHarness, SetupError> {
        let mut registry = PluginRegistry::new();
        for plugin in self.plugins {
            let resource_type = plugin.resource_type().to_string();
            registry.register(plugin).map_err(|source| SetupError::Plugin {
                resource_type,
                source,
            })?;
        }
        registry.setup_all(&self.config).await?;

        let store = Arc::new(MemoryStore::new());
        let driver = LifecycleDriver::new(
            Arc::new(registry),
            store.clone() as Arc<dyn ReservationStore>,
        )
        .with_before_end_lead_minutes(self.config.manager.before_end_lead_minutes);

        Ok(TestHarness {
            store,
            driver,
            config: self.config,
        })
    }
}

/// A complete lifecycle environment backed by memory.
pub struct TestHarness {
    /// Reservation records written by the driver.
    pub store: Arc<MemoryStore>,
    /// Lifecycle driver over the registered plugins.
    pub driver: LifecycleDriver,
    /// Configuration used for setup.
    pub config: LeaseholdConfig,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }
}
