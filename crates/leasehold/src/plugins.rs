// SPDX-FileCopyrightText: 2026 Leasehold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `leasehold plugins`: list registered plugins and their options.

use serde_json::{json, Value};

use leasehold_config::LeaseholdConfig;
use leasehold_core::LeaseholdError;
use leasehold_plugin::PluginRegistry;

use crate::build_registry;

/// Print the plugin listing as pretty JSON on stdout.
pub(crate) fn run_plugins(config: &LeaseholdConfig) -> Result<(), LeaseholdError> {
    let registry = build_registry(config)?;
    let listing = plugin_listing(&registry);
    let text = serde_json::to_string_pretty(&listing)
        .map_err(|e| LeaseholdError::Internal(format!("cannot render plugin list: {e}")))?;
    println!("{text}");
    Ok(())
}

fn plugin_listing(registry: &PluginRegistry) -> Value {
    let schema = registry.option_schema();
    let plugins: Vec<Value> = registry
        .list_all()
        .into_iter()
        .map(|info| {
            let options = schema.get(&info.resource_type).cloned().unwrap_or_default();
            json!({
                "resource_type": info.resource_type,
                "title": info.title,
                "description": info.description,
                "options": options,
            })
        })
        .collect();
    Value::Array(plugins)
}
