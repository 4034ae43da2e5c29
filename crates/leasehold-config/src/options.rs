// SPDX-FileCopyrightText: 2026 Leasehold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resolution of plugin option declarations against supplied values.
//!
//! Plugins declare their options as data ([`PluginOption`]); this module is
//! the generic validator that turns a `[plugins.<resource_type>]` section
//! into the [`PluginConf`] handed to `setup`.

use std::collections::HashSet;

use serde_json::{Map, Value};

use leasehold_core::{PluginConf, PluginOption};

use crate::diagnostic::ConfigError;

/// Check that a plugin declares each option name at most once.
pub fn check_declarations(
    resource_type: &str,
    declared: &[PluginOption],
) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for option in declared {
        if option.name.trim().is_empty() {
            return Err(ConfigError::Validation {
                message: format!("plugin `{resource_type}` declares an option with an empty name"),
            });
        }
        if !seen.insert(option.name.as_str()) {
            return Err(ConfigError::Validation {
                message: format!(
                    "plugin `{resource_type}` declares option `{}` more than once",
                    option.name
                ),
            });
        }
    }
    Ok(())
}

/// Build a plugin's configuration from its declarations and supplied values.
///
/// - supplied values are taken as-is;
/// - absent optional options take their default (or stay absent);
/// - absent required options are [`ConfigError::MissingKey`];
/// - undeclared supplied keys are [`ConfigError::UnknownKey`] with a
///   suggestion among the declared names.
///
/// Collects every error instead of failing fast.
pub fn resolve_plugin_conf(
    resource_type: &str,
    declared: &[PluginOption],
    supplied: Option<&Map<String, Value>>,
) -> Result<PluginConf, Vec<ConfigError>> {
    let empty = Map::new();
    let supplied = supplied.unwrap_or(&empty);
    let mut errors = Vec::new();
    let mut values = Map::new();

    for option in declared {
        match supplied.get(&option.name) {
            Some(value) => {
                values.insert(option.name.clone(), value.clone());
            }
            None if option.required => errors.push(ConfigError::MissingKey {
                key: format!("plugins.{resource_type}.{}", option.name),
            }),
            None => {
                if let Some(default) = &option.default {
                    values.insert(option.name.clone(), default.clone());
                }
            }
        }
    }

    let valid: Vec<&str> = declared.iter().map(|o| o.name.as_str()).collect();
    for key in supplied.keys() {
        if !valid.contains(&key.as_str()) {
            errors.push(ConfigError::unknown_key(
                format!("plugins.{resource_type}.{key}"),
                key,
                &valid,
            ));
        }
    }

    if errors.is_empty() {
        Ok(PluginConf::new(values))
    } else {
        Err(errors)
    }
}
