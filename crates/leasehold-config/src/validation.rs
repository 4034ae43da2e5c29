// SPDX-FileCopyrightText: 2026 Leasehold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as known log levels and unique plugin names.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::LeaseholdConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &LeaseholdConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let level = config.manager.log_level.trim().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "manager.log_level `{}` must be one of: {}",
                config.manager.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    let mut seen = HashSet::new();
    for (i, resource_type) in config.manager.plugins.iter().enumerate() {
        if resource_type.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("manager.plugins[{i}] must not be empty"),
            });
        } else if !seen.insert(resource_type.as_str()) {
            errors.push(ConfigError::Validation {
                message: format!("duplicate resource type `{resource_type}` in manager.plugins"),
            });
        }
    }

    if let Some(interface) = &config.catalog.endpoint_interface
        && interface.trim().is_empty()
    {
        errors.push(ConfigError::Validation {
            message: "catalog.endpoint_interface must not be empty when set".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = LeaseholdConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn unknown_log_level_fails_validation() {
        let mut config = LeaseholdConfig::default();
        config.manager.log_level = "verbose".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("manager.log_level"));
    }

    #[test]
    fn log_level_is_case_insensitive() {
        let mut config = LeaseholdConfig::default();
        config.manager.log_level = "DEBUG".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn duplicate_and_empty_plugins_fail_validation() {
        let mut config = LeaseholdConfig::default();
        config.manager.plugins = vec![
            "physical_host".to_string(),
            "".to_string(),
            "physical_host".to_string(),
        ];
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.to_string().contains("manager.plugins[1]")));
        assert!(errors.iter().any(|e| e.to_string().contains("duplicate resource type")));
    }

    #[test]
    fn blank_endpoint_interface_fails_validation() {
        let mut config = LeaseholdConfig::default();
        config.catalog.endpoint_interface = Some("  ".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().contains("catalog.endpoint_interface"));
    }

    #[test]
    fn collects_all_errors() {
        let mut config = LeaseholdConfig::default();
        config.manager.log_level = "loud".to_string();
        config.catalog.endpoint_interface = Some(String::new());
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
