// SPDX-FileCopyrightText: 2026 Leasehold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./leasehold.toml` > `~/.config/leasehold/leasehold.toml`
//! > `/etc/leasehold/leasehold.toml` with environment variable overrides via
//! `LEASEHOLD_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use tracing::debug;

use crate::model::LeaseholdConfig;

const SYSTEM_CONFIG: &str = "/etc/leasehold/leasehold.toml";
const LOCAL_CONFIG: &str = "leasehold.toml";

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/leasehold/leasehold.toml` (system-wide)
/// 3. `~/.config/leasehold/leasehold.toml` (user XDG config)
/// 4. `./leasehold.toml` (local directory)
/// 5. `LEASEHOLD_*` environment variables
pub fn load_config() -> Result<LeaseholdConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<LeaseholdConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LeaseholdConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<LeaseholdConfig, figment::Error> {
    debug!(path = %path.display(), "loading configuration file");
    Figment::new()
        .merge(Serialized::defaults(LeaseholdConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(LeaseholdConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(env_provider())
}

/// `$XDG_CONFIG_HOME/leasehold/leasehold.toml`, when a config dir exists.
pub fn user_config_path() -> Option<std::path::PathBuf> {
    dirs::config_dir().map(|d| d.join("leasehold/leasehold.toml"))
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Fixed sections map their first underscore only, so
/// `LEASEHOLD_MANAGER_LOG_LEVEL` becomes `manager.log_level`. Resource types
/// and option names may contain underscores themselves, so plugin sections
/// use a double underscore as separator:
/// `LEASEHOLD_PLUGINS__PHYSICAL_HOST__HOSTS` becomes `plugins.physical_host.hosts`.
fn env_provider() -> Env {
    Env::prefixed("LEASEHOLD_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    if key.starts_with("plugins__") {
        return key.replace("__", ".");
    }
    key.replacen("manager_", "manager.", 1)
        .replacen("catalog_", "catalog.", 1)
}
