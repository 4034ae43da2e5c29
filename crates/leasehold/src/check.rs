// SPDX-FileCopyrightText: 2026 Leasehold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `leasehold check-config`: validate configuration and set up plugins.

use tracing::info;

use leasehold_config::LeaseholdConfig;
use leasehold_core::LeaseholdError;
use leasehold_plugin::SetupError;

use crate::build_registry;

/// Register and set up every enabled plugin.
///
/// Option problems are rendered as diagnostics before returning an error.
pub(crate) async fn run_check_config(config: &LeaseholdConfig) -> Result<(), LeaseholdError> {
    let count = check_config(config).await?;
    println!("leasehold: configuration OK ({count} plugin(s) set up)");
    Ok(())
}

async fn check_config(config: &LeaseholdConfig) -> Result<usize, LeaseholdError> {
    let registry = build_registry(config)?;
    match registry.setup_all(config).await {
        Ok(()) => {
            info!(plugins = registry.len(), "configuration checked");
            Ok(registry.len())
        }
        Err(SetupError::Config(errors)) => {
            leasehold_config::render_errors(&errors);
            Err(LeaseholdError::Config(format!(
                "{} plugin option error(s)",
                errors.len()
            )))
        }
        Err(SetupError::Plugin {
            resource_type,
            source,
        }) => Err(LeaseholdError::Config(format!(
            "plugin `{resource_type}` failed to set up: {source}"
        ))),
    }
}
