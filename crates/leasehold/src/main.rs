// SPDX-FileCopyrightText: 2026 Leasehold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Leasehold - resource reservation plugin host.
//!
//! This is the binary entry point: it loads configuration, registers the
//! configured plugins, and runs one operator subcommand.

mod check;
mod plugins;
mod resolve;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use leasehold_config::LeaseholdConfig;
use leasehold_core::LeaseholdError;
use leasehold_plugin::{InMemoryPoolPlugin, PluginRegistry};

/// Leasehold - resource reservation plugin host.
#[derive(Parser, Debug)]
#[command(name = "leasehold", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// List registered plugins and their declared options as JSON.
    Plugins,
    /// Resolve a service's base URL from a catalog JSON file.
    Resolve {
        /// Path to the service catalog (JSON array of services).
        #[arg(long)]
        catalog: PathBuf,
        /// Service type to look up, e.g. `compute`.
        #[arg(long)]
        service_type: String,
        /// Resolve the admin endpoint.
        #[arg(long)]
        admin: bool,
        /// Interface to resolve; overrides `[catalog] endpoint_interface`.
        #[arg(long)]
        interface: Option<String>,
    },
    /// Load, validate, and set up plugins without serving.
    CheckConfig,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => leasehold_config::load_and_validate_path(path),
        None => leasehold_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            leasehold_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.manager.log_level);

    let result = match cli.command {
        Some(Commands::Plugins) => plugins::run_plugins(&config),
        Some(Commands::Resolve {
            catalog,
            service_type,
            admin,
            interface,
        }) => resolve::run_resolve(&config, &catalog, &service_type, admin, interface.as_deref()),
        Some(Commands::CheckConfig) => check::run_check_config(&config).await,
        None => {
            println!("leasehold: use --help for available commands");
            Ok(())
        }
    };

    if let Err(err) = result {
        eprintln!("leasehold: {err}");
        std::process::exit(1);
    }
}

/// Register one in-memory pool plugin per enabled resource type.
pub(crate) fn build_registry(config: &LeaseholdConfig) -> Result<PluginRegistry, LeaseholdError> {
    let mut registry = PluginRegistry::new();
    for resource_type in &config.manager.plugins {
        registry.register(Arc::new(InMemoryPoolPlugin::new(resource_type.as_str())))?;
    }
    Ok(registry)
}

/// Initialize the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("leasehold={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
