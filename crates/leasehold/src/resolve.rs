// SPDX-FileCopyrightText: 2026 Leasehold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `leasehold resolve`: look up a service URL in a catalog file.

use std::path::Path;

use tracing::debug;

use leasehold_catalog::{ResolveRequest, Resolver, ServiceCatalog};
use leasehold_config::LeaseholdConfig;
use leasehold_core::LeaseholdError;

/// Resolve and print the URL on stdout.
pub(crate) fn run_resolve(
    config: &LeaseholdConfig,
    catalog_path: &Path,
    service_type: &str,
    admin: bool,
    interface: Option<&str>,
) -> Result<(), LeaseholdError> {
    let url = resolve_url(config, catalog_path, service_type, admin, interface)?;
    println!("{url}");
    Ok(())
}

/// Load `catalog_path` and resolve `service_type` using the configured policy.
///
/// An explicit `interface` wins over `[catalog] endpoint_interface`.
pub(crate) fn resolve_url(
    config: &LeaseholdConfig,
    catalog_path: &Path,
    service_type: &str,
    admin: bool,
    interface: Option<&str>,
) -> Result<String, LeaseholdError> {
    let content = std::fs::read_to_string(catalog_path).map_err(|e| {
        LeaseholdError::Config(format!(
            "cannot read catalog {}: {e}",
            catalog_path.display()
        ))
    })?;
    let catalog = ServiceCatalog::from_json_str(&content).map_err(|e| {
        LeaseholdError::Config(format!(
            "invalid catalog {}: {e}",
            catalog_path.display()
        ))
    })?;

    let request = ResolveRequest::new(service_type)
        .admin(admin)
        .interface(interface.or(config.catalog.endpoint_interface.as_deref()));
    let resolver = Resolver::new(config.catalog.fallback);
    debug!(
        services = catalog.len(),
        service_type,
        interface = request.effective_interface(),
        policy = %resolver.policy(),
        "resolving endpoint"
    );
    resolver.resolve(&catalog, &request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn catalog_file(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    const CATALOG: &str = r#"[
        {"type": "compute", "endpoints": [
            {"interface": "public", "url": "https://pub"},
            {"interface": "internal", "url": "https://int"},
            {"interface": "admin", "url": "https://adm"}
        ]}
    ]"#;

    #[test]
    fn resolves_public_by_default() {
        let file = catalog_file(CATALOG);
        let config = LeaseholdConfig::default();
        let url = resolve_url(&config, file.path(), "compute", false, None).unwrap();
        assert_eq!(url, "https://pub");
    }

    #[test]
    fn configured_interface_is_used_and_flag_overrides_it() {
        let file = catalog_file(CATALOG);
        let mut config = LeaseholdConfig::default();
        config.catalog.endpoint_interface = Some("internal".into());

        let url = resolve_url(&config, file.path(), "compute", false, None).unwrap();
        assert_eq!(url, "https://int");
        let url = resolve_url(&config, file.path(), "compute", false, Some("public")).unwrap();
        assert_eq!(url, "https://pub");
        let url = resolve_url(&config, file.path(), "compute", true, Some("public")).unwrap();
        assert_eq!(url, "https://adm");
    }

    #[test]
    fn unknown_service_is_reported() {
        let file = catalog_file(CATALOG);
        let err = resolve_url(&LeaseholdConfig::default(), file.path(), "image", false, None)
            .unwrap_err();
        assert!(matches!(err, LeaseholdError::ServiceNotFound(ref t) if t == "image"));
    }

    #[test]
    fn malformed_catalog_is_a_config_error() {
        let file = catalog_file("{not json");
        let err = resolve_url(&LeaseholdConfig::default(), file.path(), "compute", false, None)
            .unwrap_err();
        assert!(matches!(err, LeaseholdError::Config(_)));
    }
}
