// SPDX-FileCopyrightText: 2026 Leasehold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Endpoint resolution across both catalog generations.
//!
//! Resolution steps:
//! 1. `admin` forces the `admin` interface; otherwise the requested
//!    interface, or `public` when none (or an empty one) is given.
//! 2. The **last** service of the requested type wins.
//! 3. Interface-tagged descriptors are searched for the interface.
//! 4. Otherwise the first descriptor's `<interface>URL` field is read.
//!
//! Step 2 is a compatibility behavior and must stay last-match.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::debug;

use leasehold_core::LeaseholdError;

use crate::model::{Endpoint, ServiceCatalog};

const DEFAULT_INTERFACE: &str = "public";
const ADMIN_INTERFACE: &str = "admin";

/// When to fall back from interface-tagged lookup to `<interface>URL` fields.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum FallbackPolicy {
    /// Fall back only when descriptors carry no `interface` key (or the
    /// matching descriptor has no `url`). A present key with no matching
    /// interface is [`LeaseholdError::InterfaceNotFound`].
    #[default]
    Structural,
    /// Fall back whenever no interface-tagged descriptor matches.
    AnyMiss,
}

/// Resolves service URLs with a fixed fallback policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Resolver {
    policy: FallbackPolicy,
}

enum TaggedLookup<'a> {
    Found(&'a str),
    NoMatch,
    Untagged,
}

impl Resolver {
    pub fn new(policy: FallbackPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> FallbackPolicy {
        self.policy
    }

    /// [`Resolver::url_for`] taking a [`ResolveRequest`].
    pub fn resolve(
        &self,
        catalog: &ServiceCatalog,
        request: &ResolveRequest<'_>,
    ) -> Result<String, LeaseholdError> {
        self.url_for(
            catalog,
            request.service_type,
            request.admin,
            request.endpoint_interface,
        )
    }

    /// Returns the base URL of `service_type` for the effective interface.
    pub fn url_for(
        &self,
        catalog: &ServiceCatalog,
        service_type: &str,
        admin: bool,
        endpoint_interface: Option<&str>,
    ) -> Result<String, LeaseholdError> {
        let interface = effective_interface(admin, endpoint_interface);

        let service = catalog
            .services()
            .iter()
            .rev()
            .find(|s| s.is_type(service_type))
            .ok_or_else(|| LeaseholdError::ServiceNotFound(service_type.to_string()))?;

        let endpoints = match service.endpoints.as_deref() {
            Some(endpoints) if !endpoints.is_empty() => endpoints,
            _ => return Err(LeaseholdError::EndpointsNotFound(service_type.to_string())),
        };

        match lookup_tagged(endpoints, interface) {
            TaggedLookup::Found(url) => {
                debug!(service_type, interface, url, "resolved tagged endpoint");
                return Ok(url.to_string());
            }
            TaggedLookup::NoMatch if self.policy == FallbackPolicy::Structural => {
                return Err(LeaseholdError::InterfaceNotFound {
                    service_type: service_type.to_string(),
                    interface: interface.to_string(),
                });
            }
            TaggedLookup::NoMatch | TaggedLookup::Untagged => {}
        }

        let field = format!("{interface}URL");
        let url = endpoints[0]
            .field_str(&field)
            .ok_or_else(|| LeaseholdError::EndpointFieldMissing {
                service_type: service_type.to_string(),
                field: field.clone(),
            })?;
        debug!(service_type, field = %field, url, "resolved legacy endpoint");
        Ok(url.to_string())
    }
}

fn lookup_tagged<'a>(endpoints: &'a [Endpoint], interface: &str) -> TaggedLookup<'a> {
    // A single untagged descriptor means the list is not interface-tagged.
    if endpoints.iter().any(|e| !e.has_interface_key()) {
        return TaggedLookup::Untagged;
    }
    match endpoints.iter().find(|e| e.interface() == Some(interface)) {
        Some(endpoint) => match endpoint.url() {
            Some(url) => TaggedLookup::Found(url),
            None => TaggedLookup::Untagged,
        },
        None => TaggedLookup::NoMatch,
    }
}

/// The interface actually looked up for a request.
pub fn effective_interface(admin: bool, endpoint_interface: Option<&str>) -> &str {
    if admin {
        return ADMIN_INTERFACE;
    }
    match endpoint_interface {
        Some(interface) if !interface.is_empty() => interface,
        _ => DEFAULT_INTERFACE,
    }
}

/// Parameters of one resolve call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveRequest<'a> {
    pub service_type: &'a str,
    pub admin: bool,
    pub endpoint_interface: Option<&'a str>,
}

impl<'a> ResolveRequest<'a> {
    /// A request for the public endpoint of `service_type`.
    pub fn new(service_type: &'a str) -> Self {
        Self {
            service_type,
            admin: false,
            endpoint_interface: None,
        }
    }

    pub fn admin(mut self, admin: bool) -> Self {
        self.admin = admin;
        self
    }

    pub fn interface(mut self, interface: Option<&'a str>) -> Self {
        self.endpoint_interface = interface;
        self
    }

    pub fn effective_interface(&self) -> &'a str {
        effective_interface(self.admin, self.endpoint_interface)
    }
}

/// Resolves with the default [`FallbackPolicy::Structural`] policy.
pub fn resolve(
    catalog: &ServiceCatalog,
    service_type: &str,
    admin: bool,
    endpoint_interface: Option<&str>,
) -> Result<String, LeaseholdError> {
    Resolver::default().url_for(catalog, service_type, admin, endpoint_interface)
}
