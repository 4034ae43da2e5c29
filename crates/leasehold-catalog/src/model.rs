// SPDX-FileCopyrightText: 2026 Leasehold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service catalog data model.
//!
//! Endpoint descriptors are kept as raw JSON objects: the resolver needs to
//! tell a missing `interface` key apart from one that simply does not match.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Ordered list of services, as returned by the identity service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceCatalog {
    services: Vec<Service>,
}

impl ServiceCatalog {
    pub fn new(services: Vec<Service>) -> Self {
        Self { services }
    }

    /// Parse a catalog from its JSON array form.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl FromIterator<Service> for ServiceCatalog {
    fn from_iter<I: IntoIterator<Item = Service>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// One service entry of the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    /// Service type, e.g. `compute` or `volumev3`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,

    /// Endpoint descriptors. `None` when the key is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoints: Option<Vec<Endpoint>>,

    /// Any other fields (`name`, `id`, ...), preserved but unused.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Service {
    pub fn new(service_type: impl Into<String>, endpoints: Vec<Endpoint>) -> Self {
        Self {
            service_type: Some(service_type.into()),
            endpoints: Some(endpoints),
            extra: Map::new(),
        }
    }

    /// A service whose `endpoints` key is absent.
    pub fn without_endpoints(service_type: impl Into<String>) -> Self {
        Self {
            service_type: Some(service_type.into()),
            endpoints: None,
            extra: Map::new(),
        }
    }

    pub fn is_type(&self, service_type: &str) -> bool {
        self.service_type.as_deref() == Some(service_type)
    }
}

/// A single endpoint descriptor in either generation's shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Endpoint {
    fields: Map<String, Value>,
}

impl Endpoint {
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// `{"interface": <interface>, "url": <url>}`
    pub fn v3(interface: &str, url: &str) -> Self {
        let mut fields = Map::new();
        fields.insert("interface".into(), Value::String(interface.into()));
        fields.insert("url".into(), Value::String(url.into()));
        Self { fields }
    }

    /// `{"<interface>URL": <url>, ...}` from `(interface, url)` pairs.
    pub fn v2<'a>(urls: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let fields = urls
            .into_iter()
            .map(|(interface, url)| (format!("{interface}URL"), Value::String(url.into())))
            .collect();
        Self { fields }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(Value::as_str)
    }

    /// Whether the descriptor carries an `interface` key at all.
    pub fn has_interface_key(&self) -> bool {
        self.fields.contains_key("interface")
    }

    pub fn interface(&self) -> Option<&str> {
        self.field_str("interface")
    }

    pub fn url(&self) -> Option<&str> {
        self.field_str("url")
    }
}
