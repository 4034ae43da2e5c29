// SPDX-FileCopyrightText: 2026 Leasehold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across plugin traits, the store, and the registry.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::state::ReservationState;

/// Opaque, externally generated reservation identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReservationId(pub String);

impl ReservationId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ReservationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ReservationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Identifier of the concrete resource bound to a reservation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId(pub String);

impl ResourceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Request parameters passed to `reserve_resource` and `update_reservation`.
pub type ReservationValues = Map<String, Value>;

/// A configuration option a plugin wants the host configuration to supply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginOption {
    /// Option name, unique within one plugin.
    pub name: String,
    /// Whether startup must fail when the option is absent.
    pub required: bool,
    /// Value used when the option is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Short description shown by `leasehold plugins`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

impl PluginOption {
    /// A required option with no default.
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
            default: None,
            help: None,
        }
    }

    /// An optional option falling back to `default`.
    pub fn optional(name: impl Into<String>, default: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            required: false,
            default: Some(default.into()),
            help: None,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

/// Validated, default-filled option values handed to `ResourcePlugin::setup`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PluginConf {
    values: Map<String, Value>,
}

impl PluginConf {
    pub fn new(values: Map<String, Value>) -> Self {
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.values.get(name).and_then(Value::as_bool)
    }

    pub fn get_u64(&self, name: &str) -> Option<u64> {
        self.values.get(name).and_then(Value::as_u64)
    }

    /// Reads a list of strings.
    ///
    /// Accepts either a JSON array of strings or a single comma-separated
    /// string, since env var overrides can only carry the latter.
    pub fn get_str_list(&self, name: &str) -> Option<Vec<String>> {
        match self.values.get(name)? {
            Value::Array(items) => items
                .iter()
                .map(|v| v.as_str().map(str::to_string))
                .collect(),
            Value::String(s) => Some(
                s.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Serializable summary of a plugin's identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginInfo {
    pub resource_type: String,
    pub title: Option<String>,
    pub description: Option<String>,
}

/// A reservation record as kept by the reservation store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub resource_type: String,
    pub resource_id: Option<ResourceId>,
    pub state: ReservationState,
    /// RFC 3339 timestamp of the last write.
    pub updated_at: String,
}

impl Reservation {
    /// A fresh, unreserved record for the given resource type.
    pub fn new(id: ReservationId, resource_type: impl Into<String>) -> Self {
        Self {
            id,
            resource_type: resource_type.into(),
            resource_id: None,
            state: ReservationState::Unreserved,
            updated_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Field updates for `ReservationStore::reservation_update`.
///
/// Present fields replace the stored value; absent fields are untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReservationUpdate {
    pub resource_id: Option<ResourceId>,
    pub state: Option<ReservationState>,
}

impl ReservationUpdate {
    pub fn resource_id(resource_id: ResourceId) -> Self {
        Self {
            resource_id: Some(resource_id),
            state: None,
        }
    }

    pub fn state(state: ReservationState) -> Self {
        Self {
            resource_id: None,
            state: Some(state),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.resource_id.is_none() && self.state.is_none()
    }

    /// Apply the present fields to `reservation`, stamping `updated_at`.
    pub fn apply_to(&self, reservation: &mut Reservation) {
        if let Some(resource_id) = &self.resource_id {
            reservation.resource_id = Some(resource_id.clone());
        }
        if let Some(state) = self.state {
            reservation.state = state;
        }
        reservation.updated_at = chrono::Utc::now().to_rfc3339();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn conf(value: Value) -> PluginConf {
        match value {
            Value::Object(map) => PluginConf::new(map),
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn conf_accessors_read_typed_values() {
        let conf = conf(json!({
            "endpoint": "http://pool",
            "enabled": true,
            "slots": 4,
        }));
        assert_eq!(conf.get_str("endpoint"), Some("http://pool"));
        assert_eq!(conf.get_bool("enabled"), Some(true));
        assert_eq!(conf.get_u64("slots"), Some(4));
        assert!(conf.get("missing").is_none());
        assert_eq!(conf.get_str("slots"), None);
    }

    #[test]
    fn conf_str_list_accepts_array_or_csv() {
        let conf = conf(json!({
            "array": ["a", "b"],
            "csv": "a, b,,c",
            "mixed": ["a", 1],
        }));
        assert_eq!(conf.get_str_list("array"), Some(vec!["a".into(), "b".into()]));
        assert_eq!(
            conf.get_str_list("csv"),
            Some(vec!["a".into(), "b".into(), "c".into()])
        );
        assert_eq!(conf.get_str_list("mixed"), None);
    }

    #[test]
    fn update_replaces_only_present_fields() {
        let mut reservation = Reservation::new("r1".into(), "physical_host");
        ReservationUpdate::resource_id("host-a".into()).apply_to(&mut reservation);
        assert_eq!(reservation.resource_id, Some("host-a".into()));
        assert_eq!(reservation.state, ReservationState::Unreserved);

        ReservationUpdate::state(ReservationState::Reserved).apply_to(&mut reservation);
        assert_eq!(reservation.resource_id, Some("host-a".into()));
        assert_eq!(reservation.state, ReservationState::Reserved);

        ReservationUpdate::resource_id("host-b".into()).apply_to(&mut reservation);
        assert_eq!(reservation.resource_id, Some("host-b".into()));
    }

    #[test]
    fn option_builders() {
        let required = PluginOption::required("hosts");
        assert!(required.required);
        assert!(required.default.is_none());

        let optional = PluginOption::optional("slots", 42).with_help("slot count");
        assert!(!optional.required);
        assert_eq!(optional.default, Some(json!(42)));
        assert_eq!(optional.help.as_deref(), Some("slot count"));
    }

    #[test]
    fn generated_reservation_ids_are_unique() {
        assert_ne!(ReservationId::generate(), ReservationId::generate());
    }
}
