// SPDX-FileCopyrightText: 2026 Leasehold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Leasehold reservation framework.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

/// Why a reservation request could not be satisfied.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ReservationFailure {
    /// No free resource can satisfy the request.
    Capacity,
    /// The request parameters are malformed or reference unknown resources.
    Validation,
    /// The plugin's backend is not set up or cannot be reached.
    BackendUnavailable,
    /// The reservation id has already been used.
    Duplicate,
}

/// The primary error type used across plugin traits, the resolver, and the store.
#[derive(Debug, Error)]
pub enum LeaseholdError {
    /// Configuration errors (missing options, invalid values, bad declarations).
    #[error("configuration error: {0}")]
    Config(String),

    /// A reservation could not be created or updated.
    #[error("reservation {reservation_id} failed ({reason}): {message}")]
    Reservation {
        reservation_id: String,
        reason: ReservationFailure,
        message: String,
    },

    /// A lifecycle operation hit a resource in a state the plugin cannot reconcile.
    #[error("resource {resource_id} is in an incompatible state: {message}")]
    ResourceState { resource_id: String, message: String },

    /// The service catalog has no service of the requested type.
    #[error("Service \"{0}\" not found")]
    ServiceNotFound(String),

    /// The matched service carries no endpoints.
    #[error("No endpoints for {0}")]
    EndpointsNotFound(String),

    /// Endpoints carry an interface key but none matches the requested interface.
    #[error("no {interface} endpoint for {service_type}")]
    InterfaceNotFound {
        service_type: String,
        interface: String,
    },

    /// The legacy `<interface>URL` field is absent from the first endpoint.
    #[error("endpoint for {service_type} has no `{field}` field")]
    EndpointFieldMissing { service_type: String, field: String },

    /// No plugin is registered for the resource type.
    #[error("no plugin registered for resource type `{resource_type}`")]
    PluginNotFound { resource_type: String },

    /// A plugin with the same resource type is already registered.
    #[error("a plugin for resource type `{resource_type}` is already registered")]
    DuplicatePlugin { resource_type: String },

    /// The reservation record does not exist in the store.
    #[error("reservation {0} not found")]
    ReservationNotFound(String),

    /// Reservation store errors.
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LeaseholdError {
    /// Shorthand for a [`LeaseholdError::Reservation`].
    pub fn reservation(
        reservation_id: impl Into<String>,
        reason: ReservationFailure,
        message: impl Into<String>,
    ) -> Self {
        Self::Reservation {
            reservation_id: reservation_id.into(),
            reason,
            message: message.into(),
        }
    }

    /// Shorthand for a [`LeaseholdError::ResourceState`].
    pub fn resource_state(resource_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ResourceState {
            resource_id: resource_id.into(),
            message: message.into(),
        }
    }

    /// Returns the failure reason if this is a reservation error.
    pub fn reservation_failure(&self) -> Option<ReservationFailure> {
        match self {
            Self::Reservation { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    /// Whether the caller may retry the operation with different parameters.
    ///
    /// Only reservation failures are recoverable; everything else aborts the
    /// request it was raised from.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Reservation { reason, .. } if *reason != ReservationFailure::Duplicate)
    }

    /// Whether the error was raised by endpoint resolution.
    pub fn is_resolver_error(&self) -> bool {
        matches!(
            self,
            Self::ServiceNotFound(_)
                | Self::EndpointsNotFound(_)
                | Self::InterfaceNotFound { .. }
                | Self::EndpointFieldMissing { .. }
        )
    }
}
