// SPDX-FileCopyrightText: 2026 Leasehold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The resource plugin contract.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::error::{LeaseholdError, ReservationFailure};
use crate::traits::store::ReservationStore;
use crate::types::{
    PluginConf, PluginInfo, PluginOption, ReservationId, ReservationUpdate, ReservationValues,
    ResourceId,
};

/// A resource-type plugin driven through the reservation lifecycle.
///
/// The reservation manager calls, in order:
///
/// 1. [`declare_options`](Self::declare_options) and [`setup`](Self::setup),
///    once at startup;
/// 2. [`reserve_resource`](Self::reserve_resource) when a reservation is
///    committed, possibly long before its lease starts;
/// 3. [`on_start`](Self::on_start) when the lease starts;
/// 4. [`before_end`](Self::before_end) some lead time before the lease ends;
/// 5. [`on_end`](Self::on_end) when the lease ends.
///
/// One instance serves every reservation of its resource type and may be
/// called concurrently for different reservation ids. Any shared allocation
/// table must be guarded by the plugin itself.
#[async_trait]
pub trait ResourcePlugin: Send + Sync + 'static {
    /// Tag of the resource kind this plugin manages (e.g. `physical_host`).
    fn resource_type(&self) -> &str;

    /// Human-readable title.
    fn title(&self) -> Option<&str> {
        None
    }

    /// Human-readable description.
    fn description(&self) -> Option<&str> {
        None
    }

    /// Options the plugin wants the host configuration to supply.
    ///
    /// Must be pure. Names must be unique within the plugin.
    fn declare_options(&self) -> Vec<PluginOption> {
        Vec::new()
    }

    /// Serializable identity summary.
    fn info(&self) -> PluginInfo {
        PluginInfo {
            resource_type: self.resource_type().to_string(),
            title: self.title().map(str::to_string),
            description: self.description().map(str::to_string),
        }
    }

    /// One-time initialization from validated configuration.
    ///
    /// An error here is fatal to startup.
    async fn setup(&self, _conf: &PluginConf) -> Result<(), LeaseholdError> {
        Ok(())
    }

    /// Allocates a concrete resource for a new reservation.
    ///
    /// A reservation id passed twice must not allocate twice; the second
    /// call fails with [`ReservationFailure::Duplicate`].
    async fn reserve_resource(
        &self,
        reservation_id: &ReservationId,
        values: &ReservationValues,
    ) -> Result<ResourceId, LeaseholdError>;

    /// Rebinds a reservation to another resource.
    ///
    /// The default replaces the stored `resource_id` with
    /// `values["resource_id"]`. It does not merge and fails when the key is
    /// missing or not a string.
    async fn update_reservation(
        &self,
        store: &dyn ReservationStore,
        reservation_id: &ReservationId,
        values: &ReservationValues,
    ) -> Result<(), LeaseholdError> {
        let resource_id = match values.get("resource_id") {
            Some(Value::String(id)) => ResourceId(id.clone()),
            Some(_) => {
                return Err(LeaseholdError::reservation(
                    reservation_id.as_str(),
                    ReservationFailure::Validation,
                    "`resource_id` must be a string",
                ));
            }
            None => {
                return Err(LeaseholdError::reservation(
                    reservation_id.as_str(),
                    ReservationFailure::Validation,
                    "missing `resource_id`",
                ));
            }
        };

        debug!(
            resource_type = self.resource_type(),
            reservation_id = %reservation_id,
            resource_id = %resource_id,
            "replacing reservation resource"
        );
        store
            .reservation_update(reservation_id, ReservationUpdate::resource_id(resource_id))
            .await?;
        Ok(())
    }

    /// Provisions the resource for use when its lease starts.
    ///
    /// Lease-start triggers may retry, so calling this on an already active
    /// resource must succeed. A failure must not leave the resource looking
    /// active.
    async fn on_start(&self, resource_id: &ResourceId) -> Result<(), LeaseholdError>;

    /// Best-effort hook run some lead time before the lease ends.
    ///
    /// Not transactional: the caller logs a failure and still calls
    /// [`on_end`](Self::on_end).
    async fn before_end(&self, _resource_id: &ResourceId) -> Result<(), LeaseholdError> {
        Ok(())
    }

    /// Releases the resource when its lease ends.
    ///
    /// Must be idempotent: ending an already released resource is a no-op.
    async fn on_end(&self, resource_id: &ResourceId) -> Result<(), LeaseholdError>;
}
