// SPDX-FileCopyrightText: 2026 Leasehold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lifecycle driver: runs plugin operations in state-machine order.
//!
//! Each call loads the reservation record, checks the transition, invokes the
//! plugin, and records the new state only once the plugin succeeded. No
//! operation is retried here; retry policy belongs to the caller.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, warn};

use leasehold_core::{
    LeaseholdError, LifecycleOp, Reservation, ReservationFailure, ReservationId,
    ReservationState, ReservationStore, ReservationUpdate, ReservationValues, ResourceId,
};

use crate::registry::PluginRegistry;

/// Drives reservations through reserve, start, and end against a store.
#[derive(Clone)]
pub struct LifecycleDriver {
    registry: Arc<PluginRegistry>,
    store: Arc<dyn ReservationStore>,
    before_end_lead: TimeDelta,
}

impl LifecycleDriver {
    pub fn new(registry: Arc<PluginRegistry>, store: Arc<dyn ReservationStore>) -> Self {
        Self {
            registry,
            store,
            before_end_lead: TimeDelta::zero(),
        }
    }

    /// Set how long before a lease's end `before_end` is due, from
    /// `[manager] before_end_lead_minutes`.
    pub fn with_before_end_lead_minutes(mut self, minutes: u64) -> Self {
        self.before_end_lead = i64::try_from(minutes)
            .ok()
            .and_then(TimeDelta::try_minutes)
            .unwrap_or(TimeDelta::MAX);
        self
    }

    pub fn before_end_lead(&self) -> TimeDelta {
        self.before_end_lead
    }

    /// When a scheduler should call [`before_end`](Self::before_end) for a
    /// lease ending at `ends_at`.
    pub fn before_end_due(&self, ends_at: DateTime<Utc>) -> DateTime<Utc> {
        ends_at
            .checked_sub_signed(self.before_end_lead)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Reserve a resource of `resource_type` for a new reservation id.
    ///
    /// A used id is rejected with [`ReservationFailure::Duplicate`] before
    /// the plugin is called. When the plugin fails the record stays
    /// unreserved. If the store write fails after the plugin allocated, the
    /// allocation is handed back through `on_end` and the store error is
    /// returned.
    pub async fn reserve(
        &self,
        reservation_id: &ReservationId,
        resource_type: &str,
        values: &ReservationValues,
    ) -> Result<ResourceId, LeaseholdError> {
        let plugin = self.registry.get(resource_type)?;

        let record = match self.store.reservation_get(reservation_id).await? {
            Some(record) => record,
            None => {
                let record = Reservation::new(reservation_id.clone(), resource_type);
                self.store.reservation_create(record.clone()).await?;
                record
            }
        };
        if record.resource_type != resource_type {
            return Err(LeaseholdError::reservation(
                reservation_id.as_str(),
                ReservationFailure::Validation,
                format!(
                    "reservation is for `{}`, not `{resource_type}`",
                    record.resource_type
                ),
            ));
        }
        let next = record.state.apply(LifecycleOp::Reserve, reservation_id.as_str())?;

        let resource_id = plugin.reserve_resource(reservation_id, values).await?;
        debug!(%reservation_id, %resource_id, resource_type, "reserved resource");

        let update = ReservationUpdate {
            resource_id: Some(resource_id.clone()),
            state: Some(next),
        };
        if let Err(err) = self.store.reservation_update(reservation_id, update).await {
            if let Err(release) = plugin.on_end(&resource_id).await {
                warn!(
                    %reservation_id,
                    %resource_id,
                    error = %release,
                    "could not release resource after store write failed"
                );
            }
            return Err(err);
        }
        Ok(resource_id)
    }

    /// Rebind a reserved or active reservation through its plugin.
    ///
    /// The plugin decides what a rebind means and writes the record itself.
    pub async fn update(
        &self,
        reservation_id: &ReservationId,
        values: &ReservationValues,
    ) -> Result<(), LeaseholdError> {
        let record = self.load(reservation_id).await?;
        record.state.apply(LifecycleOp::Update, reservation_id.as_str())?;
        let plugin = self.registry.get(&record.resource_type)?;
        plugin
            .update_reservation(self.store.as_ref(), reservation_id, values)
            .await
    }

    /// Activate the reserved resource. Retrying on an active one re-asserts it.
    pub async fn start(&self, reservation_id: &ReservationId) -> Result<(), LeaseholdError> {
        let record = self.load(reservation_id).await?;
        let resource_id = bound_resource(&record)?;
        let next = record.state.apply(LifecycleOp::Start, resource_id.as_str())?;
        let plugin = self.registry.get(&record.resource_type)?;

        plugin.on_start(&resource_id).await?;
        debug!(%reservation_id, %resource_id, "resource started");

        if next != record.state {
            self.store
                .reservation_update(reservation_id, ReservationUpdate::state(next))
                .await?;
        }
        Ok(())
    }

    /// Run the plugin's `before_end` hook.
    ///
    /// Hook failures are logged and swallowed so they never block `end`.
    /// Only lookup and state errors are returned.
    pub async fn before_end(&self, reservation_id: &ReservationId) -> Result<(), LeaseholdError> {
        let record = self.load(reservation_id).await?;
        let resource_id = bound_resource(&record)?;
        record.state.apply(LifecycleOp::BeforeEnd, resource_id.as_str())?;
        let plugin = self.registry.get(&record.resource_type)?;

        if let Err(err) = plugin.before_end(&resource_id).await {
            warn!(
                %reservation_id,
                %resource_id,
                error = %err,
                "before_end hook failed, continuing"
            );
        }
        Ok(())
    }

    /// Release the resource. Ending an ended reservation is a no-op.
    pub async fn end(&self, reservation_id: &ReservationId) -> Result<(), LeaseholdError> {
        let record = self.load(reservation_id).await?;
        if record.state.is_terminal() {
            debug!(%reservation_id, "reservation already ended");
            return Ok(());
        }
        let resource_id = bound_resource(&record)?;
        let next = record.state.apply(LifecycleOp::End, resource_id.as_str())?;
        let plugin = self.registry.get(&record.resource_type)?;

        plugin.on_end(&resource_id).await?;
        debug!(%reservation_id, %resource_id, "resource released");

        self.store
            .reservation_update(reservation_id, ReservationUpdate::state(next))
            .await?;
        Ok(())
    }

    /// `before_end` immediately followed by `end`.
    pub async fn finish(&self, reservation_id: &ReservationId) -> Result<(), LeaseholdError> {
        let record = self.load(reservation_id).await?;
        if !record.state.is_terminal() {
            self.before_end(reservation_id).await?;
        }
        self.end(reservation_id).await
    }

    /// Current recorded state. Unknown ids are unreserved.
    pub async fn state(
        &self,
        reservation_id: &ReservationId,
    ) -> Result<ReservationState, LeaseholdError> {
        Ok(self
            .store
            .reservation_get(reservation_id)
            .await?
            .map(|r| r.state)
            .unwrap_or(ReservationState::Unreserved))
    }

    async fn load(&self, reservation_id: &ReservationId) -> Result<Reservation, LeaseholdError> {
        self.store
            .reservation_get(reservation_id)
            .await?
            .ok_or_else(|| LeaseholdError::ReservationNotFound(reservation_id.to_string()))
    }
}

fn bound_resource(record: &Reservation) -> Result<ResourceId, LeaseholdError> {
    record.resource_id.clone().ok_or_else(|| {
        LeaseholdError::resource_state(
            record.id.as_str(),
            format!("no resource bound (state {})", record.state),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::InMemoryPoolPlugin;
    use leasehold_config::LeaseholdConfig;
    use leasehold_storage::MemoryStore;
    use serde_json::json;

    async fn driver(hosts: &[&str]) -> (LifecycleDriver, Arc<InMemoryPoolPlugin>) {
        let plugin = Arc::new(InMemoryPoolPlugin::new("physical_host"));
        let mut registry = PluginRegistry::new();
        registry.register(plugin.clone()).unwrap();

        let mut config = LeaseholdConfig::default();
        config.plugins.insert(
            "physical_host".into(),
            json!({ "hosts": hosts }).as_object().cloned().unwrap(),
        );
        registry.setup_all(&config).await.unwrap();

        let store: Arc<dyn ReservationStore> = Arc::new(MemoryStore::new());
        (LifecycleDriver::new(Arc::new(registry), store), plugin)
    }

    fn no_values() -> ReservationValues {
        ReservationValues::new()
    }

    #[tokio::test]
    async fn full_lifecycle_records_each_state() {
        let (driver, plugin) = driver(&["h1"]).await;
        let id = ReservationId::from("r1");

        assert_eq!(driver.state(&id).await.unwrap(), ReservationState::Unreserved);
        let resource = driver.reserve(&id, "physical_host", &no_values()).await.unwrap();
        assert_eq!(driver.state(&id).await.unwrap(), ReservationState::Reserved);

        driver.start(&id).await.unwrap();
        assert_eq!(driver.state(&id).await.unwrap(), ReservationState::Active);
        assert!(plugin.is_active(&resource).await);

        driver.finish(&id).await.unwrap();
        assert_eq!(driver.state(&id).await.unwrap(), ReservationState::Ended);
        assert!(plugin.allocations().await.is_empty());
    }

    #[tokio::test]
    async fn duplicate_reserve_is_rejected_before_the_plugin() {
        let (driver, plugin) = driver(&["h1", "h2"]).await;
        let id = ReservationId::from("r1");
        driver.reserve(&id, "physical_host", &no_values()).await.unwrap();

        let err = driver
            .reserve(&id, "physical_host", &no_values())
            .await
            .unwrap_err();
        assert_eq!(err.reservation_failure(), Some(ReservationFailure::Duplicate));
        assert_eq!(plugin.allocations().await.len(), 1);
    }

    #[tokio::test]
    async fn failed_reserve_leaves_record_unreserved() {
        let (driver, _plugin) = driver(&["h1"]).await;
        driver
            .reserve(&"r1".into(), "physical_host", &no_values())
            .await
            .unwrap();

        let id = ReservationId::from("r2");
        let err = driver
            .reserve(&id, "physical_host", &no_values())
            .await
            .unwrap_err();
        assert_eq!(err.reservation_failure(), Some(ReservationFailure::Capacity));
        assert_eq!(driver.state(&id).await.unwrap(), ReservationState::Unreserved);
    }

    #[tokio::test]
    async fn reserve_with_unknown_resource_type_fails() {
        let (driver, _plugin) = driver(&["h1"]).await;
        let err = driver
            .reserve(&"r1".into(), "network", &no_values())
            .await
            .unwrap_err();
        assert!(matches!(err, LeaseholdError::PluginNotFound { .. }));
    }

    #[tokio::test]
    async fn start_of_unknown_reservation_is_not_found() {
        let (driver, _plugin) = driver(&["h1"]).await;
        let err = driver.start(&"ghost".into()).await.unwrap_err();
        assert!(matches!(err, LeaseholdError::ReservationNotFound(_)));
    }

    #[tokio::test]
    async fn end_twice_is_a_noop() {
        let (driver, plugin) = driver(&["h1"]).await;
        let id = ReservationId::from("r1");
        driver.reserve(&id, "physical_host", &no_values()).await.unwrap();
        driver.start(&id).await.unwrap();

        driver.end(&id).await.unwrap();
        driver.end(&id).await.unwrap();
        driver.finish(&id).await.unwrap();
        assert_eq!(driver.state(&id).await.unwrap(), ReservationState::Ended);
        assert_eq!(plugin.free_hosts().await, vec!["h1"]);
    }

    #[tokio::test]
    async fn end_of_reserved_but_never_started_is_rejected() {
        let (driver, _plugin) = driver(&["h1"]).await;
        let id = ReservationId::from("r1");
        driver.reserve(&id, "physical_host", &no_values()).await.unwrap();

        let err = driver.end(&id).await.unwrap_err();
        assert!(matches!(err, LeaseholdError::ResourceState { .. }));
        assert_eq!(driver.state(&id).await.unwrap(), ReservationState::Reserved);
    }

    #[tokio::test]
    async fn update_moves_lease_and_end_frees_every_host() {
        let (driver, plugin) = driver(&["h1", "h2"]).await;
        let id = ReservationId::from("r1");
        let first = driver.reserve(&id, "physical_host", &no_values()).await.unwrap();
        assert_eq!(first.as_str(), "h1@r1");

        let values = json!({"resource_id": "h2@r1"}).as_object().cloned().unwrap();
        driver.update(&id, &values).await.unwrap();

        let record = driver.store.reservation_get(&id).await.unwrap().unwrap();
        assert_eq!(record.resource_id, Some("h2@r1".into()));
        assert_eq!(record.state, ReservationState::Reserved);
        assert_eq!(plugin.free_hosts().await, vec!["h1"]);

        driver.start(&id).await.unwrap();
        assert!(plugin.is_active(&"h2@r1".into()).await);
        driver.end(&id).await.unwrap();
        assert_eq!(plugin.free_hosts().await, vec!["h1", "h2"]);
        assert!(plugin.allocations().await.is_empty());
    }

    #[tokio::test]
    async fn update_to_another_reservations_id_is_rejected() {
        let (driver, plugin) = driver(&["h1"]).await;
        let id = ReservationId::from("r1");
        driver.reserve(&id, "physical_host", &no_values()).await.unwrap();

        let values = json!({"resource_id": "h1@moved"}).as_object().cloned().unwrap();
        let err = driver.update(&id, &values).await.unwrap_err();
        assert_eq!(err.reservation_failure(), Some(ReservationFailure::Validation));

        let record = driver.store.reservation_get(&id).await.unwrap().unwrap();
        assert_eq!(record.resource_id, Some("h1@r1".into()));
        driver.start(&id).await.unwrap();
        driver.end(&id).await.unwrap();
        assert_eq!(plugin.free_hosts().await, vec!["h1"]);
    }

    #[tokio::test]
    async fn update_after_end_is_rejected() {
        let (driver, _plugin) = driver(&["h1"]).await;
        let id = ReservationId::from("r1");
        driver.reserve(&id, "physical_host", &no_values()).await.unwrap();
        driver.start(&id).await.unwrap();
        driver.end(&id).await.unwrap();

        let values = json!({"resource_id": "h1@other"}).as_object().cloned().unwrap();
        let err = driver.update(&id, &values).await.unwrap_err();
        assert!(matches!(err, LeaseholdError::ResourceState { .. }));
    }

    /// Plugin whose start and before_end hooks always fail.
    struct FlakyHooks;

    #[async_trait::async_trait]
    impl leasehold_core::ResourcePlugin for FlakyHooks {
        fn resource_type(&self) -> &str {
            "flaky"
        }

        async fn reserve_resource(
            &self,
            reservation_id: &ReservationId,
            _values: &ReservationValues,
        ) -> Result<ResourceId, LeaseholdError> {
            Ok(ResourceId(format!("flaky-{reservation_id}")))
        }

        async fn on_start(&self, resource_id: &ResourceId) -> Result<(), LeaseholdError> {
            if resource_id.as_str().ends_with("cold") {
                return Err(LeaseholdError::resource_state(resource_id.as_str(), "host is down"));
            }
            Ok(())
        }

        async fn before_end(&self, _resource_id: &ResourceId) -> Result<(), LeaseholdError> {
            Err(LeaseholdError::Internal("notification backend unreachable".into()))
        }

        async fn on_end(&self, _resource_id: &ResourceId) -> Result<(), LeaseholdError> {
            Ok(())
        }
    }

    async fn flaky_driver() -> LifecycleDriver {
        let mut registry = PluginRegistry::new();
        registry.register(Arc::new(FlakyHooks)).unwrap();
        LifecycleDriver::new(Arc::new(registry), Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn before_end_failure_is_logged_and_end_proceeds() {
        let driver = flaky_driver().await;
        let id = ReservationId::from("warm");
        driver.reserve(&id, "flaky", &no_values()).await.unwrap();
        driver.start(&id).await.unwrap();

        driver.finish(&id).await.unwrap();
        assert_eq!(driver.state(&id).await.unwrap(), ReservationState::Ended);
        assert!(logs_contain("before_end hook failed"));
        assert!(logs_contain("notification backend unreachable"));
    }

    #[tokio::test]
    async fn failed_start_leaves_reservation_reserved() {
        let driver = flaky_driver().await;
        let id = ReservationId::from("cold");
        driver.reserve(&id, "flaky", &no_values()).await.unwrap();

        let err = driver.start(&id).await.unwrap_err();
        assert!(matches!(err, LeaseholdError::ResourceState { .. }));
        assert_eq!(driver.state(&id).await.unwrap(), ReservationState::Reserved);
    }

    /// Store that accepts creates but fails every update.
    struct FailingUpdates(MemoryStore);

    #[async_trait::async_trait]
    impl ReservationStore for FailingUpdates {
        async fn reservation_create(&self, reservation: Reservation) -> Result<(), LeaseholdError> {
            self.0.reservation_create(reservation).await
        }

        async fn reservation_get(
            &self,
            id: &ReservationId,
        ) -> Result<Option<Reservation>, LeaseholdError> {
            self.0.reservation_get(id).await
        }

        async fn reservation_update(
            &self,
            _id: &ReservationId,
            _update: ReservationUpdate,
        ) -> Result<Reservation, LeaseholdError> {
            Err(LeaseholdError::Internal("disk full".into()))
        }

        async fn reservation_list(&self) -> Result<Vec<Reservation>, LeaseholdError> {
            self.0.reservation_list().await
        }
    }

    #[tokio::test]
    async fn failed_record_write_releases_the_allocation() {
        let plugin = Arc::new(InMemoryPoolPlugin::new("physical_host"));
        let mut registry = PluginRegistry::new();
        registry.register(plugin.clone()).unwrap();
        let mut config = LeaseholdConfig::default();
        config.plugins.insert(
            "physical_host".into(),
            json!({ "hosts": ["h1"] }).as_object().cloned().unwrap(),
        );
        registry.setup_all(&config).await.unwrap();
        let driver = LifecycleDriver::new(
            Arc::new(registry),
            Arc::new(FailingUpdates(MemoryStore::new())),
        );

        let id = ReservationId::from("r1");
        let err = driver.reserve(&id, "physical_host", &no_values()).await.unwrap_err();
        assert!(matches!(err, LeaseholdError::Internal(ref msg) if msg == "disk full"));
        assert!(plugin.allocations().await.is_empty());
        assert_eq!(plugin.free_hosts().await, vec!["h1"]);
        assert_eq!(driver.state(&id).await.unwrap(), ReservationState::Unreserved);
    }

    #[tokio::test]
    async fn before_end_lead_defaults_to_zero() {
        let (driver, _plugin) = driver(&["h1"]).await;
        let ends_at = Utc::now();
        assert_eq!(driver.before_end_lead(), TimeDelta::zero());
        assert_eq!(driver.before_end_due(ends_at), ends_at);
    }

    #[tokio::test]
    async fn before_end_is_due_lead_minutes_before_the_end() {
        let (driver, _plugin) = driver(&["h1"]).await;
        let driver = driver.with_before_end_lead_minutes(45);
        assert_eq!(driver.before_end_lead(), TimeDelta::minutes(45));

        let ends_at = DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let due = driver.before_end_due(ends_at);
        assert_eq!(due.to_rfc3339(), "2026-03-01T11:15:00+00:00");
    }

    #[tokio::test]
    async fn huge_lead_saturates_instead_of_overflowing() {
        let (driver, _plugin) = driver(&["h1"]).await;
        let driver = driver.with_before_end_lead_minutes(u64::MAX);
        assert_eq!(driver.before_end_lead(), TimeDelta::MAX);
        assert_eq!(driver.before_end_due(Utc::now()), DateTime::<Utc>::MIN_UTC);
    }
}
