// SPDX-FileCopyrightText: 2026 Leasehold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Concurrent lifecycle runs against one shared pool plugin.

use std::collections::HashSet;
use std::sync::Arc;

use leasehold_config::LeaseholdConfig;
use leasehold_core::{
    ReservationFailure, ReservationId, ReservationState, ReservationStore, ReservationValues,
};
use leasehold_plugin::{InMemoryPoolPlugin, LifecycleDriver, PluginRegistry};
use leasehold_storage::MemoryStore;
use serde_json::json;

async fn driver_with_hosts(count: usize) -> (LifecycleDriver, Arc<InMemoryPoolPlugin>) {
    let hosts: Vec<String> = (0..count).map(|i| format!("node-{i}")).collect();
    let plugin = Arc::new(InMemoryPoolPlugin::default());
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

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn distinct_reservations_run_to_completion_concurrently() {
    let (driver, plugin) = driver_with_hosts(8).await;

    let runs = (0..8).map(|i| {
        let driver = driver.clone();
        tokio::spawn(async move {
            let id = ReservationId(format!("lease-{i}"));
            let resource = driver
                .reserve(&id, "physical_host", &ReservationValues::new())
                .await?;
            driver.start(&id).await?;
            Ok::<_, leasehold_core::LeaseholdError>((id, resource))
        })
    });
    let results = futures::future::join_all(runs).await;

    let mut hosts = HashSet::new();
    let mut ids = Vec::new();
    for result in results {
        let (id, resource) = result.unwrap().unwrap();
        let host = resource.as_str().split('@').next().unwrap().to_string();
        assert!(hosts.insert(host), "host handed out twice");
        ids.push(id);
    }
    assert!(plugin.free_hosts().await.is_empty());

    let ends = ids.into_iter().map(|id| {
        let driver = driver.clone();
        tokio::spawn(async move {
            driver.finish(&id).await?;
            driver.state(&id).await
        })
    });
    for state in futures::future::join_all(ends).await {
        assert_eq!(state.unwrap().unwrap(), ReservationState::Ended);
    }
    assert_eq!(plugin.free_hosts().await.len(), 8);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_reserves_of_one_id_allocate_once() {
    let (driver, plugin) = driver_with_hosts(4).await;

    let racers = (0..4).map(|_| {
        let driver = driver.clone();
        tokio::spawn(async move {
            driver
                .reserve(&"shared".into(), "physical_host", &ReservationValues::new())
                .await
        })
    });
    let results: Vec<_> = futures::future::join_all(racers)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert!(matches!(
            err.reservation_failure(),
            Some(ReservationFailure::Duplicate)
        ) || matches!(err, leasehold_core::LeaseholdError::Storage { .. }));
    }
    assert_eq!(plugin.allocations().await.len(), 1);
}
