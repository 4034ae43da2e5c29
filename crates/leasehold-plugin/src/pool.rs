// SPDX-FileCopyrightText: 2026 Leasehold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reference plugin leasing hosts out of a fixed in-memory pool.
//!
//! Resource ids have the form `<host>@<reservation_id>`, so a late `on_end`
//! for an old lease can never free a host that was handed to a newer one.
//! A lease can be moved to another free host with `update_reservation`;
//! the move and the store write happen under the pool lock.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info};

use leasehold_core::{
    LeaseholdError, PluginConf, PluginOption, ReservationFailure, ReservationId,
    ReservationStore, ReservationUpdate, ReservationValues, ResourceId, ResourcePlugin,
};

/// Resource type used when none is given.
pub const DEFAULT_RESOURCE_TYPE: &str = "physical_host";

#[derive(Debug)]
struct Lease {
    reservation_id: ReservationId,
    host: String,
    active: bool,
}

#[derive(Debug)]
struct HostPool {
    hosts: Vec<String>,
    allow_host_selection: bool,
    leases: HashMap<ResourceId, Lease>,
    busy: HashMap<String, ResourceId>,
    seen: HashSet<ReservationId>,
}

impl HostPool {
    fn from_conf(resource_type: &str, conf: &PluginConf) -> Result<Self, LeaseholdError> {
        let hosts = conf.get_str_list("hosts").ok_or_else(|| {
            LeaseholdError::Config(format!(
                "plugins.{resource_type}.hosts must be a list of host names"
            ))
        })?;
        if hosts.is_empty() {
            return Err(LeaseholdError::Config(format!(
                "plugins.{resource_type}.hosts must not be empty"
            )));
        }
        let mut unique = HashSet::new();
        for host in &hosts {
            if !unique.insert(host.as_str()) {
                return Err(LeaseholdError::Config(format!(
                    "plugins.{resource_type}.hosts lists `{host}` twice"
                )));
            }
        }

        Ok(Self {
            hosts,
            allow_host_selection: conf.get_bool("allow_host_selection").unwrap_or(true),
            leases: HashMap::new(),
            busy: HashMap::new(),
            seen: HashSet::new(),
        })
    }

    fn pick_host(
        &self,
        reservation_id: &ReservationId,
        values: &ReservationValues,
    ) -> Result<String, LeaseholdError> {
        let reject = |reason, message: String| {
            Err(LeaseholdError::reservation(reservation_id.as_str(), reason, message))
        };

        match values.get("host") {
            None | Some(Value::Null) => match self.hosts.iter().find(|h| !self.busy.contains_key(*h)) {
                Some(host) => Ok(host.clone()),
                None => reject(
                    ReservationFailure::Capacity,
                    format!("all {} hosts are leased", self.hosts.len()),
                ),
            },
            Some(Value::String(host)) => {
                if !self.allow_host_selection {
                    return reject(
                        ReservationFailure::Validation,
                        "host selection is disabled".to_string(),
                    );
                }
                if !self.hosts.contains(host) {
                    return reject(
                        ReservationFailure::Validation,
                        format!("unknown host `{host}`"),
                    );
                }
                if self.busy.contains_key(host) {
                    return reject(
                        ReservationFailure::Capacity,
                        format!("host `{host}` is already leased"),
                    );
                }
                Ok(host.clone())
            }
            Some(_) => reject(
                ReservationFailure::Validation,
                "`host` must be a string".to_string(),
            ),
        }
    }

    /// Validates a rebind of `reservation_id` to `target` and returns the
    /// lease's current resource id and the target host.
    fn check_rebind(
        &self,
        reservation_id: &ReservationId,
        target: &ResourceId,
    ) -> Result<(ResourceId, String), LeaseholdError> {
        let reject = |reason, message: String| {
            Err(LeaseholdError::reservation(reservation_id.as_str(), reason, message))
        };

        let Some((host, owner)) = target.as_str().split_once('@') else {
            return reject(
                ReservationFailure::Validation,
                format!("`{target}` is not of the form <host>@<reservation_id>"),
            );
        };
        if owner != reservation_id.as_str() {
            return reject(
                ReservationFailure::Validation,
                format!("`{target}` belongs to another reservation"),
            );
        }
        let Some(current) = self
            .leases
            .iter()
            .find(|(_, lease)| lease.reservation_id == *reservation_id)
            .map(|(id, _)| id.clone())
        else {
            return reject(
                ReservationFailure::Validation,
                "reservation holds no lease".to_string(),
            );
        };
        if current == *target {
            return Ok((current, host.to_string()));
        }
        if !self.allow_host_selection {
            return reject(
                ReservationFailure::Validation,
                "host selection is disabled".to_string(),
            );
        }
        if !self.hosts.iter().any(|h| h == host) {
            return reject(
                ReservationFailure::Validation,
                format!("unknown host `{host}`"),
            );
        }
        if self.busy.contains_key(host) {
            return reject(
                ReservationFailure::Capacity,
                format!("host `{host}` is already leased"),
            );
        }
        Ok((current, host.to_string()))
    }

    /// Moves the lease at `from` to `host`, keeping its active flag.
    fn relocate(&mut self, from: &ResourceId, to: ResourceId, host: String) {
        if let Some(mut lease) = self.leases.remove(from) {
            self.busy.remove(&lease.host);
            lease.host = host.clone();
            self.busy.insert(host, to.clone());
            self.leases.insert(to, lease);
        }
    }
}

/// Leases hosts from a configured list, one reservation per host.
#[derive(Debug)]
pub struct InMemoryPoolPlugin {
    resource_type: String,
    pool: Mutex<Option<HostPool>>,
}

impl InMemoryPoolPlugin {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            pool: Mutex::new(None),
        }
    }

    /// Current allocations as resource id to host.
    pub async fn allocations(&self) -> BTreeMap<ResourceId, String> {
        let pool = self.pool.lock().await;
        pool.iter()
            .flat_map(|p| p.leases.iter())
            .map(|(id, lease)| (id.clone(), lease.host.clone()))
            .collect()
    }

    /// Whether `resource_id` is allocated and started.
    pub async fn is_active(&self, resource_id: &ResourceId) -> bool {
        let pool = self.pool.lock().await;
        pool.as_ref()
            .and_then(|p| p.leases.get(resource_id))
            .is_some_and(|lease| lease.active)
    }

    /// Hosts not leased to any reservation, in configured order.
    pub async fn free_hosts(&self) -> Vec<String> {
        let pool = self.pool.lock().await;
        match pool.as_ref() {
            Some(p) => p
                .hosts
                .iter()
                .filter(|h| !p.busy.contains_key(*h))
                .cloned()
                .collect(),
            None => Vec::new(),
        }
    }
}

impl Default for InMemoryPoolPlugin {
    fn default() -> Self {
        Self::new(DEFAULT_RESOURCE_TYPE)
    }
}

#[async_trait]
impl ResourcePlugin for InMemoryPoolPlugin {
    fn resource_type(&self) -> &str {
        &self.resource_type
    }

    fn title(&self) -> Option<&str> {
        Some("In-memory host pool")
    }

    fn description(&self) -> Option<&str> {
        Some("Leases hosts from a fixed list held in process memory")
    }

    fn declare_options(&self) -> Vec<PluginOption> {
        vec![
            PluginOption::required("hosts")
                .with_help("Host names to lease, as a list or comma-separated string"),
            PluginOption::optional("allow_host_selection", true)
                .with_help("Let reservations request a specific host via `host`"),
        ]
    }

    async fn setup(&self, conf: &PluginConf) -> Result<(), LeaseholdError> {
        let mut pool = self.pool.lock().await;
        if pool.is_some() {
            debug!(resource_type = %self.resource_type, "host pool already set up");
            return Ok(());
        }
        let hosts = HostPool::from_conf(&self.resource_type, conf)?;
        info!(
            resource_type = %self.resource_type,
            hosts = hosts.hosts.len(),
            allow_host_selection = hosts.allow_host_selection,
            "host pool ready"
        );
        *pool = Some(hosts);
        Ok(())
    }

    async fn reserve_resource(
        &self,
        reservation_id: &ReservationId,
        values: &ReservationValues,
    ) -> Result<ResourceId, LeaseholdError> {
        let mut guard = self.pool.lock().await;
        let pool = guard.as_mut().ok_or_else(|| {
            LeaseholdError::reservation(
                reservation_id.as_str(),
                ReservationFailure::BackendUnavailable,
                "host pool is not set up",
            )
        })?;

        if pool.seen.contains(reservation_id) {
            return Err(LeaseholdError::reservation(
                reservation_id.as_str(),
                ReservationFailure::Duplicate,
                "reservation id already used",
            ));
        }

        let host = pool.pick_host(reservation_id, values)?;
        let resource_id = ResourceId(format!("{host}@{reservation_id}"));
        pool.seen.insert(reservation_id.clone());
        pool.busy.insert(host.clone(), resource_id.clone());
        pool.leases.insert(
            resource_id.clone(),
            Lease {
                reservation_id: reservation_id.clone(),
                host: host.clone(),
                active: false,
            },
        );
        debug!(%reservation_id, %host, "leased host");
        Ok(resource_id)
    }

    /// Moves the reservation's lease to the host named in
    /// `values["resource_id"]` (`<host>@<reservation_id>`).
    ///
    /// The target host must be configured and free. The move is undone
    /// when the store write fails.
    async fn update_reservation(
        &self,
        store: &dyn ReservationStore,
        reservation_id: &ReservationId,
        values: &ReservationValues,
    ) -> Result<(), LeaseholdError> {
        let target = match values.get("resource_id") {
            Some(Value::String(id)) => ResourceId(id.clone()),
            _ => {
                return Err(LeaseholdError::reservation(
                    reservation_id.as_str(),
                    ReservationFailure::Validation,
                    "`resource_id` must be a string",
                ));
            }
        };

        let mut guard = self.pool.lock().await;
        let pool = guard.as_mut().ok_or_else(|| {
            LeaseholdError::reservation(
                reservation_id.as_str(),
                ReservationFailure::BackendUnavailable,
                "host pool is not set up",
            )
        })?;

        let (current, host) = pool.check_rebind(reservation_id, &target)?;
        if current == target {
            debug!(%reservation_id, %target, "lease already on requested host");
            return Ok(());
        }
        let previous_host = pool
            .leases
            .get(&current)
            .map(|lease| lease.host.clone())
            .unwrap_or_default();
        pool.relocate(&current, target.clone(), host.clone());

        if let Err(err) = store
            .reservation_update(reservation_id, ReservationUpdate::resource_id(target.clone()))
            .await
        {
            pool.relocate(&target, current, previous_host);
            return Err(err);
        }
        debug!(%reservation_id, from = %current, to = %target, "lease moved");
        Ok(())
    }

    async fn on_start(&self, resource_id: &ResourceId) -> Result<(), LeaseholdError> {
        let mut guard = self.pool.lock().await;
        let lease = guard
            .as_mut()
            .and_then(|p| p.leases.get_mut(resource_id))
            .ok_or_else(|| {
                LeaseholdError::resource_state(resource_id.as_str(), "resource is not allocated")
            })?;
        if lease.active {
            debug!(%resource_id, "lease already active");
        } else {
            lease.active = true;
            debug!(%resource_id, host = %lease.host, "lease started");
        }
        Ok(())
    }

    async fn on_end(&self, resource_id: &ResourceId) -> Result<(), LeaseholdError> {
        let mut guard = self.pool.lock().await;
        let Some(pool) = guard.as_mut() else {
            return Ok(());
        };
        match pool.leases.remove(resource_id) {
            Some(lease) => {
                if pool.busy.get(&lease.host) == Some(resource_id) {
                    pool.busy.remove(&lease.host);
                }
                debug!(%resource_id, host = %lease.host, "host returned to pool");
            }
            None => debug!(%resource_id, "lease already released"),
        }
        Ok(())
    }
}
