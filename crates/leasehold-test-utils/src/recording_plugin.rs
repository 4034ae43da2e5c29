// SPDX-FileCopyrightText: 2026 Leasehold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin double for lifecycle tests.
//!
//! `RecordingPlugin` implements `ResourcePlugin`, records every call in
//! order, and can be told to fail at a given lifecycle step.

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::Mutex;

use leasehold_core::{
    LeaseholdError, PluginConf, PluginOption, ReservationFailure, ReservationId,
    ReservationValues, ResourceId, ResourcePlugin,
};

/// Lifecycle step at which a [`RecordingPlugin`] fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    Setup,
    Reserve(ReservationFailure),
    Start,
    BeforeEnd,
    End,
}

#[derive(Debug, Default)]
struct Recorded {
    calls: Vec<String>,
    reserved: HashSet<ReservationId>,
    conf: Option<PluginConf>,
}

/// A plugin that allocates `<resource_type>-<reservation_id>` and records calls.
#[derive(Debug)]
pub struct RecordingPlugin {
    resource_type: String,
    options: Vec<PluginOption>,
    failures: HashSet<FailPoint>,
    recorded: Mutex<Recorded>,
}

impl RecordingPlugin {
    /// Create a new plugin for `resource_type` that never fails.
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            options: Vec::new(),
            failures: HashSet::new(),
            recorded: Mutex::new(Recorded::default()),
        }
    }

    /// Declare an option at registration.
    pub fn with_option(mut self, option: PluginOption) -> Self {
        self.options.push(option);
        self
    }

    /// Fail at `point` on every call.
    pub fn failing_at(mut self, point: FailPoint) -> Self {
        self.failures.insert(point);
        self
    }

    /// Calls seen so far, e.g. `["setup", "reserve:r1", "start:rt-r1"]`.
    pub async fn calls(&self) -> Vec<String> {
        self.recorded.lock().await.calls.clone()
    }

    /// Number of recorded calls starting with `prefix`.
    pub async fn count(&self, prefix: &str) -> usize {
        self.recorded
            .lock()
            .await
            .calls
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    /// Configuration passed to `setup`, if it ran.
    pub async fn conf(&self) -> Option<PluginConf> {
        self.recorded.lock().await.conf.clone()
    }

    fn fails_at(&self, point: FailPoint) -> bool {
        self.failures.contains(&point)
    }

    async fn record(&self, call: String) {
        self.recorded.lock().await.calls.push(call);
    }
}

#[async_trait]
impl ResourcePlugin for RecordingPlugin {
    fn resource_type(&self) -> &str {
        &self.resource_type
    }

    fn title(&self) -> Option<&str> {
        Some("Recording plugin")
    }

    fn declare_options(&self) -> Vec<PluginOption> {
        self.options.clone()
    }

    async fn setup(&self, conf: &PluginConf) -> Result<(), LeaseholdError> {
        let mut recorded = self.recorded.lock().await;
        recorded.calls.push("setup".to_string());
        if self.fails_at(FailPoint::Setup) {
            return Err(LeaseholdError::Internal("injected setup failure".into()));
        }
        recorded.conf = Some(conf.clone());
        Ok(())
    }

    async fn reserve_resource(
        &self,
        reservation_id: &ReservationId,
        _values: &ReservationValues,
    ) -> Result<ResourceId, LeaseholdError> {
        let mut recorded = self.recorded.lock().await;
        recorded.calls.push(format!("reserve:{reservation_id}"));

        let injected = self.failures.iter().find_map(|p| match p {
            FailPoint::Reserve(reason) => Some(*reason),
            _ => None,
        });
        if let Some(reason) = injected {
            return Err(LeaseholdError::reservation(
                reservation_id.as_str(),
                reason,
                "injected reserve failure",
            ));
        }
        if !recorded.reserved.insert(reservation_id.clone()) {
            return Err(LeaseholdError::reservation(
                reservation_id.as_str(),
                ReservationFailure::Duplicate,
                "reservation id already used",
            ));
        }
        Ok(ResourceId(format!("{}-{reservation_id}", self.resource_type)))
    }

    async fn on_start(&self, resource_id: &ResourceId) -> Result<(), LeaseholdError> {
        self.record(format!("start:{resource_id}")).await;
        if self.fails_at(FailPoint::Start) {
            return Err(LeaseholdError::resource_state(
                resource_id.as_str(),
                "injected start failure",
            ));
        }
        Ok(())
    }

    async fn before_end(&self, resource_id: &ResourceId) -> Result<(), LeaseholdError> {
        self.record(format!("before_end:{resource_id}")).await;
        if self.fails_at(FailPoint::BeforeEnd) {
            return Err(LeaseholdError::Internal("injected before_end failure".into()));
        }
        Ok(())
    }

    async fn on_end(&self, resource_id: &ResourceId) -> Result<(), LeaseholdError> {
        self.record(format!("end:{resource_id}")).await;
        if self.fails_at(FailPoint::End) {
            return Err(LeaseholdError::resource_state(
                resource_id.as_str(),
                "injected end failure",
            ));
        }
        Ok(())
    }
}
