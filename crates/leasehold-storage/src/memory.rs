// SPDX-FileCopyrightText: 2026 Leasehold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory implementation of the ReservationStore trait.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use leasehold_core::{
    LeaseholdError, Reservation, ReservationId, ReservationStore, ReservationUpdate,
};

/// Reservation records held in a process-local map.
///
/// Every method takes the lock once, so each call is atomic with respect to
/// the others.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<ReservationId, Reservation>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored reservations.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns true if no reservations are stored.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl ReservationStore for MemoryStore {
    async fn reservation_create(&self, reservation: Reservation) -> Result<(), LeaseholdError> {
        let mut records = self.records.write().await;
        if records.contains_key(&reservation.id) {
            return Err(LeaseholdError::Storage {
                source: format!("reservation {} already exists", reservation.id).into(),
            });
        }
        debug!(reservation_id = %reservation.id, "creating reservation record");
        records.insert(reservation.id.clone(), reservation);
        Ok(())
    }

    async fn reservation_get(
        &self,
        id: &ReservationId,
    ) -> Result<Option<Reservation>, LeaseholdError> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn reservation_update(
        &self,
        id: &ReservationId,
        update: ReservationUpdate,
    ) -> Result<Reservation, LeaseholdError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(id)
            .ok_or_else(|| LeaseholdError::ReservationNotFound(id.to_string()))?;
        update.apply_to(record);
        debug!(
            reservation_id = %id,
            state = %record.state,
            resource_id = ?record.resource_id,
            "updated reservation record"
        );
        Ok(record.clone())
    }

    async fn reservation_list(&self) -> Result<Vec<Reservation>, LeaseholdError> {
        Ok(self.records.read().await.values().cloned().collect())
    }
}
