// SPDX-FileCopyrightText: 2026 Leasehold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reservation store trait for persistence backends.

use async_trait::async_trait;

use crate::error::LeaseholdError;
use crate::types::{Reservation, ReservationId, ReservationUpdate};

/// CRUD access to reservation records.
///
/// The store owns reservation identity; plugins only ever replace the
/// `resource_id` field through [`ReservationStore::reservation_update`].
#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// Inserts a new record. Fails if a record with the same id exists.
    async fn reservation_create(&self, reservation: Reservation) -> Result<(), LeaseholdError>;

    /// Fetches a record by id.
    async fn reservation_get(
        &self,
        id: &ReservationId,
    ) -> Result<Option<Reservation>, LeaseholdError>;

    /// Applies field updates and returns the updated record.
    ///
    /// Fails with [`LeaseholdError::ReservationNotFound`] if the id is unknown.
    async fn reservation_update(
        &self,
        id: &ReservationId,
        update: ReservationUpdate,
    ) -> Result<Reservation, LeaseholdError>;

    /// Lists all records ordered by id.
    async fn reservation_list(&self) -> Result<Vec<Reservation>, LeaseholdError>;
}
