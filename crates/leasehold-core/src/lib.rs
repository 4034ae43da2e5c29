// SPDX-FileCopyrightText: 2026 Leasehold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Leasehold reservation framework.
//!
//! This crate provides the plugin contract every resource type implements,
//! the reservation store interface, the lifecycle state machine, and the
//! shared error taxonomy.

pub mod error;
pub mod state;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{LeaseholdError, ReservationFailure};
pub use state::{LifecycleOp, ReservationState};
pub use traits::{ReservationStore, ResourcePlugin};
pub use types::{
    PluginConf, PluginInfo, PluginOption, Reservation, ReservationId, ReservationUpdate,
    ReservationValues, ResourceId,
};
