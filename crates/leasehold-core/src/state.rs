// SPDX-FileCopyrightText: 2026 Leasehold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reservation lifecycle state machine.
//!
//! ```text
//! Unreserved --reserve--> Reserved --start--> Active --end--> Ended
//!                            |  ^               | ^  ^        |
//!                            update             update/      end (no-op)
//!                                               start/before_end
//! ```
//!
//! `Reserved` is only reachable from `Unreserved`; a used reservation id is
//! never reserved again.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{LeaseholdError, ReservationFailure};

/// State of a reservation as seen by its plugin.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReservationState {
    Unreserved,
    Reserved,
    Active,
    Ended,
}

/// A lifecycle operation driven by the reservation manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum LifecycleOp {
    Reserve,
    Update,
    Start,
    BeforeEnd,
    End,
}

impl ReservationState {
    /// Returns the state after applying `op`, or an error if `op` is not
    /// allowed from this state.
    ///
    /// `subject` names the reservation or resource in the error.
    pub fn apply(self, op: LifecycleOp, subject: &str) -> Result<Self, LeaseholdError> {
        use LifecycleOp as Op;
        use ReservationState as S;

        match (self, op) {
            (S::Unreserved, Op::Reserve) => Ok(S::Reserved),
            (_, Op::Reserve) => Err(LeaseholdError::reservation(
                subject,
                ReservationFailure::Duplicate,
                format!("reservation id already used (state {self})"),
            )),
            (S::Reserved | S::Active, Op::Update) => Ok(self),
            (S::Reserved | S::Active, Op::Start) => Ok(S::Active),
            (S::Active, Op::BeforeEnd) => Ok(S::Active),
            (S::Active | S::Ended, Op::End) => Ok(S::Ended),
            (state, op) => Err(LeaseholdError::resource_state(
                subject,
                format!("cannot {op} from state {state}"),
            )),
        }
    }

    /// Whether the resource is provisioned and in use.
    pub fn is_active(self) -> bool {
        self == Self::Active
    }

    /// Whether no further lifecycle step can change this state.
    pub fn is_terminal(self) -> bool {
        self == Self::Ended
    }
}
