// SPDX-FileCopyrightText: 2026 Leasehold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions for the Leasehold plugin architecture.
//!
//! Both traits use `#[async_trait]` for dynamic dispatch compatibility.

pub mod plugin;
pub mod store;

pub use plugin::ResourcePlugin;
pub use store::ReservationStore;
