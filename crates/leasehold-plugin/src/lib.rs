// SPDX-FileCopyrightText: 2026 Leasehold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin registry, lifecycle driver, and the reference in-memory plugin.
//!
//! The [`PluginRegistry`] maps resource types to plugin instances and sets
//! them up from configuration once at startup. The [`LifecycleDriver`]
//! walks reservations through the lifecycle state machine against a
//! reservation store. [`InMemoryPoolPlugin`] reserves hosts from a fixed,
//! configured pool and is the reference implementation of the contract.

pub mod lifecycle;
pub mod pool;
pub mod registry;

pub use lifecycle::LifecycleDriver;
pub use pool::InMemoryPoolPlugin;
pub use registry::{PluginRegistry, SetupError};
