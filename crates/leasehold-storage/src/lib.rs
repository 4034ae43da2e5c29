// SPDX-FileCopyrightText: 2026 Leasehold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reservation store implementations.
//!
//! Persistent backends live outside this workspace; [`MemoryStore`] keeps
//! records for the lifetime of the process and backs tests and the CLI.

pub mod memory;

pub use memory::MemoryStore;
