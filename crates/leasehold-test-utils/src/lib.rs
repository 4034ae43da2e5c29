// SPDX-FileCopyrightText: 2026 Leasehold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Leasehold integration tests.
//!
//! Provides a recording plugin double and a harness that wires a registry,
//! an in-memory store, and a lifecycle driver together.
//!
//! # Components
//!
//! - [`RecordingPlugin`] - Plugin double that counts calls and injects failures
//! - [`TestHarness`] - Registry + store + driver assembled from a plugin list

pub mod harness;
pub mod recording_plugin;

pub use harness::TestHarness;
pub use recording_plugin::{FailPoint, RecordingPlugin};
