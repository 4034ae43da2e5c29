// SPDX-FileCopyrightText: 2026 Leasehold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service catalog model and endpoint resolution.
//!
//! Plugins use [`resolve`] to find the base URL of their backend's
//! management API inside a service catalog handed over by the
//! authentication layer. Both generations of endpoint descriptor are
//! understood:
//!
//! - `{"interface": "public", "url": "..."}` (one descriptor per interface)
//! - `{"publicURL": "...", "adminURL": "..."}` (one flat descriptor)

pub mod model;
pub mod resolver;

pub use model::{Endpoint, Service, ServiceCatalog};
pub use resolver::{effective_interface, resolve, FallbackPolicy, ResolveRequest, Resolver};
