// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Authenticated HTTP surface for the schema registry (§4.4).
//!
//! ```text
//! axum::Router
//!   require_basic_auth (route_layer, pass-through if unconfigured)
//!        |
//!        v
//!   handlers::*  --uses-->  AppState { store: RegistryStore }
//! ```
//!
//! TLS is bootstrapped in the binary entry point, not this library: a
//! `keyfile`/`certfile` pair in [`config::Config`] selects
//! `axum_server::bind_rustls` over a plain `tokio` listener.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
