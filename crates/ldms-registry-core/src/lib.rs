// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Core schema entities for the LDMS schema registry.
//!
//! ```text
//! JSON (producer/updater)          in-memory                  registry
//! {"schema": {...}}  --parse-->  Schema { fields: Vec<MetricField> }
//!                                     |
//!                                     |-- digest() --> SHA-256 fingerprint
//!                                     |-- compatible(&other) --> bool
//!                                     '-- id() --> "<name>-<hex digest>"
//! ```
//!
//! This crate has no I/O: it only knows how to parse, print, fingerprint,
//! and compare schemas. Storage lives in `ldms-registry-store`, the HTTP
//! surface in `ldms-registry-server`.

mod error;
mod field;
mod value_type;

pub use error::SchemaError;
pub use field::{MetricDescriptor, MetricField, Schema};
pub use value_type::ValueType;
