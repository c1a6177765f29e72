// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::fmt;

use ldms_registry_core::SchemaError;

/// Result of a single call against one KV endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KvError {
    /// The endpoint itself is unreachable or broke mid-call. The
    /// [`crate::proxy::KvProxy`] retries the next endpoint on this kind.
    Transport(String),
    /// The call was rejected for a reason unrelated to connectivity
    /// (bad key, permission denied). Propagated immediately, no retry.
    Invalid(String),
    /// Every configured endpoint failed with [`KvError::Transport`] in
    /// the same call. Distinct from a single `Transport` failure so it
    /// maps onto [`RegistryError::AllBackendsDown`] instead of
    /// [`RegistryError::BackendUnavailable`].
    AllBackendsDown,
}

impl fmt::Display for KvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KvError::Transport(msg) => write!(f, "kv transport error: {}", msg),
            KvError::Invalid(msg) => write!(f, "kv invalid argument: {}", msg),
            KvError::AllBackendsDown => write!(f, "all kv backends are down"),
        }
    }
}

impl std::error::Error for KvError {}

/// Error kinds surfaced by the registry store and, ultimately, by the
/// HTTP service (see the mapping table in its own crate).
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryError {
    BadSchema(SchemaError),
    DanglingRecordRef(String),
    DuplicateFieldName(String),
    SchemaNotFound(String),
    BackendUnavailable(String),
    AllBackendsDown,
    InvalidArgument(String),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::BadSchema(e) => write!(f, "bad schema: {}", e),
            RegistryError::DanglingRecordRef(name) => {
                write!(f, "record_array refers to unknown record type: {}", name)
            }
            RegistryError::DuplicateFieldName(name) => {
                write!(f, "duplicate field name: {}", name)
            }
            RegistryError::SchemaNotFound(id) => write!(f, "schema not found: {}", id),
            RegistryError::BackendUnavailable(msg) => write!(f, "backend unavailable: {}", msg),
            RegistryError::AllBackendsDown => write!(f, "all kv backends are down"),
            RegistryError::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
        }
    }
}

impl std::error::Error for RegistryError {}

impl From<SchemaError> for RegistryError {
    fn from(e: SchemaError) -> Self {
        match e {
            SchemaError::DanglingRecordRef(name) => RegistryError::DanglingRecordRef(name),
            SchemaError::DuplicateFieldName(name) => RegistryError::DuplicateFieldName(name),
            other => RegistryError::BadSchema(other),
        }
    }
}

impl From<KvError> for RegistryError {
    fn from(e: KvError) -> Self {
        match e {
            KvError::Transport(msg) => RegistryError::BackendUnavailable(msg),
            KvError::Invalid(msg) => RegistryError::InvalidArgument(msg),
            KvError::AllBackendsDown => RegistryError::AllBackendsDown,
        }
    }
}
