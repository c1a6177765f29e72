// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Shared application state: the registry store, passed explicitly to
//! each handler via router context rather than a process-wide
//! singleton (§9 "global module state").

use std::sync::Arc;

use ldms_registry_store::{FileKv, KvBackend, KvProxy, MemoryKv, RegistryStore};

use crate::config::Config;

pub struct AppState {
    pub store: RegistryStore,
}

impl AppState {
    pub fn new(store: RegistryStore) -> Arc<AppState> {
        Arc::new(AppState { store })
    }

    /// Build the KV backend from configured `members`: one [`FileKv`]
    /// per member (keyed by host:port under the data directory), or a
    /// single in-memory backend when no members are configured -- no
    /// etcd client exists in this workspace's dependency stack, so the
    /// member list addresses a generic [`KvBackend`] failover pool
    /// instead (see the project's design notes on this substitution).
    pub fn build_store(config: &Config, data_dir: &std::path::Path) -> Result<RegistryStore, String> {
        if config.members.is_empty() {
            return Ok(RegistryStore::new(Arc::new(MemoryKv::new())));
        }
        let mut backends: Vec<Arc<dyn KvBackend>> = Vec::with_capacity(config.members.len());
        for member in &config.members {
            let root = data_dir.join(format!("{}_{}", member.host, member.port));
            let backend = FileKv::new(root).map_err(|e| e.to_string())?;
            backends.push(Arc::new(backend));
        }
        Ok(RegistryStore::new(Arc::new(KvProxy::new(backends))))
    }
}
