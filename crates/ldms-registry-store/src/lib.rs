// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Failover key/value access and content-addressed schema storage.
//!
//! ```text
//! RegistryStore
//!   .add(schema) --put_if_absent--> objects/<id>
//!                --put-----------> index/names/<name>/<id>
//!                --put-----------> index/digests/<hex>/<id>
//!        |
//!        v
//!    KvProxy  (failover across endpoints, one mutex-guarded "current" pointer)
//!        |
//!        v
//!  KvBackend  (FileKv | MemoryKv | ...)
//! ```

mod error;
mod kv;
mod proxy;
mod store;

pub use error::{KvError, RegistryError};
pub use kv::{FileKv, KvBackend, MemoryKv};
pub use proxy::KvProxy;
pub use store::RegistryStore;
