// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::collections::BTreeMap;
use std::sync::Arc;

use ldms_registry_core::Schema;

use crate::error::RegistryError;
use crate::kv::KvBackend;

const OBJECTS_PREFIX: &str = "objects/";
const NAMES_PREFIX: &str = "index/names/";
const DIGESTS_PREFIX: &str = "index/digests/";

/// Content-addressed schema storage with secondary name and digest
/// indexes, built on top of any [`KvBackend`] (typically a
/// [`crate::proxy::KvProxy`] wrapping several endpoints).
///
/// Key layout:
/// - `objects/<id>` -> schema JSON body
/// - `index/names/<name>/<id>` -> `<id>`
/// - `index/digests/<hex>/<id>` -> `<id>`
pub struct RegistryStore {
    backend: Arc<dyn KvBackend>,
}

impl RegistryStore {
    pub fn new(backend: Arc<dyn KvBackend>) -> Self {
        RegistryStore { backend }
    }

    /// Add a schema. The object row is written only if absent (schemas
    /// are immutable, identified by content); re-adding the same body is
    /// a no-op that still returns the same id. On a fresh write, both
    /// secondary indexes are written unconditionally afterward.
    pub fn add(&self, schema: &Schema) -> Result<String, RegistryError> {
        let id = schema.id();
        let object_key = format!("{}{}", OBJECTS_PREFIX, id);
        let body = schema.as_json_string();
        let written = self.backend.put_if_absent(&object_key, body.as_bytes())?;
        if written {
            let name_key = format!("{}{}/{}", NAMES_PREFIX, schema.name, id);
            self.backend.put(&name_key, id.as_bytes())?;
            let digest_key = format!("{}{}/{}", DIGESTS_PREFIX, schema.digest_hex(), id);
            self.backend.put(&digest_key, id.as_bytes())?;
        }
        Ok(id)
    }

    pub fn get(&self, id: &str) -> Result<Schema, RegistryError> {
        let object_key = format!("{}{}", OBJECTS_PREFIX, id);
        let body = self
            .backend
            .get(&object_key)?
            .ok_or_else(|| RegistryError::SchemaNotFound(id.to_string()))?;
        let text = String::from_utf8_lossy(&body);
        Schema::from_json_str(&text).map_err(RegistryError::from)
    }

    /// Group registered names to the ids stored under them. If `name` is
    /// given, the result has at most one key.
    pub fn list_names(
        &self,
        name: Option<&str>,
    ) -> Result<BTreeMap<String, Vec<String>>, RegistryError> {
        let prefix = match name {
            Some(n) => format!("{}{}/", NAMES_PREFIX, n),
            None => NAMES_PREFIX.to_string(),
        };
        let entries = self.backend.list_prefix(&prefix)?;
        Ok(group_by_second_segment(&entries, NAMES_PREFIX))
    }

    /// Symmetric to [`RegistryStore::list_names`], grouped by hex digest.
    pub fn list_digests(
        &self,
        hex: Option<&str>,
    ) -> Result<BTreeMap<String, Vec<String>>, RegistryError> {
        let prefix = match hex {
            Some(h) => format!("{}{}/", DIGESTS_PREFIX, h.to_lowercase()),
            None => DIGESTS_PREFIX.to_string(),
        };
        let entries = self.backend.list_prefix(&prefix)?;
        Ok(group_by_second_segment(&entries, DIGESTS_PREFIX))
    }

    /// Delete the object and both index entries for `id`. Splits on the
    /// *last* `-` to recover `(name, hex)` -- schema names may themselves
    /// contain `-`. Missing keys are not an error.
    pub fn delete(&self, id: &str) -> Result<(), RegistryError> {
        let (name, hex) = split_id(id)?;
        self.backend
            .delete(&format!("{}{}", OBJECTS_PREFIX, id))?;
        self.backend
            .delete(&format!("{}{}/{}", NAMES_PREFIX, name, id))?;
        self.backend
            .delete(&format!("{}{}/{}", DIGESTS_PREFIX, hex, id))?;
        Ok(())
    }

    /// Delete every id registered under `name`, returning the deleted ids.
    pub fn delete_name(&self, name: &str) -> Result<Vec<String>, RegistryError> {
        let grouped = self.list_names(Some(name))?;
        let ids = grouped.get(name).cloned().unwrap_or_default();
        for id in &ids {
            self.delete(id)?;
        }
        Ok(ids)
    }

    /// Remove every object and index entry.
    pub fn purge(&self) -> Result<(), RegistryError> {
        self.backend.delete_prefix(OBJECTS_PREFIX)?;
        self.backend.delete_prefix(NAMES_PREFIX)?;
        self.backend.delete_prefix(DIGESTS_PREFIX)?;
        Ok(())
    }
}

fn split_id(id: &str) -> Result<(String, String), RegistryError> {
    match id.rsplit_once('-') {
        Some((name, hex)) => Ok((name.to_string(), hex.to_string())),
        None => Err(RegistryError::InvalidArgument(format!(
            "malformed schema id: {}",
            id
        ))),
    }
}

/// Entries come back as `<prefix><name-or-hex>/<id>`; group the trailing
/// id onto its middle segment.
fn group_by_second_segment(
    entries: &[(String, Vec<u8>)],
    prefix: &str,
) -> BTreeMap<String, Vec<String>> {
    let mut out: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, value) in entries {
        let rest = key.strip_prefix(prefix).unwrap_or(key);
        if let Some((segment, _id_part)) = rest.split_once('/') {
            let id = String::from_utf8_lossy(value).into_owned();
            out.entry(segment.to_string()).or_default().push(id);
        }
    }
    for ids in out.values_mut() {
        ids.sort();
        ids.dedup();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKv;
    use serde_json::json;

    fn meminfo() -> Schema {
        Schema::from_json(&json!({
            "schema": {
                "name": "meminfo",
                "type": "record",
                "fields": [{"name": "MemTotal", "type": "u64"}]
            }
        }))
        .unwrap()
    }

    #[test]
    fn add_then_get_roundtrips() {
        let store = RegistryStore::new(Arc::new(MemoryKv::new()));
        let schema = meminfo();
        let id = store.add(&schema).unwrap();
        let back = store.get(&id).unwrap();
        assert_eq!(back.digest(), schema.digest());
    }

    #[test]
    fn double_add_is_idempotent_and_returns_same_id() {
        let store = RegistryStore::new(Arc::new(MemoryKv::new()));
        let schema = meminfo();
        let id1 = store.add(&schema).unwrap();
        let id2 = store.add(&schema).unwrap();
        assert_eq!(id1, id2);
        let names = store.list_names(Some("meminfo")).unwrap();
        assert_eq!(names.get("meminfo").unwrap().len(), 1);
    }

    #[test]
    fn list_names_groups_by_name_and_matches_global_listing() {
        let store = RegistryStore::new(Arc::new(MemoryKv::new()));
        let id = store.add(&meminfo()).unwrap();
        let scoped = store.list_names(Some("meminfo")).unwrap();
        let global = store.list_names(None).unwrap();
        assert_eq!(scoped.get("meminfo").unwrap(), &vec![id.clone()]);
        assert_eq!(global.get("meminfo").unwrap(), &vec![id]);
    }

    #[test]
    fn delete_then_get_is_not_found() {
        let store = RegistryStore::new(Arc::new(MemoryKv::new()));
        let id = store.add(&meminfo()).unwrap();
        store.delete(&id).unwrap();
        assert_eq!(
            store.get(&id).unwrap_err(),
            RegistryError::SchemaNotFound(id)
        );
    }

    #[test]
    fn delete_name_removes_every_id_under_it() {
        let store = RegistryStore::new(Arc::new(MemoryKv::new()));
        store.add(&meminfo()).unwrap();
        let deleted = store.delete_name("meminfo").unwrap();
        assert_eq!(deleted.len(), 1);
        assert!(store.list_names(None).unwrap().get("meminfo").is_none());
    }

    #[test]
    fn purge_clears_everything() {
        let store = RegistryStore::new(Arc::new(MemoryKv::new()));
        let id = store.add(&meminfo()).unwrap();
        store.purge().unwrap();
        assert!(store.get(&id).is_err());
        assert!(store.list_names(None).unwrap().is_empty());
        assert!(store.list_digests(None).unwrap().is_empty());
    }

    #[test]
    fn id_with_dashed_name_splits_on_last_dash() {
        let (name, hex) = split_id("meminfo-extra-deadbeef").unwrap();
        assert_eq!(name, "meminfo-extra");
        assert_eq!(hex, "deadbeef");
    }
}
