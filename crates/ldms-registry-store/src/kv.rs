// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::KvError;

/// A single KV endpoint's client interface: get/put/put-if-absent/delete
/// plus prefix scan and prefix delete, used for index queries and purge.
///
/// Implementors serialize their own internal access; `KvProxy` calls
/// through an immutable `&self` so endpoints can be shared across
/// threads behind an `Arc`.
pub trait KvBackend: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KvError>;
    fn put(&self, key: &str, value: &[u8]) -> Result<(), KvError>;
    /// Returns `true` if the key was absent and is now written, `false`
    /// if it already existed (value left untouched).
    fn put_if_absent(&self, key: &str, value: &[u8]) -> Result<bool, KvError>;
    fn delete(&self, key: &str) -> Result<(), KvError>;
    fn list_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KvError>;
    fn delete_prefix(&self, prefix: &str) -> Result<(), KvError>;
}

/// In-memory KV backend, mainly for tests and for a single-node
/// deployment with no replicated metadata store.
pub struct MemoryKv {
    entries: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        MemoryKv {
            entries: Mutex::new(BTreeMap::new()),
        }
    }
}

impl Default for MemoryKv {
    fn default() -> Self {
        Self::new()
    }
}

impl KvBackend for MemoryKv {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KvError> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), KvError> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn put_if_absent(&self, key: &str, value: &[u8]) -> Result<bool, KvError> {
        let mut map = self.entries.lock().unwrap();
        if map.contains_key(key) {
            return Ok(false);
        }
        map.insert(key.to_string(), value.to_vec());
        Ok(true)
    }

    fn delete(&self, key: &str) -> Result<(), KvError> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }

    fn list_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KvError> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn delete_prefix(&self, prefix: &str) -> Result<(), KvError> {
        let mut map = self.entries.lock().unwrap();
        let keys: Vec<String> = map
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect();
        for k in keys {
            map.remove(&k);
        }
        Ok(())
    }
}

/// File-backed KV endpoint: each key maps to one file under `root`, the
/// `/` separators in the key becoming directory components.
///
/// Grounded in the same "one file per logical record" layout as the
/// schema-version persistence this crate's sibling previously used, but
/// generalized to an arbitrary key namespace rather than a fixed
/// `{name}/v{n}.json` shape.
pub struct FileKv {
    root: PathBuf,
}

impl FileKv {
    pub fn new(root: PathBuf) -> Result<Self, KvError> {
        fs::create_dir_all(&root).map_err(|e| {
            KvError::Transport(format!("failed to create kv root {}: {}", root.display(), e))
        })?;
        Ok(FileKv { root })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let mut path = self.root.clone();
        for segment in key.split('/') {
            path.push(segment);
        }
        path
    }
}

impl KvBackend for FileKv {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KvError> {
        let path = self.path_for(key);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(KvError::Transport(format!(
                "failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), KvError> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                KvError::Transport(format!(
                    "failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
        fs::write(&path, value).map_err(|e| {
            KvError::Transport(format!("failed to write {}: {}", path.display(), e))
        })
    }

    fn put_if_absent(&self, key: &str, value: &[u8]) -> Result<bool, KvError> {
        if self.get(key)?.is_some() {
            return Ok(false);
        }
        self.put(key, value)?;
        Ok(true)
    }

    fn delete(&self, key: &str) -> Result<(), KvError> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(KvError::Transport(format!(
                "failed to delete {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn list_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KvError> {
        let dir = self.path_for(prefix);
        let mut out = Vec::new();
        walk(&dir, prefix, &mut out)?;
        Ok(out)
    }

    fn delete_prefix(&self, prefix: &str) -> Result<(), KvError> {
        let dir = self.path_for(prefix);
        match fs::remove_dir_all(&dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(KvError::Transport(format!(
                "failed to delete prefix {}: {}",
                dir.display(),
                e
            ))),
        }
    }
}

fn walk(dir: &PathBuf, key_prefix: &str, out: &mut Vec<(String, Vec<u8>)>) -> Result<(), KvError> {
    let entries = match fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => {
            return Err(KvError::Transport(format!(
                "failed to read directory {}: {}",
                dir.display(),
                e
            )))
        }
    };
    for entry in entries {
        let entry = entry
            .map_err(|e| KvError::Transport(format!("directory entry error: {}", e)))?;
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        let key = format!("{}/{}", key_prefix.trim_end_matches('/'), name);
        if path.is_dir() {
            walk(&path, &key, out)?;
        } else {
            let bytes = fs::read(&path).map_err(|e| {
                KvError::Transport(format!("failed to read {}: {}", path.display(), e))
            })?;
            out.push((key, bytes));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_put_if_absent_then_get() {
        let kv = MemoryKv::new();
        assert!(kv.put_if_absent("objects/x", b"v1").unwrap());
        assert!(!kv.put_if_absent("objects/x", b"v2").unwrap());
        assert_eq!(kv.get("objects/x").unwrap(), Some(b"v1".to_vec()));
    }

    #[test]
    fn memory_list_prefix_and_delete_prefix() {
        let kv = MemoryKv::new();
        kv.put("index/names/meminfo/id1", b"id1").unwrap();
        kv.put("index/names/meminfo/id2", b"id2").unwrap();
        kv.put("index/names/other/id3", b"id3").unwrap();
        let mut got = kv.list_prefix("index/names/meminfo/").unwrap();
        got.sort();
        assert_eq!(got.len(), 2);
        kv.delete_prefix("index/names/meminfo/").unwrap();
        assert!(kv.list_prefix("index/names/meminfo/").unwrap().is_empty());
        assert_eq!(kv.list_prefix("index/names/other/").unwrap().len(), 1);
    }

    #[test]
    fn file_kv_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let kv = FileKv::new(dir.path().to_path_buf()).unwrap();
        assert!(kv.put_if_absent("objects/meminfo-abc", b"{}").unwrap());
        assert!(!kv.put_if_absent("objects/meminfo-abc", b"{}").unwrap());
        assert_eq!(
            kv.get("objects/meminfo-abc").unwrap(),
            Some(b"{}".to_vec())
        );
        kv.delete("objects/meminfo-abc").unwrap();
        assert_eq!(kv.get("objects/meminfo-abc").unwrap(), None);
    }

    #[test]
    fn file_kv_prefix_scan() {
        let dir = tempfile::tempdir().unwrap();
        let kv = FileKv::new(dir.path().to_path_buf()).unwrap();
        kv.put("index/names/meminfo/meminfo-aaa", b"meminfo-aaa")
            .unwrap();
        kv.put("index/names/meminfo/meminfo-bbb", b"meminfo-bbb")
            .unwrap();
        let got = kv.list_prefix("index/names/meminfo/").unwrap();
        assert_eq!(got.len(), 2);
    }

    #[test]
    fn missing_key_delete_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let kv = FileKv::new(dir.path().to_path_buf()).unwrap();
        assert!(kv.delete("objects/does-not-exist").is_ok());
    }
}
