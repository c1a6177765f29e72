// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::sync::{Arc, Mutex};

use crate::error::KvError;
use crate::kv::KvBackend;

/// Failover wrapper over a list of KV endpoints.
///
/// Every call acquires the endpoint-selection mutex, then attempts the
/// operation against the current endpoint. On [`KvError::Transport`] it
/// advances to the next endpoint (wrapping around) and retries; on
/// [`KvError::Invalid`] it returns immediately without retrying. If every
/// endpoint fails in one call, the call fails with
/// [`crate::error::RegistryError::AllBackendsDown`].
///
/// The mutex only ever serializes the "current endpoint" bookkeeping: it
/// is held for the duration of one call's failover loop, not across
/// calls. Each endpoint backend is expected to handle its own internal
/// concurrency (the bundled backends are `Send + Sync`).
pub struct KvProxy {
    endpoints: Vec<Arc<dyn KvBackend>>,
    current: Mutex<usize>,
}

impl KvProxy {
    pub fn new(endpoints: Vec<Arc<dyn KvBackend>>) -> Self {
        assert!(!endpoints.is_empty(), "KvProxy requires at least one endpoint");
        KvProxy {
            endpoints,
            current: Mutex::new(0),
        }
    }

    /// Index of the endpoint currently believed healthy. Exposed for
    /// tests that assert on failover behavior.
    pub fn current_index(&self) -> usize {
        *self.current.lock().unwrap()
    }

    fn with_failover<T>(
        &self,
        mut op: impl FnMut(&dyn KvBackend) -> Result<T, KvError>,
    ) -> Result<T, KvError> {
        let mut guard = self.current.lock().unwrap();
        let n = self.endpoints.len();
        let start = *guard;
        for attempt in 0..n {
            let idx = (start + attempt) % n;
            match op(self.endpoints[idx].as_ref()) {
                Ok(value) => {
                    *guard = idx;
                    return Ok(value);
                }
                Err(KvError::Transport(_)) => continue,
                Err(invalid @ KvError::Invalid(_)) => return Err(invalid),
                Err(KvError::AllBackendsDown) => continue,
            }
        }
        Err(KvError::AllBackendsDown)
    }
}

impl KvBackend for KvProxy {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KvError> {
        self.with_failover(|b| b.get(key))
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), KvError> {
        self.with_failover(|b| b.put(key, value))
    }

    fn put_if_absent(&self, key: &str, value: &[u8]) -> Result<bool, KvError> {
        self.with_failover(|b| b.put_if_absent(key, value))
    }

    fn delete(&self, key: &str) -> Result<(), KvError> {
        self.with_failover(|b| b.delete(key))
    }

    fn list_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KvError> {
        self.with_failover(|b| b.list_prefix(prefix))
    }

    fn delete_prefix(&self, prefix: &str) -> Result<(), KvError> {
        self.with_failover(|b| b.delete_prefix(prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKv;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// A backend that always fails with a transport error, for exercising
    /// failover without a real network endpoint.
    struct DeadKv;

    impl KvBackend for DeadKv {
        fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, KvError> {
            Err(KvError::Transport("dead endpoint".into()))
        }
        fn put(&self, _key: &str, _value: &[u8]) -> Result<(), KvError> {
            Err(KvError::Transport("dead endpoint".into()))
        }
        fn put_if_absent(&self, _key: &str, _value: &[u8]) -> Result<bool, KvError> {
            Err(KvError::Transport("dead endpoint".into()))
        }
        fn delete(&self, _key: &str) -> Result<(), KvError> {
            Err(KvError::Transport("dead endpoint".into()))
        }
        fn list_prefix(&self, _prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KvError> {
            Err(KvError::Transport("dead endpoint".into()))
        }
        fn delete_prefix(&self, _prefix: &str) -> Result<(), KvError> {
            Err(KvError::Transport("dead endpoint".into()))
        }
    }

    /// Rejects every call with a non-transport error, to check that the
    /// proxy does not retry invalid-argument style failures.
    struct RejectingKv {
        called: AtomicBool,
    }

    impl KvBackend for RejectingKv {
        fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, KvError> {
            self.called.store(true, Ordering::SeqCst);
            Err(KvError::Invalid("bad key".into()))
        }
        fn put(&self, _key: &str, _value: &[u8]) -> Result<(), KvError> {
            unimplemented!()
        }
        fn put_if_absent(&self, _key: &str, _value: &[u8]) -> Result<bool, KvError> {
            unimplemented!()
        }
        fn delete(&self, _key: &str) -> Result<(), KvError> {
            unimplemented!()
        }
        fn list_prefix(&self, _prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KvError> {
            unimplemented!()
        }
        fn delete_prefix(&self, _prefix: &str) -> Result<(), KvError> {
            unimplemented!()
        }
    }

    #[test]
    fn failover_skips_dead_endpoint_and_advances_pointer() {
        let proxy = KvProxy::new(vec![Arc::new(DeadKv), Arc::new(MemoryKv::new())]);
        assert!(proxy.put("objects/x", b"v").is_ok());
        assert_eq!(proxy.current_index(), 1);
        assert_eq!(proxy.get("objects/x").unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn all_backends_down_fails() {
        let proxy = KvProxy::new(vec![Arc::new(DeadKv), Arc::new(DeadKv)]);
        assert!(matches!(proxy.get("objects/x"), Err(KvError::AllBackendsDown)));
    }

    #[test]
    fn invalid_argument_does_not_retry_other_endpoints() {
        let rejecting = Arc::new(RejectingKv {
            called: AtomicBool::new(false),
        });
        let proxy = KvProxy::new(vec![rejecting.clone(), Arc::new(MemoryKv::new())]);
        let err = proxy.get("objects/x").unwrap_err();
        assert!(matches!(err, KvError::Invalid(_)));
        assert!(rejecting.called.load(Ordering::SeqCst));
        // current index must remain at the rejecting endpoint: no failover
        // occurred for a non-transport error.
        assert_eq!(proxy.current_index(), 0);
    }

    #[test]
    fn subsequent_calls_start_from_the_last_healthy_endpoint() {
        let proxy = KvProxy::new(vec![Arc::new(DeadKv), Arc::new(MemoryKv::new())]);
        proxy.put("objects/x", b"v").unwrap();
        assert_eq!(proxy.current_index(), 1);
        // a second call should try endpoint 1 first and succeed without
        // needing to walk past the dead one again.
        assert!(proxy.get("objects/x").is_ok());
        assert_eq!(proxy.current_index(), 1);
    }
}
