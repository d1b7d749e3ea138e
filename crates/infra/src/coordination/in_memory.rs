use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::{CoordinationError, CoordinationStore};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// In-memory coordination store.
///
/// Intended for tests/dev and single-process deployments. Expired entries
/// are dropped lazily on access.
#[derive(Debug, Default)]
pub struct InMemoryCoordinationStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl InMemoryCoordinationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_entries<T>(
        &self,
        f: impl FnOnce(&mut HashMap<String, Entry>, Instant) -> T,
    ) -> Result<T, CoordinationError> {
        let mut entries = self.entries.lock().map_err(|_| CoordinationError::Poisoned)?;
        let now = Instant::now();
        entries.retain(|_, e| e.is_live(now));
        Ok(f(&mut entries, now))
    }
}

impl CoordinationStore for InMemoryCoordinationStore {
    fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, CoordinationError> {
        self.with_entries(|entries, now| {
            if entries.contains_key(key) {
                return false;
            }
            entries.insert(
                key.to_string(),
                Entry {
                    value: value.to_string(),
                    expires_at: now + ttl,
                },
            );
            true
        })
    }

    fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CoordinationError> {
        self.with_entries(|entries, now| {
            entries.insert(
                key.to_string(),
                Entry {
                    value: value.to_string(),
                    expires_at: now + ttl,
                },
            );
        })
    }

    fn get(&self, key: &str) -> Result<Option<String>, CoordinationError> {
        self.with_entries(|entries, _| entries.get(key).map(|e| e.value.clone()))
    }

    fn delete(&self, key: &str) -> Result<bool, CoordinationError> {
        self.with_entries(|entries, _| entries.remove(key).is_some())
    }

    fn delete_if_equals(&self, key: &str, expected: &str) -> Result<bool, CoordinationError> {
        self.with_entries(|entries, _| match entries.get(key) {
            Some(e) if e.value == expected => {
                entries.remove(key);
                true
            }
            _ => false,
        })
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, CoordinationError> {
        self.with_entries(|entries, _| {
            entries
                .keys()
                .filter(|k| k.starts_with(prefix))
                .cloned()
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(30);

    #[test]
    fn set_if_absent_only_sets_once() {
        let store = InMemoryCoordinationStore::new();
        assert!(store.set_if_absent("k", "a", TTL).unwrap());
        assert!(!store.set_if_absent("k", "b", TTL).unwrap());
        assert_eq!(store.get("k").unwrap().as_deref(), Some("a"));
    }

    #[test]
    fn expired_keys_are_absent() {
        let store = InMemoryCoordinationStore::new();
        store.put("k", "a", Duration::from_millis(5)).unwrap();
        std::thread::sleep(Duration::from_millis(20));

        assert_eq!(store.get("k").unwrap(), None);
        assert!(store.set_if_absent("k", "b", TTL).unwrap());
    }

    #[test]
    fn delete_if_equals_respects_the_current_value() {
        let store = InMemoryCoordinationStore::new();
        store.put("k", "mine", TTL).unwrap();

        assert!(!store.delete_if_equals("k", "theirs").unwrap());
        assert!(store.delete_if_equals("k", "mine").unwrap());
        assert!(!store.delete("k").unwrap());
    }

    #[test]
    fn keys_with_prefix_filters() {
        let store = InMemoryCoordinationStore::new();
        store.put("a:1", "x", TTL).unwrap();
        store.put("a:2", "x", TTL).unwrap();
        store.put("b:1", "x", TTL).unwrap();

        let mut keys = store.keys_with_prefix("a:").unwrap();
        keys.sort();
        assert_eq!(keys, vec!["a:1".to_string(), "a:2".to_string()]);
    }
}
