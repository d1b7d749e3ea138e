//! Coordination store: short-lived keys with TTLs shared by every API
//! instance (per-SKU leases and stock reservations).
//!
//! The in-memory store is for tests/dev; the Redis store (feature `redis`)
//! is what makes leases effective across processes.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

pub mod in_memory;
#[cfg(feature = "redis")]
pub mod redis;

pub use in_memory::InMemoryCoordinationStore;
#[cfg(feature = "redis")]
pub use self::redis::RedisCoordinationStore;

#[derive(Debug, Error)]
pub enum CoordinationError {
    #[error("coordination backend error: {0}")]
    Backend(String),

    #[error("coordination store lock poisoned")]
    Poisoned,
}

/// Key/value store with per-key expiry and atomic primitives.
///
/// All operations are blocking. Expired keys behave as absent.
pub trait CoordinationStore: Send + Sync {
    /// Atomically set `key` only if it is absent. Returns whether it was set.
    fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, CoordinationError>;

    /// Unconditionally set `key`, replacing any value and TTL.
    fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CoordinationError>;

    fn get(&self, key: &str) -> Result<Option<String>, CoordinationError>;

    /// Returns whether a key was removed.
    fn delete(&self, key: &str) -> Result<bool, CoordinationError>;

    /// Atomically delete `key` only while it still holds `expected`.
    fn delete_if_equals(&self, key: &str, expected: &str) -> Result<bool, CoordinationError>;

    /// Live keys starting with `prefix`, in no particular order.
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, CoordinationError>;
}

impl<S> CoordinationStore for Arc<S>
where
    S: CoordinationStore + ?Sized,
{
    fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, CoordinationError> {
        (**self).set_if_absent(key, value, ttl)
    }

    fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CoordinationError> {
        (**self).put(key, value, ttl)
    }

    fn get(&self, key: &str) -> Result<Option<String>, CoordinationError> {
        (**self).get(key)
    }

    fn delete(&self, key: &str) -> Result<bool, CoordinationError> {
        (**self).delete(key)
    }

    fn delete_if_equals(&self, key: &str, expected: &str) -> Result<bool, CoordinationError> {
        (**self).delete_if_equals(key, expected)
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, CoordinationError> {
        (**self).keys_with_prefix(prefix)
    }
}
