//! Redis-backed coordination store (optional).
//!
//! `SET NX PX` for set-if-absent, a Lua script for compare-and-delete and
//! `SCAN MATCH` for prefix listing. A connection is taken per call.

use std::time::Duration;

use redis::Commands;

use super::{CoordinationError, CoordinationStore};

const COMPARE_AND_DELETE: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
else
    return 0
end
"#;

#[derive(Debug, Clone)]
pub struct RedisCoordinationStore {
    client: redis::Client,
}

impl RedisCoordinationStore {
    pub fn new(redis_url: impl AsRef<str>) -> Result<Self, CoordinationError> {
        let client = redis::Client::open(redis_url.as_ref()).map_err(backend)?;
        Ok(Self { client })
    }

    pub fn from_client(client: redis::Client) -> Self {
        Self { client }
    }

    fn conn(&self) -> Result<redis::Connection, CoordinationError> {
        self.client.get_connection().map_err(backend)
    }
}

fn backend(e: redis::RedisError) -> CoordinationError {
    CoordinationError::Backend(e.to_string())
}

fn ttl_millis(ttl: Duration) -> u64 {
    (ttl.as_millis() as u64).max(1)
}

/// Escape glob metacharacters so the prefix is matched literally.
fn scan_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('*');
    pattern
}

impl CoordinationStore for RedisCoordinationStore {
    fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, CoordinationError> {
        let mut conn = self.conn()?;
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("PX")
            .arg(ttl_millis(ttl))
            .query(&mut conn)
            .map_err(backend)?;
        Ok(reply.is_some())
    }

    fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CoordinationError> {
        let mut conn = self.conn()?;
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("PX")
            .arg(ttl_millis(ttl))
            .query::<()>(&mut conn)
            .map_err(backend)
    }

    fn get(&self, key: &str) -> Result<Option<String>, CoordinationError> {
        let mut conn = self.conn()?;
        conn.get(key).map_err(backend)
    }

    fn delete(&self, key: &str) -> Result<bool, CoordinationError> {
        let mut conn = self.conn()?;
        let removed: i64 = conn.del(key).map_err(backend)?;
        Ok(removed > 0)
    }

    fn delete_if_equals(&self, key: &str, expected: &str) -> Result<bool, CoordinationError> {
        let mut conn = self.conn()?;
        let removed: i64 = redis::Script::new(COMPARE_AND_DELETE)
            .key(key)
            .arg(expected)
            .invoke(&mut conn)
            .map_err(backend)?;
        Ok(removed > 0)
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, CoordinationError> {
        let mut conn = self.conn()?;
        let keys: Vec<String> = conn
            .scan_match::<_, String>(scan_pattern(prefix))
            .map_err(backend)?
            .collect();
        Ok(keys)
    }
}
