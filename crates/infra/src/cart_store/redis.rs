//! Redis-backed cart store (optional): `SET bazaar:cart:{userId} <json> EX <ttl>`.

use std::time::Duration;

use redis::Commands;

use bazaar_cart::Cart;
use bazaar_core::UserId;

use super::{CartStore, CartStoreError};

#[derive(Debug, Clone)]
pub struct RedisCartStore {
    client: redis::Client,
    ttl: Duration,
}

impl RedisCartStore {
    pub fn new(redis_url: impl AsRef<str>, ttl: Duration) -> Result<Self, CartStoreError> {
        let client = redis::Client::open(redis_url.as_ref()).map_err(backend)?;
        Ok(Self { client, ttl })
    }

    fn conn(&self) -> Result<redis::Connection, CartStoreError> {
        self.client.get_connection().map_err(backend)
    }
}

fn backend(e: redis::RedisError) -> CartStoreError {
    CartStoreError::Backend(e.to_string())
}

fn cart_key(user_id: UserId) -> String {
    format!("bazaar:cart:{user_id}")
}

impl CartStore for RedisCartStore {
    fn get_cart(&self, user_id: UserId) -> Result<Option<Cart>, CartStoreError> {
        let mut conn = self.conn()?;
        let body: Option<String> = conn.get(cart_key(user_id)).map_err(backend)?;
        body.map(|b| {
            serde_json::from_str(&b).map_err(|e| CartStoreError::Corrupt {
                user_id,
                reason: e.to_string(),
            })
        })
        .transpose()
    }

    fn save_cart(&self, cart: &Cart) -> Result<(), CartStoreError> {
        let body = serde_json::to_string(cart).map_err(|e| CartStoreError::Corrupt {
            user_id: cart.user_id(),
            reason: e.to_string(),
        })?;
        let mut conn = self.conn()?;
        conn.set_ex::<_, _, ()>(cart_key(cart.user_id()), body, self.ttl.as_secs().max(1))
            .map_err(backend)
    }

    fn delete_cart(&self, user_id: UserId) -> Result<(), CartStoreError> {
        let mut conn = self.conn()?;
        conn.del::<_, ()>(cart_key(user_id)).map_err(backend)
    }
}
