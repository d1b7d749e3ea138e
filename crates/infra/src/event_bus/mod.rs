//! Infrastructure event bus implementations.
//!
//! The bus abstraction lives in `bazaar-events` as pure mechanics. This
//! module provides the Redis-backed transport.

#[cfg(feature = "redis")]
pub mod redis_pubsub;

#[cfg(feature = "redis")]
pub use redis_pubsub::{RedisBusError, RedisPubSubEventBus};
