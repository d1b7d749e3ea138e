//! Cart persistence: one JSON record per user, absent = empty cart.

use std::sync::Arc;

use thiserror::Error;

use bazaar_cart::Cart;
use bazaar_core::UserId;

pub mod in_memory;
#[cfg(feature = "redis")]
pub mod redis;

pub use in_memory::InMemoryCartStore;
#[cfg(feature = "redis")]
pub use self::redis::RedisCartStore;

#[derive(Debug, Error)]
pub enum CartStoreError {
    #[error("cart backend error: {0}")]
    Backend(String),

    #[error("corrupt cart record for user {user_id}: {reason}")]
    Corrupt { user_id: UserId, reason: String },
}

pub trait CartStore: Send + Sync {
    fn get_cart(&self, user_id: UserId) -> Result<Option<Cart>, CartStoreError>;

    /// Write the whole cart, refreshing its idle expiry.
    fn save_cart(&self, cart: &Cart) -> Result<(), CartStoreError>;

    /// Deleting an absent cart is not an error.
    fn delete_cart(&self, user_id: UserId) -> Result<(), CartStoreError>;
}

impl<S> CartStore for Arc<S>
where
    S: CartStore + ?Sized,
{
    fn get_cart(&self, user_id: UserId) -> Result<Option<Cart>, CartStoreError> {
        (**self).get_cart(user_id)
    }

    fn save_cart(&self, cart: &Cart) -> Result<(), CartStoreError> {
        (**self).save_cart(cart)
    }

    fn delete_cart(&self, user_id: UserId) -> Result<(), CartStoreError> {
        (**self).delete_cart(user_id)
    }
}
