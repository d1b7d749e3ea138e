use std::collections::HashMap;
use std::sync::RwLock;

use bazaar_cart::Cart;
use bazaar_core::UserId;

use super::{CartStore, CartStoreError};

/// In-memory cart store. Intended for tests/dev; carts never expire.
#[derive(Debug, Default)]
pub struct InMemoryCartStore {
    carts: RwLock<HashMap<UserId, Cart>>,
}

impl InMemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> CartStoreError {
    CartStoreError::Backend("lock poisoned".to_string())
}

impl CartStore for InMemoryCartStore {
    fn get_cart(&self, user_id: UserId) -> Result<Option<Cart>, CartStoreError> {
        Ok(self.carts.read().map_err(|_| poisoned())?.get(&user_id).cloned())
    }

    fn save_cart(&self, cart: &Cart) -> Result<(), CartStoreError> {
        self.carts
            .write()
            .map_err(|_| poisoned())?
            .insert(cart.user_id(), cart.clone());
        Ok(())
    }

    fn delete_cart(&self, user_id: UserId) -> Result<(), CartStoreError> {
        self.carts.write().map_err(|_| poisoned())?.remove(&user_id);
        Ok(())
    }
}
