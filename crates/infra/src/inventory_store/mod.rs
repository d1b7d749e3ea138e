//! Inventory source of truth: batch SKU lookup, conditional decrement and
//! compensating increment.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use bazaar_core::SkuId;
use bazaar_inventory::SkuSnapshot;

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryInventoryStore;
pub use postgres::PostgresInventoryStore;

#[derive(Debug, Error)]
pub enum InventoryStoreError {
    #[error("sku not found: {0}")]
    NotFound(SkuId),

    #[error("insufficient stock for sku {sku_id}: requested {requested}, available {available}")]
    Insufficient {
        sku_id: SkuId,
        requested: u32,
        available: u32,
    },

    #[error("inventory backend error: {0}")]
    Backend(String),
}

pub trait InventoryStore: Send + Sync {
    /// Live snapshots for `ids`. Unknown ids are simply absent from the map.
    fn get_skus(&self, ids: &[SkuId]) -> Result<HashMap<SkuId, SkuSnapshot>, InventoryStoreError>;

    /// Atomically subtract `quantity` if at least that much is available,
    /// flipping the status to out-of-stock at zero. Returns the updated SKU.
    fn decrement(&self, sku_id: SkuId, quantity: u32) -> Result<SkuSnapshot, InventoryStoreError>;

    /// Add `quantity` back and mark the SKU in stock. Used to undo a
    /// decrement that the rest of its operation could not follow through on.
    fn increment(&self, sku_id: SkuId, quantity: u32) -> Result<SkuSnapshot, InventoryStoreError>;
}

impl<S> InventoryStore for Arc<S>
where
    S: InventoryStore + ?Sized,
{
    fn get_skus(&self, ids: &[SkuId]) -> Result<HashMap<SkuId, SkuSnapshot>, InventoryStoreError> {
        (**self).get_skus(ids)
    }

    fn decrement(&self, sku_id: SkuId, quantity: u32) -> Result<SkuSnapshot, InventoryStoreError> {
        (**self).decrement(sku_id, quantity)
    }

    fn increment(&self, sku_id: SkuId, quantity: u32) -> Result<SkuSnapshot, InventoryStoreError> {
        (**self).increment(sku_id, quantity)
    }
}
