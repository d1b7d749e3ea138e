use std::collections::HashMap;
use std::sync::RwLock;

use bazaar_core::SkuId;
use bazaar_inventory::SkuSnapshot;

use super::{InventoryStore, InventoryStoreError};

/// In-memory SKU table. Intended for tests/dev; seeded with `insert`.
#[derive(Debug, Default)]
pub struct InMemoryInventoryStore {
    skus: RwLock<HashMap<SkuId, SkuSnapshot>>,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a SKU record.
    pub fn insert(&self, sku: SkuSnapshot) -> Result<(), InventoryStoreError> {
        self.skus
            .write()
            .map_err(|_| InventoryStoreError::Backend("lock poisoned".to_string()))?
            .insert(sku.id, sku);
        Ok(())
    }

    pub fn get(&self, sku_id: SkuId) -> Option<SkuSnapshot> {
        self.skus.read().ok()?.get(&sku_id).cloned()
    }
}

impl InventoryStore for InMemoryInventoryStore {
    fn get_skus(&self, ids: &[SkuId]) -> Result<HashMap<SkuId, SkuSnapshot>, InventoryStoreError> {
        let skus = self
            .skus
            .read()
            .map_err(|_| InventoryStoreError::Backend("lock poisoned".to_string()))?;
        Ok(ids
            .iter()
            .filter_map(|id| skus.get(id).map(|s| (*id, s.clone())))
            .collect())
    }

    fn decrement(&self, sku_id: SkuId, quantity: u32) -> Result<SkuSnapshot, InventoryStoreError> {
        let mut skus = self
            .skus
            .write()
            .map_err(|_| InventoryStoreError::Backend("lock poisoned".to_string()))?;
        let sku = skus.get_mut(&sku_id).ok_or(InventoryStoreError::NotFound(sku_id))?;

        let available = sku.available_quantity;
        sku.apply_deduction(quantity)
            .map_err(|_| InventoryStoreError::Insufficient {
                sku_id,
                requested: quantity,
                available,
            })?;
        Ok(sku.clone())
    }

    fn increment(&self, sku_id: SkuId, quantity: u32) -> Result<SkuSnapshot, InventoryStoreError> {
        let mut skus = self
            .skus
            .write()
            .map_err(|_| InventoryStoreError::Backend("lock poisoned".to_string()))?;
        let sku = skus.get_mut(&sku_id).ok_or(InventoryStoreError::NotFound(sku_id))?;

        sku.apply_restock(quantity)
            .map_err(|e| InventoryStoreError::Backend(e.to_string()))?;
        Ok(sku.clone())
    }
}
