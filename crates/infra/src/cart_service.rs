//! Cart operations on behalf of the owning user.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::instrument;

use bazaar_cart::{Cart, DisplayCache};
use bazaar_core::{DomainError, SkuId, UserId};

use crate::cart_store::{CartStore, CartStoreError};
use crate::error::ErrorKind;
use crate::inventory_store::{InventoryStore, InventoryStoreError};

#[derive(Debug, Error)]
pub enum CartServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("sku not found: {0}")]
    SkuNotFound(SkuId),

    #[error("sku {0} is not available for purchase")]
    SkuInactive(SkuId),

    #[error(transparent)]
    Store(#[from] CartStoreError),

    #[error(transparent)]
    Inventory(#[from] InventoryStoreError),
}

impl CartServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CartServiceError::Domain(e) => ErrorKind::of_domain(e),
            CartServiceError::SkuNotFound(_) => ErrorKind::NotFound,
            CartServiceError::SkuInactive(_) => ErrorKind::Conflict,
            CartServiceError::Store(_) | CartServiceError::Inventory(_) => ErrorKind::Internal,
        }
    }
}

pub struct CartService {
    carts: Arc<dyn CartStore>,
    inventory: Arc<dyn InventoryStore>,
}

impl CartService {
    pub fn new(carts: Arc<dyn CartStore>, inventory: Arc<dyn InventoryStore>) -> Self {
        Self { carts, inventory }
    }

    /// A user without a stored cart has an empty one.
    pub fn get_cart(&self, user_id: UserId) -> Result<Cart, CartServiceError> {
        Ok(self.carts.get_cart(user_id)?.unwrap_or_else(|| Cart::empty(user_id)))
    }

    #[instrument(skip(self), fields(user_id = %user_id, sku_id = %sku_id), err)]
    pub fn add_item(&self, user_id: UserId, sku_id: SkuId, quantity: u32) -> Result<Cart, CartServiceError> {
        let skus = self.inventory.get_skus(&[sku_id])?;
        let sku = skus.get(&sku_id).ok_or(CartServiceError::SkuNotFound(sku_id))?;
        if !sku.is_active() {
            return Err(CartServiceError::SkuInactive(sku_id));
        }

        let display = DisplayCache {
            name: sku.name.clone(),
            price: sku.price,
        };
        let mut cart = self.get_cart(user_id)?;
        cart.add_item(sku_id, quantity, Some(display), Utc::now())?;
        self.carts.save_cart(&cart)?;
        Ok(cart)
    }

    /// Change quantity and/or selection of an item already in the cart.
    #[instrument(skip(self), fields(user_id = %user_id, sku_id = %sku_id), err)]
    pub fn update_item(
        &self,
        user_id: UserId,
        sku_id: SkuId,
        quantity: Option<u32>,
        selected: Option<bool>,
    ) -> Result<Cart, CartServiceError> {
        let mut cart = self.get_cart(user_id)?;
        let now = Utc::now();
        if cart.get(&sku_id).is_none() {
            return Err(DomainError::not_found(format!("sku {sku_id} is not in the cart")).into());
        }
        if let Some(quantity) = quantity {
            cart.update_quantity(sku_id, quantity, now)?;
        }
        if let Some(selected) = selected {
            cart.set_selected(sku_id, selected, now)?;
        }
        self.carts.save_cart(&cart)?;
        Ok(cart)
    }

    /// Removing the last item deletes the cart record.
    #[instrument(skip(self), fields(user_id = %user_id, sku_id = %sku_id), err)]
    pub fn remove_item(&self, user_id: UserId, sku_id: SkuId) -> Result<Cart, CartServiceError> {
        let mut cart = self.get_cart(user_id)?;
        cart.remove_item(sku_id, Utc::now())?;
        if cart.is_empty() {
            self.carts.delete_cart(user_id)?;
        } else {
            self.carts.save_cart(&cart)?;
        }
        Ok(cart)
    }
}
