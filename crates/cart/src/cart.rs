use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{DomainError, DomainResult, Entity, Money, SkuId, UserId};

/// Display-only copy of catalog data, refreshed whenever the item is touched.
///
/// Never used for financial computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayCache {
    pub name: String,
    pub price: Money,
}

/// One purchase intent in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub sku_id: SkuId,
    pub quantity: u32,
    /// `true` = buy now, `false` = saved for later.
    pub selected: bool,
    pub display: Option<DisplayCache>,
    pub added_at: DateTime<Utc>,
}

/// Entity: a user's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    user_id: UserId,
    items: BTreeMap<SkuId, CartItem>,
    updated_at: DateTime<Utc>,
}

impl Entity for Cart {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.user_id
    }
}

impl Cart {
    /// An empty cart (what a missing cart record reads as).
    pub fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            items: BTreeMap::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn get(&self, sku_id: &SkuId) -> Option<&CartItem> {
        self.items.get(sku_id)
    }

    pub fn items(&self) -> impl Iterator<Item = &CartItem> {
        self.items.values()
    }

    /// Items marked "buy now", ordered by SKU id.
    pub fn selected_items(&self) -> Vec<&CartItem> {
        self.items.values().filter(|i| i.selected).collect()
    }

    /// Add `quantity` of a SKU. Adding an existing SKU increases its quantity
    /// and keeps its selection flag; new items start selected.
    pub fn add_item(
        &mut self,
        sku_id: SkuId,
        quantity: u32,
        display: Option<DisplayCache>,
        now: DateTime<Utc>,
    ) -> DomainResult<&CartItem> {
        ensure_positive(quantity)?;

        let item = match self.items.entry(sku_id) {
            std::collections::btree_map::Entry::Occupied(entry) => {
                let item = entry.into_mut();
                item.quantity = item.quantity.checked_add(quantity).ok_or_else(|| {
                    DomainError::validation(format!("quantity overflow for sku {sku_id}"))
                })?;
                if display.is_some() {
                    item.display = display;
                }
                item
            }
            std::collections::btree_map::Entry::Vacant(entry) => entry.insert(CartItem {
                sku_id,
                quantity,
                selected: true,
                display,
                added_at: now,
            }),
        };

        self.updated_at = now;
        Ok(item)
    }

    pub fn update_quantity(&mut self, sku_id: SkuId, quantity: u32, now: DateTime<Utc>) -> DomainResult<()> {
        ensure_positive(quantity)?;
        self.item_mut(sku_id)?.quantity = quantity;
        self.updated_at = now;
        Ok(())
    }

    pub fn set_selected(&mut self, sku_id: SkuId, selected: bool, now: DateTime<Utc>) -> DomainResult<()> {
        self.item_mut(sku_id)?.selected = selected;
        self.updated_at = now;
        Ok(())
    }

    pub fn remove_item(&mut self, sku_id: SkuId, now: DateTime<Utc>) -> DomainResult<CartItem> {
        let removed = self
            .items
            .remove(&sku_id)
            .ok_or_else(|| DomainError::not_found(format!("sku {sku_id} is not in the cart")))?;
        self.updated_at = now;
        Ok(removed)
    }

    /// Drop every listed SKU that is present; unknown ids are ignored.
    /// Returns how many items were removed.
    pub fn remove_items(&mut self, sku_ids: &[SkuId], now: DateTime<Utc>) -> usize {
        let before = self.items.len();
        for id in sku_ids {
            self.items.remove(id);
        }
        let removed = before - self.items.len();
        if removed > 0 {
            self.updated_at = now;
        }
        removed
    }

    fn item_mut(&mut self, sku_id: SkuId) -> DomainResult<&mut CartItem> {
        self.items
            .get_mut(&sku_id)
            .ok_or_else(|| DomainError::not_found(format!("sku {sku_id} is not in the cart")))
    }
}

fn ensure_positive(quantity: u32) -> DomainResult<()> {
    if quantity == 0 {
        return Err(DomainError::validation("quantity must be positive"));
    }
    Ok(())
}
