use serde::{Deserialize, Serialize};

use bazaar_core::{DomainError, DomainResult, Money, SellerId, SkuId};

/// Stock status flag maintained alongside the available quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkuStatus {
    InStock,
    OutOfStock,
}

impl SkuStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkuStatus::InStock => "in_stock",
            SkuStatus::OutOfStock => "out_of_stock",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "in_stock" => Ok(SkuStatus::InStock),
            "out_of_stock" => Ok(SkuStatus::OutOfStock),
            other => Err(DomainError::validation(format!("unknown sku status '{other}'"))),
        }
    }
}

/// Why a SKU cannot be bought in the requested quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseRejection {
    Inactive,
    Insufficient { requested: u32, available: u32 },
}

/// Live SKU record as owned by the catalog.
///
/// Read fresh for every checkout; `price` here is the only price that may be
/// used for financial figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkuSnapshot {
    pub id: SkuId,
    pub seller_id: SellerId,
    pub name: String,
    pub code: String,
    pub price: Money,
    pub available_quantity: u32,
    pub is_active: bool,
    pub status: SkuStatus,
}

impl SkuSnapshot {
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn has_available(&self, requested: u32) -> bool {
        self.available_quantity >= requested
    }

    /// Checkout gate for a single line: active first, then quantity.
    pub fn check_purchase(&self, requested: u32) -> Result<(), PurchaseRejection> {
        if !self.is_active {
            return Err(PurchaseRejection::Inactive);
        }
        if !self.has_available(requested) {
            return Err(PurchaseRejection::Insufficient {
                requested,
                available: self.available_quantity,
            });
        }
        Ok(())
    }

    /// Decrement available stock, flipping to out-of-stock at zero.
    ///
    /// Returns the remaining quantity. Stock never goes negative.
    pub fn apply_deduction(&mut self, quantity: u32) -> DomainResult<u32> {
        if quantity == 0 {
            return Err(DomainError::validation("deduction quantity must be positive"));
        }
        let remaining = self.available_quantity.checked_sub(quantity).ok_or_else(|| {
            DomainError::conflict(format!(
                "insufficient stock for sku {}: requested {}, available {}",
                self.id, quantity, self.available_quantity
            ))
        })?;

        self.available_quantity = remaining;
        if remaining == 0 {
            self.status = SkuStatus::OutOfStock;
        }
        Ok(remaining)
    }

    /// Put `quantity` back, e.g. when a deduction is rolled back.
    /// A SKU with stock again is in stock.
    pub fn apply_restock(&mut self, quantity: u32) -> DomainResult<u32> {
        if quantity == 0 {
            return Err(DomainError::validation("restock quantity must be positive"));
        }
        let total = self
            .available_quantity
            .checked_add(quantity)
            .ok_or_else(|| DomainError::validation(format!("restock overflows quantity for sku {}", self.id)))?;

        self.available_quantity = total;
        self.status = SkuStatus::InStock;
        Ok(total)
    }
}
