//! Stock reservation manager.
//!
//! Reservations are advisory records with a TTL; they never change the
//! quantity `check_stock` reports. Inventory is only mutated by
//! `deduct_stock` and its compensation `restore_stock`, both of which hold
//! the per-SKU lease around the write. Concurrent deductions of one SKU are therefore serialized while
//! different SKUs proceed in parallel.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use bazaar_core::{DomainError, OrderId, SkuId};
use bazaar_inventory::{SkuSnapshot, StockCheck, StockLine, StockShortage, merge_lines};

use super::lease::{LeaseError, LeaseManager};
use super::reservation::{StockReservation, reservation_key, reservation_prefix};
use crate::coordination::{CoordinationError, CoordinationStore};
use crate::inventory_store::{InventoryStore, InventoryStoreError};

#[derive(Debug, Error)]
pub enum StockError {
    #[error("invalid stock request: {0}")]
    Validation(String),

    #[error("insufficient stock for {} sku(s)", .0.len())]
    Unavailable(Vec<StockShortage>),

    #[error("insufficient stock for sku {sku_id}: requested {requested}, available {available}")]
    InsufficientStock {
        sku_id: SkuId,
        requested: u32,
        available: u32,
    },

    #[error("sku {sku_id} is busy: lease not acquired after {attempts} attempts")]
    LockUnavailable { sku_id: SkuId, attempts: u32 },

    #[error("sku not found: {0}")]
    SkuNotFound(SkuId),

    #[error("coordination store error: {0}")]
    Coordination(#[from] CoordinationError),

    #[error("inventory error: {0}")]
    Inventory(String),

    #[error("corrupt reservation record at {key}: {reason}")]
    CorruptReservation { key: String, reason: String },
}

impl StockError {
    /// Transient failures worth retrying as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StockError::LockUnavailable { .. } | StockError::Coordination(_))
    }

    /// The request can never succeed against current stock.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StockError::Unavailable(_) | StockError::InsufficientStock { .. })
    }

    pub fn code(&self) -> &'static str {
        match self {
            StockError::Validation(_) => "validation_error",
            StockError::Unavailable(_) | StockError::InsufficientStock { .. } => "insufficient_stock",
            StockError::LockUnavailable { .. } => "lock_unavailable",
            StockError::SkuNotFound(_) => "sku_not_found",
            StockError::Coordination(_) => "coordination_error",
            StockError::Inventory(_) => "inventory_error",
            StockError::CorruptReservation { .. } => "corrupt_reservation",
        }
    }
}

impl From<DomainError> for StockError {
    fn from(e: DomainError) -> Self {
        StockError::Validation(e.to_string())
    }
}

impl From<LeaseError> for StockError {
    fn from(e: LeaseError) -> Self {
        match e {
            LeaseError::Unavailable { sku_id, attempts } => StockError::LockUnavailable { sku_id, attempts },
            LeaseError::Coordination(e) => StockError::Coordination(e),
        }
    }
}

impl From<InventoryStoreError> for StockError {
    fn from(e: InventoryStoreError) -> Self {
        match e {
            InventoryStoreError::NotFound(sku_id) => StockError::SkuNotFound(sku_id),
            InventoryStoreError::Insufficient {
                sku_id,
                requested,
                available,
            } => StockError::InsufficientStock {
                sku_id,
                requested,
                available,
            },
            InventoryStoreError::Backend(msg) => StockError::Inventory(msg),
        }
    }
}

pub struct StockReservationManager {
    inventory: Arc<dyn InventoryStore>,
    coordination: Arc<dyn CoordinationStore>,
    leases: LeaseManager,
    reservation_ttl: Duration,
}

impl StockReservationManager {
    pub fn new(
        inventory: Arc<dyn InventoryStore>,
        coordination: Arc<dyn CoordinationStore>,
        leases: LeaseManager,
        reservation_ttl: Duration,
    ) -> Self {
        Self {
            inventory,
            coordination,
            leases,
            reservation_ttl,
        }
    }

    /// Point-in-time availability of `items`. No mutation.
    #[instrument(skip(self, items), fields(lines = items.len()), err)]
    pub fn check_stock(&self, items: &[StockLine]) -> Result<StockCheck, StockError> {
        let lines = merge_lines(items)?;
        let ids: Vec<SkuId> = lines.iter().map(|l| l.sku_id).collect();
        let skus = self.inventory.get_skus(&ids)?;
        Ok(StockCheck::evaluate(&lines, &skus))
    }

    /// Record intent to buy `items` for `order_id`.
    ///
    /// Fails with `Unavailable` (writing nothing) when any line is short.
    #[instrument(skip(self, items), fields(order_id = %order_id, lines = items.len()), err)]
    pub fn reserve_stock(&self, order_id: OrderId, items: &[StockLine]) -> Result<Vec<StockReservation>, StockError> {
        let check = self.check_stock(items)?;
        if !check.available {
            return Err(StockError::Unavailable(check.unavailable));
        }

        let expires_at = Utc::now()
            + chrono::Duration::from_std(self.reservation_ttl).unwrap_or_else(|_| chrono::Duration::minutes(15));

        let mut reservations = Vec::new();
        for line in merge_lines(items)? {
            let reservation = StockReservation {
                order_id,
                sku_id: line.sku_id,
                quantity: line.quantity,
                expires_at,
            };
            let body = serde_json::to_string(&reservation).map_err(|e| StockError::CorruptReservation {
                key: reservation_key(order_id, line.sku_id),
                reason: e.to_string(),
            })?;
            self.coordination
                .put(&reservation_key(order_id, line.sku_id), &body, self.reservation_ttl)?;
            reservations.push(reservation);
        }

        info!(order_id = %order_id, reservations = reservations.len(), "stock reserved");
        Ok(reservations)
    }

    /// Decrement inventory for every line under the per-SKU lease, then drop
    /// the order's reservations.
    ///
    /// Lines are processed in ascending SKU order. All or nothing: when a line
    /// fails, lines already deducted are put back before the error returns.
    #[instrument(skip(self, items), fields(order_id = %order_id, lines = items.len()), err)]
    pub fn deduct_stock(&self, order_id: OrderId, items: &[StockLine]) -> Result<Vec<SkuSnapshot>, StockError> {
        let lines = merge_lines(items)?;
        let mut updated = Vec::with_capacity(lines.len());

        for (idx, line) in lines.iter().enumerate() {
            match self.deduct_line(line) {
                Ok(sku) => updated.push(sku),
                Err(e) => {
                    if idx > 0 {
                        warn!(
                            order_id = %order_id,
                            sku_id = %line.sku_id,
                            deducted_lines = idx,
                            error = %e,
                            "stock deduction failed part-way; rolling back"
                        );
                        // Failures are logged per line by restore_stock.
                        let _ = self.restore_stock(order_id, &lines[..idx]);
                    }
                    return Err(e);
                }
            }
        }

        if let Err(e) = self.release_stock(order_id) {
            warn!(order_id = %order_id, error = %e, "failed to clear reservations after deduction");
        }

        info!(order_id = %order_id, lines = updated.len(), "stock deducted");
        Ok(updated)
    }

    /// Give back stock previously taken by `deduct_stock` for `order_id`.
    ///
    /// Every line is attempted; the first failure is returned after the rest
    /// have been tried.
    #[instrument(skip(self, items), fields(order_id = %order_id, lines = items.len()), err)]
    pub fn restore_stock(&self, order_id: OrderId, items: &[StockLine]) -> Result<Vec<SkuSnapshot>, StockError> {
        let lines = merge_lines(items)?;
        let mut restored = Vec::with_capacity(lines.len());
        let mut first_err = None;

        for line in &lines {
            match self.restore_line(line) {
                Ok(sku) => restored.push(sku),
                Err(e) => {
                    error!(
                        order_id = %order_id,
                        sku_id = %line.sku_id,
                        quantity = line.quantity,
                        error = %e,
                        "failed to restore stock"
                    );
                    first_err.get_or_insert(e);
                }
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => {
                info!(order_id = %order_id, lines = restored.len(), "stock restored");
                Ok(restored)
            }
        }
    }

    fn restore_line(&self, line: &StockLine) -> Result<SkuSnapshot, StockError> {
        let _lease = self.leases.acquire(line.sku_id)?;
        Ok(self.inventory.increment(line.sku_id, line.quantity)?)
    }

    fn deduct_line(&self, line: &StockLine) -> Result<SkuSnapshot, StockError> {
        let _lease = self.leases.acquire(line.sku_id)?;

        let current = self.inventory.get_skus(&[line.sku_id])?;
        let sku = current.get(&line.sku_id).ok_or(StockError::SkuNotFound(line.sku_id))?;
        if !sku.has_available(line.quantity) {
            return Err(StockError::InsufficientStock {
                sku_id: line.sku_id,
                requested: line.quantity,
                available: sku.available_quantity,
            });
        }

        Ok(self.inventory.decrement(line.sku_id, line.quantity)?)
    }

    /// Delete every reservation of `order_id`. Returns how many were removed.
    #[instrument(skip(self), fields(order_id = %order_id), err)]
    pub fn release_stock(&self, order_id: OrderId) -> Result<usize, StockError> {
        let keys = self.coordination.keys_with_prefix(&reservation_prefix(order_id))?;
        let mut removed = 0;
        for key in keys {
            if self.coordination.delete(&key)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Live reservations of `order_id`, ordered by SKU.
    pub fn list_reservations(&self, order_id: OrderId) -> Result<Vec<StockReservation>, StockError> {
        let keys = self.coordination.keys_with_prefix(&reservation_prefix(order_id))?;
        let mut out = Vec::with_capacity(keys.len());
        for key in keys {
            // Expired between listing and reading.
            let Some(body) = self.coordination.get(&key)? else {
                continue;
            };
            let reservation: StockReservation =
                serde_json::from_str(&body).map_err(|e| StockError::CorruptReservation {
                    key: key.clone(),
                    reason: e.to_string(),
                })?;
            out.push(reservation);
        }
        out.sort_by_key(|r| r.sku_id);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bazaar_core::{Money, SellerId};
    use bazaar_inventory::SkuStatus;

    use crate::coordination::InMemoryCoordinationStore;
    use crate::inventory_store::InMemoryInventoryStore;
    use crate::stock::RetryPolicy;

    struct Fixture {
        inventory: Arc<InMemoryInventoryStore>,
        coordination: Arc<InMemoryCoordinationStore>,
        manager: StockReservationManager,
    }

    fn fixture(lease_attempts: u32) -> Fixture {
        let inventory = Arc::new(InMemoryInventoryStore::new());
        let coordination = Arc::new(InMemoryCoordinationStore::new());
        let leases = LeaseManager::new(
            coordination.clone(),
            Duration::from_secs(10),
            RetryPolicy::fixed(lease_attempts, Duration::from_millis(1)),
        );
        let manager = StockReservationManager::new(
            inventory.clone(),
            coordination.clone(),
            leases,
            Duration::from_secs(900),
        );
        Fixture {
            inventory,
            coordination,
            manager,
        }
    }

    fn seed(inventory: &InMemoryInventoryStore, qty: u32) -> SkuId {
        let id = SkuId::new();
        inventory
            .insert(SkuSnapshot {
            id,
            seller_id: SellerId::new(),
            name: "Kettle".to_string(),
            code: "K-1".to_string(),
            price: Money::from_minor(3000),
            available_quantity: qty,
            is_active: true,
            status: SkuStatus::InStock,
            })
            .unwrap();
        id
    }

    #[test]
    fn check_reports_missing_sku_as_zero_available() {
        let f = fixture(1);
        let present = seed(&f.inventory, 5);
        let missing = SkuId::new();

        let check = f
            .manager
            .check_stock(&[StockLine::new(present, 2), StockLine::new(missing, 1)])
            .unwrap();

        assert!(!check.available);
        assert_eq!(
            check.unavailable,
            vec![StockShortage {
                sku_id: missing,
                requested: 1,
                available: 0
            }]
        );
    }

    #[test]
    fn split_duplicate_lines_cannot_bypass_the_check() {
        let f = fixture(1);
        let sku = seed(&f.inventory, 3);

        let check = f
            .manager
            .check_stock(&[StockLine::new(sku, 2), StockLine::new(sku, 2)])
            .unwrap();
        assert!(!check.available);
        assert_eq!(check.unavailable[0].requested, 4);
    }

    #[test]
    fn reserve_writes_nothing_when_short() {
        let f = fixture(1);
        let sku = seed(&f.inventory, 1);
        let order = OrderId::new();

        let err = f.manager.reserve_stock(order, &[StockLine::new(sku, 2)]).unwrap_err();
        assert!(err.is_conflict());
        assert!(f.manager.list_reservations(order).unwrap().is_empty());
    }

    #[test]
    fn reserve_does_not_reduce_available_quantity() {
        let f = fixture(1);
        let sku = seed(&f.inventory, 2);

        f.manager.reserve_stock(OrderId::new(), &[StockLine::new(sku, 2)]).unwrap();
        let check = f.manager.check_stock(&[StockLine::new(sku, 2)]).unwrap();
        assert!(check.available);
    }

    #[test]
    fn reserve_then_release_leaves_nothing() {
        let f = fixture(1);
        let a = seed(&f.inventory, 5);
        let b = seed(&f.inventory, 5);
        let order = OrderId::new();

        let reserved = f
            .manager
            .reserve_stock(order, &[StockLine::new(a, 1), StockLine::new(b, 2)])
            .unwrap();
        assert_eq!(reserved.len(), 2);
        assert_eq!(f.manager.list_reservations(order).unwrap().len(), 2);

        assert_eq!(f.manager.release_stock(order).unwrap(), 2);
        assert!(f.manager.list_reservations(order).unwrap().is_empty());
        assert_eq!(f.manager.release_stock(order).unwrap(), 0);
    }

    #[test]
    fn deduct_decrements_and_clears_reservations() {
        let f = fixture(1);
        let sku = seed(&f.inventory, 3);
        let order = OrderId::new();

        f.manager.reserve_stock(order, &[StockLine::new(sku, 3)]).unwrap();
        let updated = f.manager.deduct_stock(order, &[StockLine::new(sku, 3)]).unwrap();

        assert_eq!(updated[0].available_quantity, 0);
        assert_eq!(updated[0].status, SkuStatus::OutOfStock);
        assert!(f.manager.list_reservations(order).unwrap().is_empty());
    }

    #[test]
    fn deduct_beyond_available_is_a_conflict() {
        let f = fixture(1);
        let sku = seed(&f.inventory, 1);

        let err = f.manager.deduct_stock(OrderId::new(), &[StockLine::new(sku, 2)]).unwrap_err();
        assert!(matches!(err, StockError::InsufficientStock { available: 1, .. }));
        assert!(!err.is_retryable());
        assert_eq!(f.inventory.get(sku).unwrap().available_quantity, 1);
    }

    #[test]
    fn deduct_while_lease_is_held_elsewhere_is_retryable() {
        let f = fixture(2);
        let sku = seed(&f.inventory, 1);

        f.coordination
            .put(&crate::stock::reservation::lease_key(sku), "someone-else", Duration::from_secs(10))
            .unwrap();

        let err = f.manager.deduct_stock(OrderId::new(), &[StockLine::new(sku, 1)]).unwrap_err();
        assert!(matches!(err, StockError::LockUnavailable { attempts: 2, .. }));
        assert!(err.is_retryable());
        assert_eq!(f.inventory.get(sku).unwrap().available_quantity, 1);
    }

    #[test]
    fn deduct_unknown_sku_is_not_found() {
        let f = fixture(1);
        let err = f.manager.deduct_stock(OrderId::new(), &[StockLine::new(SkuId::new(), 1)]).unwrap_err();
        assert!(matches!(err, StockError::SkuNotFound(_)));
    }

    #[test]
    fn failed_line_rolls_back_lines_already_deducted() {
        let f = fixture(1);
        let a = seed(&f.inventory, 5);
        let b = seed(&f.inventory, 5);
        // Lines run in SKU order; make the later one the short one.
        let (first, second) = if a < b { (a, b) } else { (b, a) };
        f.inventory.decrement(second, 5).unwrap();

        let err = f
            .manager
            .deduct_stock(OrderId::new(), &[StockLine::new(first, 1), StockLine::new(second, 1)])
            .unwrap_err();

        assert!(err.is_conflict());
        let first_sku = f.inventory.get(first).unwrap();
        assert_eq!(first_sku.available_quantity, 5);
        assert_eq!(first_sku.status, SkuStatus::InStock);
        assert_eq!(f.inventory.get(second).unwrap().available_quantity, 0);
    }

    #[test]
    fn restore_gives_deducted_stock_back() {
        let f = fixture(1);
        let sku = seed(&f.inventory, 2);
        let order = OrderId::new();

        f.manager.deduct_stock(order, &[StockLine::new(sku, 2)]).unwrap();
        assert_eq!(f.inventory.get(sku).unwrap().status, SkuStatus::OutOfStock);

        let restored = f.manager.restore_stock(order, &[StockLine::new(sku, 2)]).unwrap();
        assert_eq!(restored[0].available_quantity, 2);
        assert_eq!(restored[0].status, SkuStatus::InStock);
    }

    #[test]
    fn restore_unknown_sku_is_not_found() {
        let f = fixture(1);
        let err = f
            .manager
            .restore_stock(OrderId::new(), &[StockLine::new(SkuId::new(), 1)])
            .unwrap_err();
        assert!(matches!(err, StockError::SkuNotFound(_)));
    }
}
