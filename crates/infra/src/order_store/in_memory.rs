use std::collections::HashMap;
use std::sync::RwLock;

use bazaar_core::{AggregateRoot, ExpectedVersion, OrderId, UserId};
use bazaar_orders::Order;

use super::{OrderStore, OrderStoreError};

/// In-memory order store.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    orders: RwLock<HashMap<OrderId, Order>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.orders.read().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> OrderStoreError {
    OrderStoreError::Backend("lock poisoned".to_string())
}

impl OrderStore for InMemoryOrderStore {
    fn insert(&self, order: &Order) -> Result<(), OrderStoreError> {
        let mut orders = self.orders.write().map_err(|_| poisoned())?;
        if orders.contains_key(&order.order_id()) {
            return Err(OrderStoreError::Duplicate(format!("order id {}", order.order_id())));
        }
        if orders.values().any(|o| o.order_number() == order.order_number()) {
            return Err(OrderStoreError::Duplicate(format!("order number {}", order.order_number())));
        }
        orders.insert(order.order_id(), order.clone());
        Ok(())
    }

    fn get(&self, order_id: OrderId) -> Result<Option<Order>, OrderStoreError> {
        Ok(self.orders.read().map_err(|_| poisoned())?.get(&order_id).cloned())
    }

    fn list_for_buyer(&self, buyer_id: UserId) -> Result<Vec<Order>, OrderStoreError> {
        let orders = self.orders.read().map_err(|_| poisoned())?;
        let mut out: Vec<Order> = orders.values().filter(|o| o.buyer_id() == buyer_id).cloned().collect();
        out.sort_by(|a, b| b.ordered_at().cmp(&a.ordered_at()).then_with(|| b.order_id().cmp(&a.order_id())));
        Ok(out)
    }

    fn update(&self, order: &Order, expected: ExpectedVersion) -> Result<(), OrderStoreError> {
        let mut orders = self.orders.write().map_err(|_| poisoned())?;
        let current = orders
            .get_mut(&order.order_id())
            .ok_or(OrderStoreError::NotFound(order.order_id()))?;
        if !expected.matches(current.version()) {
            return Err(OrderStoreError::Concurrency(format!(
                "order {} is at version {}, expected {:?}",
                order.order_id(),
                current.version(),
                expected
            )));
        }
        *current = order.clone();
        Ok(())
    }
}
