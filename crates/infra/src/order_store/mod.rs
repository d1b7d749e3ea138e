//! Order persistence.

use std::sync::Arc;

use thiserror::Error;

use bazaar_core::{ExpectedVersion, OrderId, UserId};
use bazaar_orders::Order;

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryOrderStore;
pub use postgres::PostgresOrderStore;

#[derive(Debug, Error)]
pub enum OrderStoreError {
    /// Order id or order number already taken.
    #[error("duplicate order: {0}")]
    Duplicate(String),

    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    #[error("order not found: {0}")]
    NotFound(OrderId),

    #[error("order store backend error: {0}")]
    Backend(String),
}

pub trait OrderStore: Send + Sync {
    /// Persist a new order. Order ids and order numbers are unique.
    fn insert(&self, order: &Order) -> Result<(), OrderStoreError>;

    fn get(&self, order_id: OrderId) -> Result<Option<Order>, OrderStoreError>;

    /// Orders of one buyer, newest first.
    fn list_for_buyer(&self, buyer_id: UserId) -> Result<Vec<Order>, OrderStoreError>;

    /// Replace a stored order if its stored version satisfies `expected`.
    fn update(&self, order: &Order, expected: ExpectedVersion) -> Result<(), OrderStoreError>;
}

impl<S> OrderStore for Arc<S>
where
    S: OrderStore + ?Sized,
{
    fn insert(&self, order: &Order) -> Result<(), OrderStoreError> {
        (**self).insert(order)
    }

    fn get(&self, order_id: OrderId) -> Result<Option<Order>, OrderStoreError> {
        (**self).get(order_id)
    }

    fn list_for_buyer(&self, buyer_id: UserId) -> Result<Vec<Order>, OrderStoreError> {
        (**self).list_for_buyer(buyer_id)
    }

    fn update(&self, order: &Order, expected: ExpectedVersion) -> Result<(), OrderStoreError> {
        (**self).update(order, expected)
    }
}
