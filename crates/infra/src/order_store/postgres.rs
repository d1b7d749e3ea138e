//! Postgres-backed order store.
//!
//! The whole order is kept as JSONB in `body`; `order_number`, `buyer_id`,
//! `status` and `version` are mirrored into columns for the unique index,
//! buyer listing and the optimistic version check.
//!
//! ## Error Mapping
//!
//! | SQLx error | PostgreSQL code | OrderStoreError |
//! |------------|-----------------|-----------------|
//! | Database (unique violation) | `23505` | `Duplicate` |
//! | Database (other) | any | `Backend` |
//! | PoolClosed / other | N/A | `Backend` |

use std::sync::Arc;

use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::instrument;

use bazaar_core::{AggregateRoot, ExpectedVersion, OrderId, UserId};
use bazaar_orders::Order;

use super::{OrderStore, OrderStoreError};
use crate::pg::block_on;

#[derive(Debug, Clone)]
pub struct PostgresOrderStore {
    pool: Arc<PgPool>,
}

impl PostgresOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }

    #[instrument(skip(self, order), fields(order_id = %order.order_id(), order_number = %order.order_number()), err)]
    pub async fn insert_order(&self, order: &Order) -> Result<(), OrderStoreError> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, order_number, buyer_id, seller_id, status, version, ordered_at, body)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(*order.order_id().as_uuid())
        .bind(order.order_number().as_str())
        .bind(*order.buyer_id().as_uuid())
        .bind(*order.seller_id().as_uuid())
        .bind(order.status().as_str())
        .bind(version_param(order.version())?)
        .bind(order.ordered_at())
        .bind(Json(order))
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_order", e))?;
        Ok(())
    }

    pub async fn fetch_order(&self, order_id: OrderId) -> Result<Option<Order>, OrderStoreError> {
        let row = sqlx::query("SELECT body FROM orders WHERE id = $1")
            .bind(*order_id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("fetch_order", e))?;
        row.map(|r| decode_body(&r)).transpose()
    }

    pub async fn fetch_for_buyer(&self, buyer_id: UserId) -> Result<Vec<Order>, OrderStoreError> {
        let rows = sqlx::query("SELECT body FROM orders WHERE buyer_id = $1 ORDER BY ordered_at DESC, id DESC")
            .bind(*buyer_id.as_uuid())
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("fetch_for_buyer", e))?;
        rows.iter().map(decode_body).collect()
    }

    #[instrument(skip(self, order), fields(order_id = %order.order_id(), status = order.status().as_str()), err)]
    pub async fn update_order(&self, order: &Order, expected: ExpectedVersion) -> Result<(), OrderStoreError> {
        let expected_version = match expected {
            ExpectedVersion::Any => None,
            ExpectedVersion::Exact(v) => Some(version_param(v)?),
        };

        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $2, version = $3, body = $4
            WHERE id = $1 AND ($5::BIGINT IS NULL OR version = $5)
            "#,
        )
        .bind(*order.order_id().as_uuid())
        .bind(order.status().as_str())
        .bind(version_param(order.version())?)
        .bind(Json(order))
        .bind(expected_version)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_order", e))?;

        if result.rows_affected() == 1 {
            return Ok(());
        }
        match self.fetch_order(order.order_id()).await? {
            None => Err(OrderStoreError::NotFound(order.order_id())),
            Some(current) => Err(OrderStoreError::Concurrency(format!(
                "order {} is at version {}, expected {:?}",
                order.order_id(),
                current.version(),
                expected
            ))),
        }
    }
}

impl OrderStore for PostgresOrderStore {
    fn insert(&self, order: &Order) -> Result<(), OrderStoreError> {
        block_on(self.insert_order(order)).map_err(OrderStoreError::Backend)?
    }

    fn get(&self, order_id: OrderId) -> Result<Option<Order>, OrderStoreError> {
        block_on(self.fetch_order(order_id)).map_err(OrderStoreError::Backend)?
    }

    fn list_for_buyer(&self, buyer_id: UserId) -> Result<Vec<Order>, OrderStoreError> {
        block_on(self.fetch_for_buyer(buyer_id)).map_err(OrderStoreError::Backend)?
    }

    fn update(&self, order: &Order, expected: ExpectedVersion) -> Result<(), OrderStoreError> {
        block_on(self.update_order(order, expected)).map_err(OrderStoreError::Backend)?
    }
}

fn version_param(version: u64) -> Result<i64, OrderStoreError> {
    i64::try_from(version).map_err(|_| OrderStoreError::Backend(format!("version {version} out of range")))
}

fn decode_body(row: &sqlx::postgres::PgRow) -> Result<Order, OrderStoreError> {
    let Json(order): Json<Order> = row
        .try_get("body")
        .map_err(|e| OrderStoreError::Backend(format!("failed to decode order row: {e}")))?;
    Ok(order)
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> OrderStoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => OrderStoreError::Duplicate(msg),
                _ => OrderStoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => OrderStoreError::Backend(format!("connection pool closed in {}", operation)),
        other => OrderStoreError::Backend(format!("{} failed: {}", operation, other)),
    }
}
