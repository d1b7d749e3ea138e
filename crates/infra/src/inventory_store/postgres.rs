//! Postgres-backed inventory store over the `skus` table.

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use bazaar_core::{Money, SellerId, SkuId};
use bazaar_inventory::{SkuSnapshot, SkuStatus};

use super::{InventoryStore, InventoryStoreError};
use crate::pg::block_on;

const SKU_COLUMNS: &str = "id, seller_id, name, code, price, available_qty, is_active, status";

#[derive(Debug, Clone)]
pub struct PostgresInventoryStore {
    pool: Arc<PgPool>,
}

impl PostgresInventoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    pub async fn fetch_skus(&self, ids: &[SkuId]) -> Result<HashMap<SkuId, SkuSnapshot>, InventoryStoreError> {
        let uuids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let sql = format!("SELECT {SKU_COLUMNS} FROM skus WHERE id = ANY($1)");
        let rows = sqlx::query(&sql)
            .bind(&uuids)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("fetch_skus", e))?;

        let mut out = HashMap::with_capacity(rows.len());
        for row in rows {
            let sku = sku_from_row(&row)?;
            out.insert(sku.id, sku);
        }
        Ok(out)
    }

    #[instrument(skip(self), fields(sku_id = %sku_id), err)]
    pub async fn decrement_quantity(&self, sku_id: SkuId, quantity: u32) -> Result<SkuSnapshot, InventoryStoreError> {
        let sql = format!(
            r#"
            UPDATE skus
            SET available_qty = available_qty - $2,
                status = CASE WHEN available_qty - $2 = 0 THEN 'out_of_stock' ELSE status END
            WHERE id = $1 AND available_qty >= $2
            RETURNING {SKU_COLUMNS}
            "#
        );
        let quantity_param = i32::try_from(quantity)
            .map_err(|_| InventoryStoreError::Backend(format!("quantity {quantity} out of range")))?;
        let row = sqlx::query(&sql)
            .bind(*sku_id.as_uuid())
            .bind(quantity_param)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("decrement", e))?;

        if let Some(row) = row {
            return sku_from_row(&row);
        }

        // Nothing updated: tell "unknown" apart from "not enough".
        let current = self.fetch_skus(&[sku_id]).await?;
        match current.get(&sku_id) {
            None => Err(InventoryStoreError::NotFound(sku_id)),
            Some(sku) => Err(InventoryStoreError::Insufficient {
                sku_id,
                requested: quantity,
                available: sku.available_quantity,
            }),
        }
    }

    #[instrument(skip(self), fields(sku_id = %sku_id), err)]
    pub async fn increment_quantity(&self, sku_id: SkuId, quantity: u32) -> Result<SkuSnapshot, InventoryStoreError> {
        let sql = format!(
            r#"
            UPDATE skus
            SET available_qty = available_qty + $2,
                status = 'in_stock'
            WHERE id = $1
            RETURNING {SKU_COLUMNS}
            "#
        );
        let quantity_param = i32::try_from(quantity)
            .map_err(|_| InventoryStoreError::Backend(format!("quantity {quantity} out of range")))?;
        let row = sqlx::query(&sql)
            .bind(*sku_id.as_uuid())
            .bind(quantity_param)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("increment", e))?;

        match row {
            Some(row) => sku_from_row(&row),
            None => Err(InventoryStoreError::NotFound(sku_id)),
        }
    }
}

impl InventoryStore for PostgresInventoryStore {
    fn get_skus(&self, ids: &[SkuId]) -> Result<HashMap<SkuId, SkuSnapshot>, InventoryStoreError> {
        block_on(self.fetch_skus(ids)).map_err(InventoryStoreError::Backend)?
    }

    fn decrement(&self, sku_id: SkuId, quantity: u32) -> Result<SkuSnapshot, InventoryStoreError> {
        block_on(self.decrement_quantity(sku_id, quantity)).map_err(InventoryStoreError::Backend)?
    }

    fn increment(&self, sku_id: SkuId, quantity: u32) -> Result<SkuSnapshot, InventoryStoreError> {
        block_on(self.increment_quantity(sku_id, quantity)).map_err(InventoryStoreError::Backend)?
    }
}

fn sku_from_row(row: &PgRow) -> Result<SkuSnapshot, InventoryStoreError> {
    let decode = |e: sqlx::Error| InventoryStoreError::Backend(format!("failed to decode sku row: {e}"));

    let qty: i32 = row.try_get("available_qty").map_err(decode)?;
    let status: String = row.try_get("status").map_err(decode)?;
    let price: Decimal = row.try_get("price").map_err(decode)?;

    Ok(SkuSnapshot {
        id: SkuId::from_uuid(row.try_get("id").map_err(decode)?),
        seller_id: SellerId::from_uuid(row.try_get("seller_id").map_err(decode)?),
        name: row.try_get("name").map_err(decode)?,
        code: row.try_get("code").map_err(decode)?,
        price: Money::new(price),
        available_quantity: u32::try_from(qty)
            .map_err(|_| InventoryStoreError::Backend(format!("negative quantity {qty} in skus table")))?,
        is_active: row.try_get("is_active").map_err(decode)?,
        status: SkuStatus::parse(&status).map_err(|e| InventoryStoreError::Backend(e.to_string()))?,
    })
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> InventoryStoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            InventoryStoreError::Backend(format!("database error in {}: {}", operation, db_err.message()))
        }
        sqlx::Error::PoolClosed => {
            InventoryStoreError::Backend(format!("connection pool closed in {}", operation))
        }
        other => InventoryStoreError::Backend(format!("{} failed: {}", operation, other)),
    }
}
