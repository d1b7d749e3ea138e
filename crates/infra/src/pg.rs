//! Shared Postgres plumbing for the sync store traits.
//!
//! Store traits are blocking; the Postgres adapters bridge into sqlx by
//! blocking on the ambient tokio runtime. Call them from a blocking context
//! (e.g. `tokio::task::spawn_blocking`), never from inside an async task.

use std::future::Future;

use sqlx::PgPool;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS skus (
        id UUID PRIMARY KEY,
        seller_id UUID NOT NULL,
        name TEXT NOT NULL,
        code TEXT NOT NULL,
        price NUMERIC(18, 4) NOT NULL,
        available_qty INTEGER NOT NULL CHECK (available_qty >= 0),
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        status TEXT NOT NULL DEFAULT 'in_stock'
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS orders (
        id UUID PRIMARY KEY,
        order_number TEXT NOT NULL UNIQUE,
        buyer_id UUID NOT NULL,
        seller_id UUID NOT NULL,
        status TEXT NOT NULL,
        version BIGINT NOT NULL,
        ordered_at TIMESTAMPTZ NOT NULL,
        body JSONB NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS orders_buyer_idx ON orders (buyer_id, ordered_at DESC)",
];

/// Create the tables used by the Postgres stores if they do not exist.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

/// Drive `fut` to completion on the current tokio runtime.
pub(crate) fn block_on<F: Future>(fut: F) -> Result<F::Output, String> {
    let handle = tokio::runtime::Handle::try_current()
        .map_err(|e| format!("no tokio runtime available: {e}"))?;
    Ok(handle.block_on(fut))
}
