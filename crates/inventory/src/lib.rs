//! Inventory domain module.
//!
//! Read-side view of the catalog's SKUs plus the pure stock rules used by the
//! reservation manager (no IO, no locking, no storage).

pub mod sku;
pub mod stock;

pub use sku::{PurchaseRejection, SkuSnapshot, SkuStatus};
pub use stock::{StockCheck, StockLine, StockShortage, merge_lines};
