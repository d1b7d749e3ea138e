//! Stock reservation manager and its per-SKU lease.

pub mod lease;
pub mod manager;
pub mod reservation;
pub mod retry;

pub use lease::{LeaseError, LeaseManager, SkuLease};
pub use manager::{StockError, StockReservationManager};
pub use reservation::StockReservation;
pub use retry::{BackoffStrategy, RetryPolicy};
