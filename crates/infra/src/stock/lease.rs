//! Per-SKU lease: a set-if-absent key with a TTL in the coordination store.
//!
//! Each acquisition writes a random token; release deletes the key only
//! while it still holds that token, so a holder whose lease already expired
//! cannot remove its successor's lease.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tracing::{debug, warn};

use bazaar_core::SkuId;

use super::reservation::lease_key;
use super::retry::RetryPolicy;
use crate::coordination::{CoordinationError, CoordinationStore};

#[derive(Debug, Error)]
pub enum LeaseError {
    #[error("lease on sku {sku_id} not acquired after {attempts} attempts")]
    Unavailable { sku_id: SkuId, attempts: u32 },

    #[error(transparent)]
    Coordination(#[from] CoordinationError),
}

/// Hands out `SkuLease` guards.
#[derive(Clone)]
pub struct LeaseManager {
    store: Arc<dyn CoordinationStore>,
    ttl: Duration,
    retry: RetryPolicy,
}

impl LeaseManager {
    pub fn new(store: Arc<dyn CoordinationStore>, ttl: Duration, retry: RetryPolicy) -> Self {
        Self { store, ttl, retry }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Acquire the lease on `sku_id`, waiting per the retry policy.
    pub fn acquire(&self, sku_id: SkuId) -> Result<SkuLease, LeaseError> {
        let key = lease_key(sku_id);
        let token = new_token();
        let mut attempt = 0;

        loop {
            attempt += 1;
            if self.store.set_if_absent(&key, &token, self.ttl)? {
                debug!(sku_id = %sku_id, attempt, "sku lease acquired");
                return Ok(SkuLease {
                    store: self.store.clone(),
                    sku_id,
                    key,
                    token,
                    released: false,
                });
            }
            if !self.retry.should_retry(attempt) {
                return Err(LeaseError::Unavailable {
                    sku_id,
                    attempts: attempt,
                });
            }
            std::thread::sleep(self.retry.delay_after(attempt));
        }
    }
}

fn new_token() -> String {
    format!("{:032x}", rand::thread_rng().r#gen::<u128>())
}

/// Held lease on one SKU. Released on drop.
#[must_use = "the lease is released as soon as the guard is dropped"]
pub struct SkuLease {
    store: Arc<dyn CoordinationStore>,
    sku_id: SkuId,
    key: String,
    token: String,
    released: bool,
}

impl SkuLease {
    pub fn sku_id(&self) -> SkuId {
        self.sku_id
    }

    /// Release now, reporting whether this holder still owned the key.
    pub fn release(mut self) -> Result<bool, CoordinationError> {
        self.released = true;
        self.store.delete_if_equals(&self.key, &self.token)
    }
}

impl Drop for SkuLease {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        match self.store.delete_if_equals(&self.key, &self.token) {
            Ok(true) => {}
            Ok(false) => warn!(sku_id = %self.sku_id, "sku lease expired before release"),
            Err(e) => warn!(sku_id = %self.sku_id, error = %e, "failed to release sku lease"),
        }
    }
}

impl std::fmt::Debug for SkuLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkuLease")
            .field("sku_id", &self.sku_id)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}
