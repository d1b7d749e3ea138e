//! Human-facing order numbers.
//!
//! Format: `YYYYMMDDhhmmss` (UTC) followed by a 4-digit random suffix.
//! Numbers minted together by `generate_batch` never collide with each other.
//! Separate checkouts in the same second can still collide; the order id is
//! the real key and stores reject duplicate numbers.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

const SUFFIX_SPACE: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    pub fn generate(now: DateTime<Utc>) -> Self {
        Self::generate_with(now, &mut rand::thread_rng())
    }

    pub fn generate_with<R: Rng + ?Sized>(now: DateTime<Utc>, rng: &mut R) -> Self {
        let suffix: u16 = rng.gen_range(0..10_000);
        Self(format!("{}{:04}", now.format("%Y%m%d%H%M%S"), suffix))
    }

    /// `count` numbers stamped `now` with pairwise distinct suffixes.
    ///
    /// `None` when `count` exceeds the suffix space.
    pub fn generate_batch(now: DateTime<Utc>, count: usize) -> Option<Vec<Self>> {
        Self::generate_batch_with(now, count, &mut rand::thread_rng())
    }

    pub fn generate_batch_with<R: Rng + ?Sized>(now: DateTime<Utc>, count: usize, rng: &mut R) -> Option<Vec<Self>> {
        if count > SUFFIX_SPACE {
            return None;
        }
        let stamp = now.format("%Y%m%d%H%M%S").to_string();
        Some(
            rand::seq::index::sample(rng, SUFFIX_SPACE, count)
                .into_iter()
                .map(|suffix| Self(format!("{stamp}{suffix:04}")))
                .collect(),
        )
    }

    pub fn from_string(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
