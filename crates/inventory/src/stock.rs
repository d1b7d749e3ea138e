//! Stock lines and point-in-time availability checks.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use bazaar_core::{DomainError, DomainResult, SkuId, ValueObject};

use crate::sku::SkuSnapshot;

/// A requested quantity of one SKU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLine {
    pub sku_id: SkuId,
    pub quantity: u32,
}

impl ValueObject for StockLine {}

impl StockLine {
    pub fn new(sku_id: SkuId, quantity: u32) -> Self {
        Self { sku_id, quantity }
    }
}

/// A line that cannot be satisfied from current stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockShortage {
    pub sku_id: SkuId,
    pub requested: u32,
    pub available: u32,
}

/// Result of a point-in-time availability check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockCheck {
    pub available: bool,
    pub unavailable: Vec<StockShortage>,
}

impl StockCheck {
    /// Compare requested lines against live snapshots.
    ///
    /// A SKU missing from `skus` counts as zero available.
    pub fn evaluate(lines: &[StockLine], skus: &HashMap<SkuId, SkuSnapshot>) -> Self {
        let unavailable: Vec<StockShortage> = lines
            .iter()
            .filter_map(|line| {
                let available = skus.get(&line.sku_id).map_or(0, |s| s.available_quantity);
                (available < line.quantity).then_some(StockShortage {
                    sku_id: line.sku_id,
                    requested: line.quantity,
                    available,
                })
            })
            .collect();

        Self {
            available: unavailable.is_empty(),
            unavailable,
        }
    }
}

/// Merge duplicate SKU lines (summing quantities), ordered by SKU id.
///
/// Zero quantities are rejected so that a request cannot "reserve nothing".
pub fn merge_lines(lines: &[StockLine]) -> DomainResult<Vec<StockLine>> {
    let mut merged: BTreeMap<SkuId, u32> = BTreeMap::new();
    for line in lines {
        if line.quantity == 0 {
            return Err(DomainError::validation(format!(
                "quantity for sku {} must be positive",
                line.sku_id
            )));
        }
        let entry = merged.entry(line.sku_id).or_insert(0);
        *entry = entry.checked_add(line.quantity).ok_or_else(|| {
            DomainError::validation(format!("quantity overflow for sku {}", line.sku_id))
        })?;
    }

    Ok(merged
        .into_iter()
        .map(|(sku_id, quantity)| StockLine { sku_id, quantity })
        .collect())
}
