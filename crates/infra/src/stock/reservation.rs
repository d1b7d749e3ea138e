use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{OrderId, SkuId};

const RESERVATION_PREFIX: &str = "bazaar:stock:reservation:";
const LEASE_PREFIX: &str = "bazaar:stock:lease:";

/// Advisory hold of `quantity` units of one SKU for one order.
///
/// Stored as JSON in the coordination store; does not reduce the quantity
/// other checkouts see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockReservation {
    pub order_id: OrderId,
    pub sku_id: SkuId,
    pub quantity: u32,
    pub expires_at: DateTime<Utc>,
}

pub fn reservation_key(order_id: OrderId, sku_id: SkuId) -> String {
    format!("{RESERVATION_PREFIX}{order_id}:{sku_id}")
}

/// Prefix shared by every reservation key of `order_id`.
pub fn reservation_prefix(order_id: OrderId) -> String {
    format!("{RESERVATION_PREFIX}{order_id}:")
}

pub fn lease_key(sku_id: SkuId) -> String {
    format!("{LEASE_PREFIX}{sku_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_follow_the_shared_layout() {
        let order_id = OrderId::new();
        let sku_id = SkuId::new();

        let key = reservation_key(order_id, sku_id);
        assert_eq!(key, format!("bazaar:stock:reservation:{order_id}:{sku_id}"));
        assert!(key.starts_with(&reservation_prefix(order_id)));
        assert_eq!(lease_key(sku_id), format!("bazaar:stock:lease:{sku_id}"));
    }

    #[test]
    fn reservation_json_is_camel_case() {
        let r = StockReservation {
            order_id: OrderId::new(),
            sku_id: SkuId::new(),
            quantity: 2,
            expires_at: Utc::now(),
        };
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["quantity"], 2);
        assert!(json.get("expiresAt").is_some());
        assert!(json.get("skuId").is_some());
    }
}
