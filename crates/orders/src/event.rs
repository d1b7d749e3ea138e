use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_events::Event;

use crate::order::Order;

/// A seller order was persisted.
///
/// Serializes as the full order snapshot plus `occurred_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreated {
    #[serde(flatten)]
    pub order: Order,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OrderEvent {
    OrderCreated(OrderCreated),
}

impl Event for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderCreated(_) => "order_created",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            OrderEvent::OrderCreated(e) => e.occurred_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bazaar_core::{Money, OrderId, SellerId, SkuId, UserId};
    use bazaar_events::EventEnvelope;
    use bazaar_inventory::{SkuSnapshot, SkuStatus};

    use crate::{Discounts, OrderNumber, PlaceOrder, PurchaseLine};

    #[test]
    fn envelope_carries_order_snapshot() {
        let seller = SellerId::new();
        let now = Utc::now();
        let order = Order::place(PlaceOrder {
            order_id: OrderId::new(),
            order_number: OrderNumber::generate(now),
            buyer_id: UserId::new(),
            seller_id: seller,
            lines: vec![PurchaseLine {
                sku: SkuSnapshot {
                    id: SkuId::new(),
                    seller_id: seller,
                    name: "Mug".to_string(),
                    code: "M-1".to_string(),
                    price: Money::from_minor(750),
                    available_quantity: 4,
                    is_active: true,
                    status: SkuStatus::InStock,
                },
                quantity: 2,
            }],
            shipping_fee: Money::ZERO,
            discounts: Discounts::none(),
            payment_method: "card".to_string(),
            shipping_reference: "addr".to_string(),
            ordered_at: now,
        })
        .unwrap();

        let event = OrderEvent::OrderCreated(OrderCreated { order: order.clone(), occurred_at: now });
        let envelope = EventEnvelope::from_event(order.order_id(), event).into_json().unwrap();

        assert_eq!(envelope.event_type(), "order_created");
        assert_eq!(envelope.order_id(), order.order_id());
        assert_eq!(envelope.order_data()["final_amount"], "15.00");
        assert_eq!(envelope.order_data()["order_number"], order.order_number().as_str());

        let back: OrderEvent = serde_json::from_value(envelope.into_order_data()).unwrap();
        assert_eq!(back, OrderEvent::OrderCreated(OrderCreated { order, occurred_at: now }));
    }
}
