use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use bazaar_core::OrderId;

use crate::event::Event;

/// Wire message announcing a fact about an order.
///
/// Serialized as camelCase JSON:
/// `{"eventId", "eventType", "orderId", "orderData", "timestamp"}`.
/// Consumers get at most one copy; there is no outbox behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    event_type: String,
    order_id: OrderId,
    order_data: E,
    timestamp: DateTime<Utc>,
}

impl<E> EventEnvelope<E> {
    pub fn new(
        event_id: Uuid,
        event_type: impl Into<String>,
        order_id: OrderId,
        order_data: E,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id,
            event_type: event_type.into(),
            order_id,
            order_data,
            timestamp,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn order_data(&self) -> &E {
        &self.order_data
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn into_order_data(self) -> E {
        self.order_data
    }
}

impl<E> EventEnvelope<E>
where
    E: Event + Serialize,
{
    /// Wrap a typed event, taking type and timestamp from the event itself.
    pub fn from_event(order_id: OrderId, event: E) -> Self {
        let event_type = event.event_type();
        let timestamp = event.occurred_at();
        Self::new(Uuid::now_v7(), event_type, order_id, event, timestamp)
    }

    /// Erase the payload type for transport.
    pub fn into_json(self) -> Result<EventEnvelope<JsonValue>, serde_json::Error> {
        let order_data = serde_json::to_value(&self.order_data)?;
        Ok(EventEnvelope {
            event_id: self.event_id,
            event_type: self.event_type,
            order_id: self.order_id,
            order_data,
            timestamp: self.timestamp,
        })
    }
}
