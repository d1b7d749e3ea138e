//! "Order created" notifications.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value as JsonValue;
use thiserror::Error;

use bazaar_events::{EventBus, EventEnvelope};
use bazaar_orders::{Order, OrderCreated, OrderEvent};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("failed to encode order event: {0}")]
    Encode(String),

    #[error("failed to publish order event: {0}")]
    Publish(String),
}

/// Announces persisted orders. Best-effort: callers log failures.
pub trait OrderNotifier: Send + Sync {
    fn order_created(&self, order: &Order) -> Result<(), NotifyError>;
}

impl<N> OrderNotifier for Arc<N>
where
    N: OrderNotifier + ?Sized,
{
    fn order_created(&self, order: &Order) -> Result<(), NotifyError> {
        (**self).order_created(order)
    }
}

/// Publishes `order_created` envelopes onto a JSON event bus.
pub struct BusNotifier<B> {
    bus: B,
}

impl<B> BusNotifier<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }
}

impl<B> OrderNotifier for BusNotifier<B>
where
    B: EventBus<EventEnvelope<JsonValue>>,
{
    fn order_created(&self, order: &Order) -> Result<(), NotifyError> {
        let event = OrderEvent::OrderCreated(OrderCreated {
            order: order.clone(),
            occurred_at: Utc::now(),
        });
        let envelope = EventEnvelope::from_event(order.order_id(), event)
            .into_json()
            .map_err(|e| NotifyError::Encode(e.to_string()))?;
        self.bus
            .publish(envelope)
            .map_err(|e| NotifyError::Publish(format!("{e:?}")))
    }
}
