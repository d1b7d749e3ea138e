use chrono::{DateTime, Utc};

/// An integration event: a fact announced after it has been persisted.
///
/// The event type and version travel in the envelope so consumers can route
/// and evolve independently of the publisher.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name/type identifier (e.g. "order_created").
    fn event_type(&self) -> &'static str;

    /// Schema version for this event type.
    fn version(&self) -> u32;

    /// When the event occurred (business time).
    fn occurred_at(&self) -> DateTime<Utc>;
}
