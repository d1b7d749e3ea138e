//! Integration events and the pub/sub mechanics used to announce them.
//!
//! Events published here are facts for *other* subsystems (search indexing,
//! seller notifications). Delivery is best-effort: nothing in this crate
//! persists or retries a message.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
