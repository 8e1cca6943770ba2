//! Notice fan-out for the clinic core: the [`Event`] trait plus a small
//! publish/subscribe bus.

pub mod bus;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
