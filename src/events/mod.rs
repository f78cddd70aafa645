//! Event/subscription bus. Entity writes and site deletion publish here; the
//! security engine subscribes to keep its capability cache honest.

mod event;
mod subscription;
mod bus;

pub use event::{ChangeAction, EntityChangedEvent, Event};
pub use subscription::{EventListener, SubscriptionId, SubscriptionParams};
pub use bus::EventBus;
