//! Typed events.
//!
//! Platform windows translate OS messages into [`Event`]s. The application
//! dispatches them locally with an [`EventDispatcher`], hands them to the
//! layer stack top-down, and finally publishes leftovers on the [`EventBus`].

mod bus;
mod dispatcher;
#[allow(clippy::module_inception)]
mod event;
mod types;

pub use bus::{EventBus, HandlerId};
pub use dispatcher::EventDispatcher;
pub use event::{Event, EventCategory, EventKind, EventType, StaticEvent};
pub use types::*;
