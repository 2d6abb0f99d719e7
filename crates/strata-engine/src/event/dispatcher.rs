use super::event::{Event, StaticEvent};

/// Routes one live event to typed handlers.
///
/// ```ignore
/// let mut dispatcher = EventDispatcher::new(event);
/// dispatcher.dispatch::<WindowCloseEvent>(|_| { running = false; true });
/// ```
pub struct EventDispatcher<'e> {
    event: &'e mut Event,
}

impl<'e> EventDispatcher<'e> {
    pub fn new(event: &'e mut Event) -> Self {
        Self { event }
    }

    /// Invokes `handler` when the event is a `T` and not yet handled.
    ///
    /// The handler's return value is ORed into the handled flag. Returns
    /// whether the handler ran.
    pub fn dispatch<T, F>(&mut self, handler: F) -> bool
    where
        T: StaticEvent,
        F: FnOnce(&T) -> bool,
    {
        if self.event.is_handled() {
            return false;
        }
        let Some(payload) = T::from_kind(self.event.kind()) else {
            return false;
        };
        let handled = handler(payload);
        self.event.merge_handled(handled);
        true
    }

    pub fn event(&self) -> &Event {
        self.event
    }
}
