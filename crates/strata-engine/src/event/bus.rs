use super::event::{Event, EventCategory, EventType, StaticEvent};

/// Handle returned by [`EventBus`] subscriptions.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct HandlerId(u64);

type Handler = Box<dyn FnMut(&Event) -> bool>;

enum Filter {
    Type(EventType),
    Category(EventCategory),
}

struct Subscription {
    id: HandlerId,
    filter: Filter,
    handler: Handler,
}

/// Publish/subscribe hub for events that reach the end of layer propagation.
///
/// Handlers return `true` to mark the event handled, which stops delivery.
/// Type subscribers run before category subscribers; within each group the
/// order is subscription order.
#[derive(Default)]
pub struct EventBus {
    subscriptions: Vec<Subscription>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to one event type.
    pub fn subscribe<T, F>(&mut self, mut handler: F) -> HandlerId
    where
        T: StaticEvent,
        F: FnMut(&T) -> bool + 'static,
    {
        self.insert(
            Filter::Type(T::TYPE),
            Box::new(move |event: &Event| event.downcast::<T>().is_some_and(|e| handler(e))),
        )
    }

    /// Subscribes to every event in any of `categories`.
    pub fn subscribe_category<F>(&mut self, categories: EventCategory, handler: F) -> HandlerId
    where
        F: FnMut(&Event) -> bool + 'static,
    {
        self.insert(Filter::Category(categories), Box::new(handler))
    }

    /// Returns `false` when `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: HandlerId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        before != self.subscriptions.len()
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    pub fn clear(&mut self) {
        self.subscriptions.clear();
    }

    pub fn publish(&mut self, event: &mut Event) {
        let ty = event.event_type();

        for sub in &mut self.subscriptions {
            if event.is_handled() {
                return;
            }
            if matches!(sub.filter, Filter::Type(t) if t == ty) {
                let handled = (sub.handler)(&*event);
                event.merge_handled(handled);
            }
        }

        for sub in &mut self.subscriptions {
            if event.is_handled() {
                return;
            }
            if let Filter::Category(categories) = sub.filter {
                if event.is_in_category(categories) {
                    let handled = (sub.handler)(&*event);
                    event.merge_handled(handled);
                }
            }
        }
    }

    fn insert(&mut self, filter: Filter, handler: Handler) -> HandlerId {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        self.subscriptions.push(Subscription { id, filter, handler });
        id
    }
}
