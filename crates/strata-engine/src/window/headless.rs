use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Arc;

use crate::event::{Event, EventKind};

use super::{NativeWindow, Window, WindowProps};

type EventQueue = Rc<RefCell<VecDeque<Event>>>;

/// Window with no OS counterpart. Events come from an [`EventInjector`].
#[derive(Debug)]
pub struct HeadlessWindow {
    title: String,
    size: (u32, u32),
    vsync: bool,
    queue: EventQueue,
}

/// Queues events for the next [`Window::poll_events`] of its window.
#[derive(Debug, Clone)]
pub struct EventInjector {
    queue: EventQueue,
}

impl EventInjector {
    pub fn push(&self, event: impl Into<Event>) {
        self.queue.borrow_mut().push_back(event.into());
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }
}

impl HeadlessWindow {
    pub fn new(props: &WindowProps) -> Self {
        Self {
            title: props.title.clone(),
            size: (props.width, props.height),
            vsync: props.vsync,
            queue: EventQueue::default(),
        }
    }

    pub fn injector(&self) -> EventInjector {
        EventInjector {
            queue: self.queue.clone(),
        }
    }
}

impl Window for HeadlessWindow {
    fn title(&self) -> &str {
        &self.title
    }

    fn width(&self) -> u32 {
        self.size.0
    }

    fn height(&self) -> u32 {
        self.size.1
    }

    fn poll_events(&mut self, callback: &mut dyn FnMut(Event)) {
        // Events queued by handlers run on the next poll.
        let pending: Vec<Event> = self.queue.borrow_mut().drain(..).collect();
        for event in pending {
            if let EventKind::WindowResize(e) = event.kind() {
                self.size = (e.width, e.height);
            }
            callback(event);
        }
    }

    fn native_window(&self) -> Option<Arc<dyn NativeWindow>> {
        None
    }

    fn set_vsync(&mut self, enabled: bool) {
        self.vsync = enabled;
    }

    fn is_vsync(&self) -> bool {
        self.vsync
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventType, WindowCloseEvent, WindowResizeEvent};

    #[test]
    fn injected_events_arrive_in_order() {
        let mut window = HeadlessWindow::new(&WindowProps::default());
        let injector = window.injector();
        injector.push(WindowResizeEvent { width: 320, height: 200 });
        injector.push(WindowCloseEvent);
        assert_eq!(injector.pending(), 2);

        let mut seen = Vec::new();
        window.poll_events(&mut |e| seen.push(e.event_type()));

        assert_eq!(seen, vec![EventType::WindowResize, EventType::WindowClose]);
        assert_eq!((window.width(), window.height()), (320, 200));
        assert_eq!(injector.pending(), 0);
    }

    #[test]
    fn headless_window_has_no_native_handle() {
        let window = HeadlessWindow::new(&WindowProps::new("t", 8, 8));
        assert!(window.native_window().is_none());
        assert_eq!(window.title(), "t");
    }
}
