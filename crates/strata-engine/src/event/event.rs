use std::fmt;

use bitflags::bitflags;

use super::types::*;

/// Static type tag of an event.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum EventType {
    None,
    AppInit,
    AppShutdown,
    AppUpdate,
    WindowClose,
    WindowResize,
    WindowFocus,
    WindowLostFocus,
    KeyPressed,
    KeyReleased,
    KeyTyped,
    MouseMoved,
    MouseScrolled,
    MouseButtonPressed,
    MouseButtonReleased,
}

bitflags! {
    /// Coarse event classes. An event can belong to several.
    #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
    pub struct EventCategory: u32 {
        const APPLICATION  = 1 << 0;
        const WINDOW       = 1 << 1;
        const INPUT        = 1 << 2;
        const KEYBOARD     = 1 << 3;
        const MOUSE        = 1 << 4;
        const MOUSE_BUTTON = 1 << 5;
    }
}

impl EventType {
    pub fn name(self) -> &'static str {
        match self {
            EventType::None => "None",
            EventType::AppInit => "AppInit",
            EventType::AppShutdown => "AppShutdown",
            EventType::AppUpdate => "AppUpdate",
            EventType::WindowClose => "WindowClose",
            EventType::WindowResize => "WindowResize",
            EventType::WindowFocus => "WindowFocus",
            EventType::WindowLostFocus => "WindowLostFocus",
            EventType::KeyPressed => "KeyPressed",
            EventType::KeyReleased => "KeyReleased",
            EventType::KeyTyped => "KeyTyped",
            EventType::MouseMoved => "MouseMoved",
            EventType::MouseScrolled => "MouseScrolled",
            EventType::MouseButtonPressed => "MouseButtonPressed",
            EventType::MouseButtonReleased => "MouseButtonReleased",
        }
    }

    pub fn categories(self) -> EventCategory {
        use EventCategory as C;
        match self {
            EventType::None => C::empty(),
            EventType::AppInit | EventType::AppShutdown | EventType::AppUpdate => C::APPLICATION,
            EventType::WindowClose | EventType::WindowResize => C::WINDOW | C::APPLICATION,
            EventType::WindowFocus | EventType::WindowLostFocus => C::WINDOW,
            EventType::KeyPressed | EventType::KeyReleased | EventType::KeyTyped => {
                C::INPUT | C::KEYBOARD
            }
            EventType::MouseMoved | EventType::MouseScrolled => C::INPUT | C::MOUSE,
            EventType::MouseButtonPressed | EventType::MouseButtonReleased => {
                C::INPUT | C::MOUSE | C::MOUSE_BUTTON
            }
        }
    }
}

/// Implemented by every event payload so dispatchers can match on a type.
pub trait StaticEvent: Sized + 'static {
    const TYPE: EventType;

    fn from_kind(kind: &EventKind) -> Option<&Self>;
}

/// The closed set of event payloads.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    AppInit(AppInitEvent),
    AppShutdown(AppShutdownEvent),
    AppUpdate(AppUpdateEvent),
    WindowClose(WindowCloseEvent),
    WindowResize(WindowResizeEvent),
    WindowFocus(WindowFocusEvent),
    WindowLostFocus(WindowLostFocusEvent),
    KeyPressed(KeyPressedEvent),
    KeyReleased(KeyReleasedEvent),
    KeyTyped(KeyTypedEvent),
    MouseMoved(MouseMovedEvent),
    MouseScrolled(MouseScrolledEvent),
    MouseButtonPressed(MouseButtonPressedEvent),
    MouseButtonReleased(MouseButtonReleasedEvent),
}

impl EventKind {
    pub fn event_type(&self) -> EventType {
        match self {
            EventKind::AppInit(_) => EventType::AppInit,
            EventKind::AppShutdown(_) => EventType::AppShutdown,
            EventKind::AppUpdate(_) => EventType::AppUpdate,
            EventKind::WindowClose(_) => EventType::WindowClose,
            EventKind::WindowResize(_) => EventType::WindowResize,
            EventKind::WindowFocus(_) => EventType::WindowFocus,
            EventKind::WindowLostFocus(_) => EventType::WindowLostFocus,
            EventKind::KeyPressed(_) => EventType::KeyPressed,
            EventKind::KeyReleased(_) => EventType::KeyReleased,
            EventKind::KeyTyped(_) => EventType::KeyTyped,
            EventKind::MouseMoved(_) => EventType::MouseMoved,
            EventKind::MouseScrolled(_) => EventType::MouseScrolled,
            EventKind::MouseButtonPressed(_) => EventType::MouseButtonPressed,
            EventKind::MouseButtonReleased(_) => EventType::MouseButtonReleased,
        }
    }
}

/// A live event: an immutable payload plus the mutable `handled` flag.
///
/// Once `handled` is set, dispatchers, layers and bus subscribers skip the
/// event for the rest of the propagation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    kind: EventKind,
    handled: bool,
}

impl Event {
    pub fn new(kind: EventKind) -> Self {
        Self { kind, handled: false }
    }

    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    pub fn event_type(&self) -> EventType {
        self.kind.event_type()
    }

    pub fn name(&self) -> &'static str {
        self.event_type().name()
    }

    pub fn categories(&self) -> EventCategory {
        self.event_type().categories()
    }

    /// True when the event belongs to any of `category`.
    pub fn is_in_category(&self, category: EventCategory) -> bool {
        self.categories().intersects(category)
    }

    pub fn is_handled(&self) -> bool {
        self.handled
    }

    pub fn mark_handled(&mut self) {
        self.handled = true;
    }

    /// ORs `handled` into the flag. It never clears it.
    pub(crate) fn merge_handled(&mut self, handled: bool) {
        self.handled |= handled;
    }

    /// Payload as `T`, if this event is a `T`.
    pub fn downcast<T: StaticEvent>(&self) -> Option<&T> {
        T::from_kind(&self.kind)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            EventKind::AppInit(e) => fmt::Display::fmt(e, f),
            EventKind::AppShutdown(e) => fmt::Display::fmt(e, f),
            EventKind::AppUpdate(e) => fmt::Display::fmt(e, f),
            EventKind::WindowClose(e) => fmt::Display::fmt(e, f),
            EventKind::WindowResize(e) => fmt::Display::fmt(e, f),
            EventKind::WindowFocus(e) => fmt::Display::fmt(e, f),
            EventKind::WindowLostFocus(e) => fmt::Display::fmt(e, f),
            EventKind::KeyPressed(e) => fmt::Display::fmt(e, f),
            EventKind::KeyReleased(e) => fmt::Display::fmt(e, f),
            EventKind::KeyTyped(e) => fmt::Display::fmt(e, f),
            EventKind::MouseMoved(e) => fmt::Display::fmt(e, f),
            EventKind::MouseScrolled(e) => fmt::Display::fmt(e, f),
            EventKind::MouseButtonPressed(e) => fmt::Display::fmt(e, f),
            EventKind::MouseButtonReleased(e) => fmt::Display::fmt(e, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{KeyCode, MouseButton};

    // ── categories ────────────────────────────────────────────────────────

    #[test]
    fn window_resize_is_window_and_application() {
        let ev = Event::from(WindowResizeEvent { width: 1, height: 1 });
        assert!(ev.is_in_category(EventCategory::WINDOW));
        assert!(ev.is_in_category(EventCategory::APPLICATION));
        assert!(!ev.is_in_category(EventCategory::INPUT));
    }

    #[test]
    fn mouse_button_has_three_categories() {
        let ev = Event::from(MouseButtonPressedEvent { button: MouseButton::LEFT });
        assert_eq!(
            ev.categories(),
            EventCategory::INPUT | EventCategory::MOUSE | EventCategory::MOUSE_BUTTON
        );
    }

    #[test]
    fn focus_events_are_window_only() {
        assert_eq!(EventType::WindowFocus.categories(), EventCategory::WINDOW);
        assert_eq!(EventType::WindowLostFocus.categories(), EventCategory::WINDOW);
    }

    // ── handled flag ──────────────────────────────────────────────────────

    #[test]
    fn merge_never_clears_handled() {
        let mut ev = Event::from(WindowCloseEvent);
        ev.mark_handled();
        ev.merge_handled(false);
        assert!(ev.is_handled());
    }

    // ── formatting ────────────────────────────────────────────────────────

    #[test]
    fn display_includes_payload() {
        let ev = Event::from(WindowResizeEvent { width: 800, height: 600 });
        assert_eq!(ev.to_string(), "WindowResizeEvent: 800x600");

        let ev = Event::from(KeyPressedEvent { key: KeyCode::A, repeat: true });
        assert_eq!(ev.to_string(), "KeyPressedEvent: A (repeat=true)");
    }

    #[test]
    fn downcast_matches_only_own_type() {
        let ev = Event::from(KeyReleasedEvent { key: KeyCode::Space });
        assert_eq!(ev.downcast::<KeyReleasedEvent>().map(|e| e.key), Some(KeyCode::Space));
        assert!(ev.downcast::<KeyPressedEvent>().is_none());
        assert_eq!(ev.name(), "KeyReleased");
    }
}
