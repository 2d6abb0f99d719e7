//! Event payloads.

use std::fmt;

use crate::input::{KeyCode, MouseButton};

use super::event::{Event, EventKind, EventType, StaticEvent};

/// Wires a payload struct into the tagged event set.
macro_rules! event_payload {
    ($payload:ident => $variant:ident) => {
        impl StaticEvent for $payload {
            const TYPE: EventType = EventType::$variant;

            fn from_kind(kind: &EventKind) -> Option<&Self> {
                match kind {
                    EventKind::$variant(e) => Some(e),
                    _ => None,
                }
            }
        }

        impl From<$payload> for EventKind {
            fn from(e: $payload) -> Self {
                EventKind::$variant(e)
            }
        }

        impl From<$payload> for Event {
            fn from(e: $payload) -> Self {
                Event::new(EventKind::$variant(e))
            }
        }
    };
}

/// Payload-free events print only their name.
macro_rules! unit_event {
    ($(#[$meta:meta])* $payload:ident => $variant:ident) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
        pub struct $payload;

        impl fmt::Display for $payload {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(stringify!($payload))
            }
        }

        event_payload!($payload => $variant);
    };
}

// ── application ───────────────────────────────────────────────────────────

unit_event!(
    /// Published once before the first frame.
    AppInitEvent => AppInit
);
unit_event!(
    /// Published once after the loop exits.
    AppShutdownEvent => AppShutdown
);

/// Published at the end of every frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AppUpdateEvent {
    pub delta_time: f32,
}

impl fmt::Display for AppUpdateEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AppUpdateEvent: dt={:.4}s", self.delta_time)
    }
}

event_payload!(AppUpdateEvent => AppUpdate);

// ── window ────────────────────────────────────────────────────────────────

unit_event!(WindowCloseEvent => WindowClose);
unit_event!(WindowFocusEvent => WindowFocus);
unit_event!(WindowLostFocusEvent => WindowLostFocus);

/// New client size in physical pixels. Either side may be zero when minimized.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct WindowResizeEvent {
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for WindowResizeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WindowResizeEvent: {}x{}", self.width, self.height)
    }
}

event_payload!(WindowResizeEvent => WindowResize);

// ── keyboard ──────────────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct KeyPressedEvent {
    pub key: KeyCode,
    /// Generated by OS key repeat.
    pub repeat: bool,
}

impl fmt::Display for KeyPressedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyPressedEvent: {} (repeat={})", self.key, self.repeat)
    }
}

event_payload!(KeyPressedEvent => KeyPressed);

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct KeyReleasedEvent {
    pub key: KeyCode,
}

impl fmt::Display for KeyReleasedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyReleasedEvent: {}", self.key)
    }
}

event_payload!(KeyReleasedEvent => KeyReleased);

/// A committed text character.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct KeyTypedEvent {
    pub character: char,
}

impl fmt::Display for KeyTypedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyTypedEvent: {:?}", self.character)
    }
}

event_payload!(KeyTypedEvent => KeyTyped);

// ── mouse ─────────────────────────────────────────────────────────────────

/// Cursor position in client-area pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MouseMovedEvent {
    pub x: f32,
    pub y: f32,
}

impl fmt::Display for MouseMovedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MouseMovedEvent: {}, {}", self.x, self.y)
    }
}

event_payload!(MouseMovedEvent => MouseMoved);

/// Scroll amount in lines. Positive `y_offset` scrolls up.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MouseScrolledEvent {
    pub x_offset: f32,
    pub y_offset: f32,
}

impl fmt::Display for MouseScrolledEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MouseScrolledEvent: {}, {}", self.x_offset, self.y_offset)
    }
}

event_payload!(MouseScrolledEvent => MouseScrolled);

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct MouseButtonPressedEvent {
    pub button: MouseButton,
}

impl fmt::Display for MouseButtonPressedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MouseButtonPressedEvent: {}", self.button)
    }
}

event_payload!(MouseButtonPressedEvent => MouseButtonPressed);

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct MouseButtonReleasedEvent {
    pub button: MouseButton,
}

impl fmt::Display for MouseButtonReleasedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MouseButtonReleasedEvent: {}", self.button)
    }
}

event_payload!(MouseButtonReleasedEvent => MouseButtonReleased);
