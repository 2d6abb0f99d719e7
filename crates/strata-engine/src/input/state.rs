use std::collections::HashSet;

use crate::event::{Event, EventKind};

use super::codes::{KeyCode, MouseButton};

/// Polled keyboard and mouse state.
///
/// The application feeds every incoming event through [`InputState::apply_event`]
/// before layers see it, so a layer's `on_update` can ask "is W held?" without
/// tracking key events itself.
#[derive(Debug)]
pub struct InputState {
    keys_down: HashSet<KeyCode>,
    buttons_down: HashSet<MouseButton>,
    mouse_position: (f32, f32),
    focused: bool,
}

impl Default for InputState {
    fn default() -> Self {
        Self {
            keys_down: HashSet::new(),
            buttons_down: HashSet::new(),
            mouse_position: (0.0, 0.0),
            focused: true,
        }
    }
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_event(&mut self, event: &Event) {
        match event.kind() {
            EventKind::KeyPressed(e) => {
                self.keys_down.insert(e.key);
            }
            EventKind::KeyReleased(e) => {
                self.keys_down.remove(&e.key);
            }
            EventKind::MouseButtonPressed(e) => {
                self.buttons_down.insert(e.button);
            }
            EventKind::MouseButtonReleased(e) => {
                self.buttons_down.remove(&e.button);
            }
            EventKind::MouseMoved(e) => {
                self.mouse_position = (e.x, e.y);
            }
            EventKind::WindowFocus(_) => {
                self.focused = true;
            }
            EventKind::WindowLostFocus(_) => {
                // Releases are not delivered to an unfocused window.
                self.focused = false;
                self.keys_down.clear();
                self.buttons_down.clear();
            }
            _ => {}
        }
    }

    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keys_down.contains(&key)
    }

    pub fn is_mouse_button_pressed(&self, button: MouseButton) -> bool {
        self.buttons_down.contains(&button)
    }

    /// Last cursor position in client-area pixels.
    pub fn mouse_position(&self) -> (f32, f32) {
        self.mouse_position
    }

    pub fn mouse_x(&self) -> f32 {
        self.mouse_position.0
    }

    pub fn mouse_y(&self) -> f32 {
        self.mouse_position.1
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{
        KeyPressedEvent, KeyReleasedEvent, MouseButtonPressedEvent, MouseMovedEvent,
        WindowLostFocusEvent,
    };

    fn feed(state: &mut InputState, event: impl Into<Event>) {
        state.apply_event(&event.into());
    }

    #[test]
    fn key_press_and_release_toggle_state() {
        let mut input = InputState::new();
        feed(&mut input, KeyPressedEvent { key: KeyCode::W, repeat: false });
        assert!(input.is_key_pressed(KeyCode::W));
        assert!(!input.is_key_pressed(KeyCode::S));

        feed(&mut input, KeyReleasedEvent { key: KeyCode::W });
        assert!(!input.is_key_pressed(KeyCode::W));
    }

    #[test]
    fn mouse_position_tracks_moves() {
        let mut input = InputState::new();
        feed(&mut input, MouseMovedEvent { x: 12.5, y: 40.0 });
        assert_eq!(input.mouse_position(), (12.5, 40.0));
        assert_eq!(input.mouse_x(), 12.5);
        assert_eq!(input.mouse_y(), 40.0);
    }

    #[test]
    fn focus_loss_releases_everything() {
        let mut input = InputState::new();
        feed(&mut input, KeyPressedEvent { key: KeyCode::A, repeat: false });
        feed(&mut input, MouseButtonPressedEvent { button: MouseButton::LEFT });
        feed(&mut input, WindowLostFocusEvent);

        assert!(!input.is_focused());
        assert!(!input.is_key_pressed(KeyCode::A));
        assert!(!input.is_mouse_button_pressed(MouseButton::LEFT));
    }
}
