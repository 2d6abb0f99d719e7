use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, MouseButton as WinitMouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode as WinitKeyCode, PhysicalKey};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::WindowId;

use crate::event::{
    Event, EventType, KeyPressedEvent, KeyReleasedEvent, KeyTypedEvent, MouseButtonPressedEvent,
    MouseButtonReleasedEvent, MouseMovedEvent, MouseScrolledEvent, WindowCloseEvent,
    WindowFocusEvent, WindowLostFocusEvent, WindowResizeEvent,
};
use crate::input::{KeyCode, MouseButton};

use super::{NativeWindow, Window, WindowProps};

/// Pixels per scroll "line" when the platform reports pixel deltas.
const PIXELS_PER_LINE: f32 = 40.0;

/// Pumps allowed for the platform to deliver `resumed`.
const STARTUP_PUMPS: usize = 64;

/// Desktop window on top of a pumped `winit` event loop.
///
/// The loop is never handed over with `run_app`; each
/// [`Window::poll_events`] pumps it once with a zero timeout, so the engine
/// keeps ownership of the frame loop.
pub struct WinitWindow {
    event_loop: EventLoop<()>,
    handler: Handler,
}

struct Handler {
    props: WindowProps,
    window: Option<Arc<winit::window::Window>>,
    pending: Vec<Event>,
    creation_error: Option<anyhow::Error>,
    close_queued: bool,
    exited: bool,
}

impl Handler {
    fn new(props: &WindowProps) -> Self {
        Self {
            props: props.clone(),
            window: None,
            pending: Vec::new(),
            creation_error: None,
            close_queued: false,
            exited: false,
        }
    }

    fn queue(&mut self, event: &WindowEvent) {
        let pending = &mut self.pending;
        let close_queued = &mut self.close_queued;
        translate_window_event(event, &mut |e| {
            if e.event_type() == EventType::WindowClose {
                *close_queued = true;
            }
            pending.push(e);
        });
    }

    /// The loop stopped. Reported as a close unless one is already queued.
    fn loop_exited(&mut self) {
        self.exited = true;
        if !self.close_queued {
            self.close_queued = true;
            self.pending.push(WindowCloseEvent.into());
        }
    }
}

impl WinitWindow {
    pub fn new(props: &WindowProps) -> Result<Self> {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut window = Self {
            event_loop,
            handler: Handler::new(props),
        };

        // The native window can only be created once the loop is resumed.
        for _ in 0..STARTUP_PUMPS {
            if window.handler.window.is_some() {
                break;
            }
            if let PumpStatus::Exit(code) = window
                .event_loop
                .pump_app_events(Some(Duration::from_millis(1)), &mut window.handler)
            {
                anyhow::bail!("event loop exited with code {code} during window creation");
            }
            if let Some(err) = window.handler.creation_error.take() {
                return Err(err);
            }
        }
        anyhow::ensure!(window.handler.window.is_some(), "window was never created");

        log::info!(
            "created window '{}' ({}x{})",
            props.title,
            window.width(),
            window.height()
        );
        Ok(window)
    }

    fn inner_size(&self) -> PhysicalSize<u32> {
        self.handler
            .window
            .as_ref()
            .map(|w| w.inner_size())
            .unwrap_or_else(|| PhysicalSize::new(self.handler.props.width, self.handler.props.height))
    }
}

impl Window for WinitWindow {
    fn title(&self) -> &str {
        &self.handler.props.title
    }

    fn width(&self) -> u32 {
        self.inner_size().width
    }

    fn height(&self) -> u32 {
        self.inner_size().height
    }

    fn poll_events(&mut self, callback: &mut dyn FnMut(Event)) {
        if !self.handler.exited {
            let status = self
                .event_loop
                .pump_app_events(Some(Duration::ZERO), &mut self.handler);
            if let PumpStatus::Exit(code) = status {
                log::debug!("winit event loop exited with code {code}");
                self.handler.loop_exited();
            }
        }

        for event in self.handler.pending.drain(..) {
            callback(event);
        }
    }

    fn native_window(&self) -> Option<Arc<dyn NativeWindow>> {
        self.handler
            .window
            .clone()
            .map(|w| w as Arc<dyn NativeWindow>)
    }

    fn set_vsync(&mut self, enabled: bool) {
        self.handler.props.vsync = enabled;
    }

    fn is_vsync(&self) -> bool {
        self.handler.props.vsync
    }
}

impl ApplicationHandler for Handler {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = winit::window::Window::default_attributes()
            .with_title(self.props.title.clone())
            .with_inner_size(PhysicalSize::new(self.props.width, self.props.height));

        match event_loop.create_window(attrs) {
            Ok(window) => self.window = Some(Arc::new(window)),
            Err(e) => {
                self.creation_error = Some(anyhow::Error::new(e).context("failed to create window"));
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let WindowEvent::CloseRequested = event {
            event_loop.exit();
        }
        self.queue(&event);
    }
}

/// Maps one winit event onto zero or more engine events.
fn translate_window_event(event: &WindowEvent, emit: &mut dyn FnMut(Event)) {
    match event {
        WindowEvent::CloseRequested => emit(WindowCloseEvent.into()),

        WindowEvent::Resized(size) => emit(
            WindowResizeEvent {
                width: size.width,
                height: size.height,
            }
            .into(),
        ),

        WindowEvent::Focused(true) => emit(WindowFocusEvent.into()),
        WindowEvent::Focused(false) => emit(WindowLostFocusEvent.into()),

        WindowEvent::KeyboardInput { event, .. } => {
            let key = map_key(event.physical_key);
            match event.state {
                ElementState::Pressed => {
                    emit(KeyPressedEvent { key, repeat: event.repeat }.into());
                    if let Some(text) = &event.text {
                        for character in text.chars().filter(|c| !c.is_control()) {
                            emit(KeyTypedEvent { character }.into());
                        }
                    }
                }
                ElementState::Released => emit(KeyReleasedEvent { key }.into()),
            }
        }

        WindowEvent::CursorMoved { position, .. } => emit(
            MouseMovedEvent {
                x: position.x as f32,
                y: position.y as f32,
            }
            .into(),
        ),

        WindowEvent::MouseWheel { delta, .. } => {
            let (x_offset, y_offset) = match delta {
                MouseScrollDelta::LineDelta(x, y) => (*x, *y),
                MouseScrollDelta::PixelDelta(p) => {
                    (p.x as f32 / PIXELS_PER_LINE, p.y as f32 / PIXELS_PER_LINE)
                }
            };
            emit(MouseScrolledEvent { x_offset, y_offset }.into());
        }

        WindowEvent::MouseInput { state, button, .. } => {
            let Some(button) = map_mouse_button(*button) else {
                return;
            };
            match state {
                ElementState::Pressed => emit(MouseButtonPressedEvent { button }.into()),
                ElementState::Released => emit(MouseButtonReleasedEvent { button }.into()),
            }
        }

        _ => {}
    }
}

fn map_mouse_button(button: WinitMouseButton) -> Option<MouseButton> {
    match button {
        WinitMouseButton::Left => Some(MouseButton::LEFT),
        WinitMouseButton::Right => Some(MouseButton::RIGHT),
        WinitMouseButton::Middle => Some(MouseButton::MIDDLE),
        WinitMouseButton::Back => Some(MouseButton::BUTTON_3),
        WinitMouseButton::Forward => Some(MouseButton::BUTTON_4),
        WinitMouseButton::Other(n) => u8::try_from(n).ok().and_then(MouseButton::new),
    }
}

fn map_key(key: PhysicalKey) -> KeyCode {
    let code = match key {
        PhysicalKey::Code(code) => code,
        PhysicalKey::Unidentified(_) => return KeyCode::Unknown(0),
    };

    match code {
        WinitKeyCode::Space => KeyCode::Space,
        WinitKeyCode::Quote => KeyCode::Apostrophe,
        WinitKeyCode::Comma => KeyCode::Comma,
        WinitKeyCode::Minus => KeyCode::Minus,
        WinitKeyCode::Period => KeyCode::Period,
        WinitKeyCode::Slash => KeyCode::Slash,
        WinitKeyCode::Semicolon => KeyCode::Semicolon,
        WinitKeyCode::Equal => KeyCode::Equal,
        WinitKeyCode::BracketLeft => KeyCode::LeftBracket,
        WinitKeyCode::Backslash => KeyCode::Backslash,
        WinitKeyCode::BracketRight => KeyCode::RightBracket,
        WinitKeyCode::Backquote => KeyCode::GraveAccent,

        WinitKeyCode::Digit0 => KeyCode::Digit0,
        WinitKeyCode::Digit1 => KeyCode::Digit1,
        WinitKeyCode::Digit2 => KeyCode::Digit2,
        WinitKeyCode::Digit3 => KeyCode::Digit3,
        WinitKeyCode::Digit4 => KeyCode::Digit4,
        WinitKeyCode::Digit5 => KeyCode::Digit5,
        WinitKeyCode::Digit6 => KeyCode::Digit6,
        WinitKeyCode::Digit7 => KeyCode::Digit7,
        WinitKeyCode::Digit8 => KeyCode::Digit8,
        WinitKeyCode::Digit9 => KeyCode::Digit9,

        WinitKeyCode::KeyA => KeyCode::A,
        WinitKeyCode::KeyB => KeyCode::B,
        WinitKeyCode::KeyC => KeyCode::C,
        WinitKeyCode::KeyD => KeyCode::D,
        WinitKeyCode::KeyE => KeyCode::E,
        WinitKeyCode::KeyF => KeyCode::F,
        WinitKeyCode::KeyG => KeyCode::G,
        WinitKeyCode::KeyH => KeyCode::H,
        WinitKeyCode::KeyI => KeyCode::I,
        WinitKeyCode::KeyJ => KeyCode::J,
        WinitKeyCode::KeyK => KeyCode::K,
        WinitKeyCode::KeyL => KeyCode::L,
        WinitKeyCode::KeyM => KeyCode::M,
        WinitKeyCode::KeyN => KeyCode::N,
        WinitKeyCode::KeyO => KeyCode::O,
        WinitKeyCode::KeyP => KeyCode::P,
        WinitKeyCode::KeyQ => KeyCode::Q,
        WinitKeyCode::KeyR => KeyCode::R,
        WinitKeyCode::KeyS => KeyCode::S,
        WinitKeyCode::KeyT => KeyCode::T,
        WinitKeyCode::KeyU => KeyCode::U,
        WinitKeyCode::KeyV => KeyCode::V,
        WinitKeyCode::KeyW => KeyCode::W,
        WinitKeyCode::KeyX => KeyCode::X,
        WinitKeyCode::KeyY => KeyCode::Y,
        WinitKeyCode::KeyZ => KeyCode::Z,

        WinitKeyCode::Escape => KeyCode::Escape,
        WinitKeyCode::Enter => KeyCode::Enter,
        WinitKeyCode::Tab => KeyCode::Tab,
        WinitKeyCode::Backspace => KeyCode::Backspace,
        WinitKeyCode::Insert => KeyCode::Insert,
        WinitKeyCode::Delete => KeyCode::Delete,
        WinitKeyCode::ArrowRight => KeyCode::Right,
        WinitKeyCode::ArrowLeft => KeyCode::Left,
        WinitKeyCode::ArrowDown => KeyCode::Down,
        WinitKeyCode::ArrowUp => KeyCode::Up,
        WinitKeyCode::PageUp => KeyCode::PageUp,
        WinitKeyCode::PageDown => KeyCode::PageDown,
        WinitKeyCode::Home => KeyCode::Home,
        WinitKeyCode::End => KeyCode::End,
        WinitKeyCode::CapsLock => KeyCode::CapsLock,
        WinitKeyCode::ScrollLock => KeyCode::ScrollLock,
        WinitKeyCode::NumLock => KeyCode::NumLock,
        WinitKeyCode::PrintScreen => KeyCode::PrintScreen,
        WinitKeyCode::Pause => KeyCode::Pause,

        WinitKeyCode::F1 => KeyCode::F1,
        WinitKeyCode::F2 => KeyCode::F2,
        WinitKeyCode::F3 => KeyCode::F3,
        WinitKeyCode::F4 => KeyCode::F4,
        WinitKeyCode::F5 => KeyCode::F5,
        WinitKeyCode::F6 => KeyCode::F6,
        WinitKeyCode::F7 => KeyCode::F7,
        WinitKeyCode::F8 => KeyCode::F8,
        WinitKeyCode::F9 => KeyCode::F9,
        WinitKeyCode::F10 => KeyCode::F10,
        WinitKeyCode::F11 => KeyCode::F11,
        WinitKeyCode::F12 => KeyCode::F12,

        WinitKeyCode::Numpad0 => KeyCode::Kp0,
        WinitKeyCode::Numpad1 => KeyCode::Kp1,
        WinitKeyCode::Numpad2 => KeyCode::Kp2,
        WinitKeyCode::Numpad3 => KeyCode::Kp3,
        WinitKeyCode::Numpad4 => KeyCode::Kp4,
        WinitKeyCode::Numpad5 => KeyCode::Kp5,
        WinitKeyCode::Numpad6 => KeyCode::Kp6,
        WinitKeyCode::Numpad7 => KeyCode::Kp7,
        WinitKeyCode::Numpad8 => KeyCode::Kp8,
        WinitKeyCode::Numpad9 => KeyCode::Kp9,
        WinitKeyCode::NumpadDecimal => KeyCode::KpDecimal,
        WinitKeyCode::NumpadDivide => KeyCode::KpDivide,
        WinitKeyCode::NumpadMultiply => KeyCode::KpMultiply,
        WinitKeyCode::NumpadSubtract => KeyCode::KpSubtract,
        WinitKeyCode::NumpadAdd => KeyCode::KpAdd,
        WinitKeyCode::NumpadEnter => KeyCode::KpEnter,

        WinitKeyCode::ShiftLeft => KeyCode::LeftShift,
        WinitKeyCode::ControlLeft => KeyCode::LeftControl,
        WinitKeyCode::AltLeft => KeyCode::LeftAlt,
        WinitKeyCode::SuperLeft => KeyCode::LeftSuper,
        WinitKeyCode::ShiftRight => KeyCode::RightShift,
        WinitKeyCode::ControlRight => KeyCode::RightControl,
        WinitKeyCode::AltRight => KeyCode::RightAlt,
        WinitKeyCode::SuperRight => KeyCode::RightSuper,
        WinitKeyCode::ContextMenu => KeyCode::Menu,

        other => KeyCode::Unknown(other as u32),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translate(event: WindowEvent) -> Vec<Event> {
        let mut out = Vec::new();
        translate_window_event(&event, &mut |e| out.push(e));
        out
    }

    #[test]
    fn resize_and_close_translate() {
        let events = translate(WindowEvent::Resized(PhysicalSize::new(800, 600)));
        assert_eq!(events, vec![Event::from(WindowResizeEvent { width: 800, height: 600 })]);

        let events = translate(WindowEvent::CloseRequested);
        assert_eq!(events[0].event_type(), EventType::WindowClose);
    }

    #[test]
    fn close_request_then_loop_exit_yields_one_close() {
        let mut handler = Handler::new(&WindowProps::default());
        handler.queue(&WindowEvent::CloseRequested);
        handler.loop_exited();

        let closes = handler
            .pending
            .iter()
            .filter(|e| e.event_type() == EventType::WindowClose)
            .count();
        assert_eq!(closes, 1);
        assert!(handler.exited);
    }

    #[test]
    fn loop_exit_alone_is_reported_as_close() {
        let mut handler = Handler::new(&WindowProps::default());
        handler.loop_exited();
        assert_eq!(handler.pending.len(), 1);
        assert_eq!(handler.pending[0].event_type(), EventType::WindowClose);
    }

    #[test]
    fn focus_changes_translate() {
        assert_eq!(translate(WindowEvent::Focused(true))[0].event_type(), EventType::WindowFocus);
        assert_eq!(
            translate(WindowEvent::Focused(false))[0].event_type(),
            EventType::WindowLostFocus
        );
    }

    #[test]
    fn physical_keys_map_to_engine_codes() {
        assert_eq!(map_key(PhysicalKey::Code(WinitKeyCode::KeyW)), KeyCode::W);
        assert_eq!(map_key(PhysicalKey::Code(WinitKeyCode::ArrowLeft)), KeyCode::Left);
        assert_eq!(map_key(PhysicalKey::Code(WinitKeyCode::Numpad5)), KeyCode::Kp5);
        assert!(matches!(
            map_key(PhysicalKey::Code(WinitKeyCode::F24)),
            KeyCode::Unknown(_)
        ));
    }

    #[test]
    fn mouse_buttons_map_to_indices() {
        assert_eq!(map_mouse_button(WinitMouseButton::Left), Some(MouseButton::LEFT));
        assert_eq!(map_mouse_button(WinitMouseButton::Forward), Some(MouseButton::BUTTON_4));
        assert_eq!(map_mouse_button(WinitMouseButton::Other(7)), Some(MouseButton::BUTTON_7));
        assert_eq!(map_mouse_button(WinitMouseButton::Other(300)), None);
    }

    #[test]
    fn pixel_scroll_is_scaled_to_lines() {
        let events = translate(WindowEvent::MouseWheel {
            // SAFETY: the id is only compared, never handed back to the platform.
            device_id: unsafe { winit::event::DeviceId::dummy() },
            delta: MouseScrollDelta::PixelDelta(winit::dpi::PhysicalPosition::new(0.0, 80.0)),
            phase: winit::event::TouchPhase::Moved,
        });
        assert_eq!(
            events,
            vec![Event::from(MouseScrolledEvent { x_offset: 0.0, y_offset: 2.0 })]
        );
    }
}
