//! Platform windows.
//!
//! A [`Window`] owns the native message pump and reports everything it sees
//! as engine [`Event`](crate::event::Event)s. The graphics backend reaches the
//! native surface through [`Window::native_window`].

mod headless;
mod props;
mod winit_window;

use std::sync::Arc;

use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

use crate::event::Event;

pub use headless::{EventInjector, HeadlessWindow};
pub use props::WindowProps;
pub use winit_window::WinitWindow;

/// Handle a graphics backend can build a surface from.
pub trait NativeWindow: HasWindowHandle + HasDisplayHandle + Send + Sync {}

impl<T> NativeWindow for T where T: HasWindowHandle + HasDisplayHandle + Send + Sync {}

pub trait Window {
    fn title(&self) -> &str;

    /// Client-area width in physical pixels.
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Drains pending OS messages, translating each into an event for
    /// `callback`. Never blocks.
    fn poll_events(&mut self, callback: &mut dyn FnMut(Event));

    /// `None` for windows without a native surface.
    fn native_window(&self) -> Option<Arc<dyn NativeWindow>>;

    fn set_vsync(&mut self, enabled: bool);

    fn is_vsync(&self) -> bool;
}
