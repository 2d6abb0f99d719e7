//! Application shell: configuration, the run loop and the context handed to
//! layers.
//!
//! There is no global application instance. Layers reach engine services
//! through the [`LayerCtx`] passed into each hook.

mod app;
mod assert;
mod config;
mod ctx;
mod debug_ui;

pub use app::{AppState, Application};
#[doc(hidden)]
pub use assert::assert_failed;
pub use config::{AppConfig, GraphicsConfig};
pub use ctx::{AppControl, LayerCtx};
pub use debug_ui::DebugUi;

pub(crate) use ctx::Services;
