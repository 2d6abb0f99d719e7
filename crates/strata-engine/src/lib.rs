//! strata engine crate.
//!
//! A small real-time engine core: a frame loop driving a stack of layers,
//! typed events, and a backend-agnostic renderer (wgpu or headless) with a
//! 2D quad renderer on top.
//!
//! ```no_run
//! use strata_engine::core::{AppConfig, Application};
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut app = Application::new(AppConfig::default().with_title("demo"))?;
//!     app.run();
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod event;
pub mod input;
pub mod layer;
pub mod logging;
pub mod renderer;
pub mod time;
pub mod window;

pub use glam;
