//! Keyboard and mouse input.
//!
//! Codes are platform-agnostic; the window backend maps native codes onto
//! them. [`InputState`] answers polling queries for the current frame.

mod codes;
mod state;

pub use codes::{KeyCode, MouseButton};
pub use state::InputState;
