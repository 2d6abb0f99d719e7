//! Frame timing.
//!
//! The application loop owns one [`FrameClock`] and ticks it once per loop
//! iteration; the resulting [`FrameTime`] is handed to every layer.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
