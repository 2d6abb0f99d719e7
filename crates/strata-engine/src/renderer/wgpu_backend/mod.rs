//! wgpu backend: a window surface, one device and an immediate-style
//! binding model layered over render passes.
//!
//! Each `clear` and draw records its own pass against the acquired swap
//! chain image; `swap_buffers` presents it. Pipelines are built lazily per
//! (shader, vertex layout, topology).

mod api;
mod context;
mod conversions;
mod device;
mod resources;

pub use api::WgpuRendererApi;
pub use context::WgpuContext;
pub use device::{GpuShared, WgpuDeviceContext};
