//! Graphics abstraction and the renderers built on it.
//!
//! Layering, bottom to top:
//! - [`GraphicsContext`]: device, swap chain and resource factory for one
//!   window (wgpu or headless, picked by [`create_graphics_context`]).
//! - [`RendererApi`] / [`RenderCommand`]: frame-level commands.
//! - [`Renderer`] / [`Renderer2D`]: scene protocol and quad drawing.

pub mod api;
pub mod buffer;
pub mod camera;
pub mod camera_controller;
pub mod command;
pub mod constant_buffer;
pub mod context;
pub mod headless;
#[allow(clippy::module_inception)]
pub mod renderer;
pub mod renderer_2d;
pub mod resource;
pub mod shader;
pub mod texture;
pub mod wgpu_backend;

pub use api::{ApiState, PrimitiveTopology, RendererApi};
pub use buffer::{BufferElement, BufferLayout, IndexBuffer, ShaderDataType, VertexBuffer};
pub use camera::OrthographicCamera;
pub use camera_controller::OrthographicCameraController;
pub use command::RenderCommand;
pub use constant_buffer::ConstantBuffer;
pub use context::{create_graphics_context, GraphicsApi, GraphicsContext};
pub use renderer::{Renderer, SCENE_SLOT, TEXTURE_SLOT};
pub use renderer_2d::{quad_vertices, Quad, QuadVertex, Renderer2D, Statistics};
pub use resource::{BindSlot, ResourceId};
pub use shader::Shader;
pub use texture::Texture2D;
