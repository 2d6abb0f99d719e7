use std::any::Any;
use std::path::Path;

use anyhow::Result;
use glam::Vec4;

use crate::core::GraphicsConfig;
use crate::window::Window;

use super::api::RendererApi;
use super::buffer::{IndexBuffer, VertexBuffer};
use super::constant_buffer::ConstantBuffer;
use super::headless::HeadlessContext;
use super::resource::{BindSlot, NullShader, NullTexture};
use super::shader::{name_from_path, Shader};
use super::texture::{decode_rgba, Texture2D};
use super::wgpu_backend::WgpuContext;

/// Graphics backend selected at startup.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum GraphicsApi {
    /// Real GPU through wgpu (Vulkan, Metal, DX12 or GL, whichever the
    /// adapter supports).
    #[default]
    Wgpu,
    /// No GPU. Every call is recorded into a [`CommandLog`](super::headless::CommandLog).
    Headless,
}

/// Owns the device and the swap chain of one window.
///
/// Lifecycle: `init` once, any number of frames (`clear` … draws …
/// `swap_buffers`), then `shutdown`. `shutdown` is idempotent and also runs
/// on drop.
///
/// Resources are created through the context and are exclusively owned by
/// the caller. Creating one before `init` is a precondition violation and
/// yields an inert resource.
pub trait GraphicsContext {
    fn api(&self) -> GraphicsApi;

    fn init(&mut self) -> Result<()>;

    fn shutdown(&mut self);

    fn is_initialized(&self) -> bool;

    /// Clears the bound render target.
    fn clear(&mut self, color: Vec4);

    /// Presents the current frame.
    fn swap_buffers(&mut self);

    /// Recreates size-dependent targets. Zero or unchanged sizes are ignored.
    fn on_resize(&mut self, width: u32, height: u32);

    /// Current back-buffer size in pixels.
    fn size(&self) -> (u32, u32);

    fn bind_render_target(&mut self);

    /// Empties a binding point so the next draw cannot reuse what was there.
    fn unbind(&mut self, slot: BindSlot);

    fn set_vsync(&mut self, enabled: bool);

    fn is_vsync(&self) -> bool;

    /// Backend device handle, downcast by backend-specific code.
    fn native_device(&self) -> &dyn Any;

    /// Backend immediate-context state that resources bind into.
    fn native_device_context(&mut self) -> &mut dyn Any;

    fn create_renderer_api(&self) -> Box<dyn RendererApi>;

    fn create_vertex_buffer(&self, data: &[u8]) -> Box<dyn VertexBuffer>;

    /// Vertex buffer of `size` bytes that is refilled with `set_data`.
    fn create_dynamic_vertex_buffer(&self, size: u64) -> Box<dyn VertexBuffer>;

    fn create_index_buffer(&self, indices: &[u32]) -> Box<dyn IndexBuffer>;

    fn create_constant_buffer(&self, size: u64) -> Box<dyn ConstantBuffer>;

    /// Compiles `source`. Failure is logged and yields an invalid shader.
    fn create_shader(&self, name: &str, source: &str) -> Box<dyn Shader>;

    fn create_shader_from_file(&self, path: &Path) -> Box<dyn Shader> {
        let name = name_from_path(path);
        match std::fs::read_to_string(path) {
            Ok(source) => self.create_shader(&name, &source),
            Err(err) => {
                log::error!("failed to read shader {}: {err}", path.display());
                Box::new(NullShader::new(&name))
            }
        }
    }

    /// Blank RGBA8 texture, filled later with `set_data`.
    fn create_texture(&self, width: u32, height: u32) -> Box<dyn Texture2D>;

    /// Decodes an image file. Failure is logged and yields a 0x0 texture.
    fn create_texture_from_file(&self, path: &Path) -> Box<dyn Texture2D> {
        match decode_rgba(path) {
            Ok(image) => {
                let (width, height) = image.dimensions();
                let mut texture = self.create_texture(width, height);
                texture.set_data(image.as_raw());
                log::debug!("loaded texture {} ({width}x{height})", path.display());
                texture
            }
            Err(err) => {
                log::error!("failed to load texture {}: {err}", path.display());
                Box::new(NullTexture)
            }
        }
    }
}

/// Creates the context for `config.api`. Call [`GraphicsContext::init`] next.
pub fn create_graphics_context(
    config: &GraphicsConfig,
    window: &dyn Window,
) -> Box<dyn GraphicsContext> {
    log::info!("creating {:?} graphics context", config.api);
    match config.api {
        GraphicsApi::Wgpu => Box::new(WgpuContext::new(window, config)),
        GraphicsApi::Headless => {
            let mut ctx = HeadlessContext::new(window.width(), window.height());
            ctx.set_vsync(window.is_vsync());
            Box::new(ctx)
        }
    }
}
