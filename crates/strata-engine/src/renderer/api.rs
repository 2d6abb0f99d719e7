use glam::Vec4;

use super::buffer::IndexBuffer;
use super::context::GraphicsContext;

/// How the input assembler groups indices.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum PrimitiveTopology {
    None,
    PointList,
    LineList,
    LineStrip,
    #[default]
    TriangleList,
    TriangleStrip,
}

/// Render state shared by every backend API: clear color and topology.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ApiState {
    pub clear_color: Vec4,
    pub topology: PrimitiveTopology,
}

impl Default for ApiState {
    fn default() -> Self {
        Self {
            clear_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            topology: PrimitiveTopology::TriangleList,
        }
    }
}

/// Backend command surface. Each call acts on the context it is given.
///
/// The clear color and topology are stored here and take effect on the next
/// `clear` / `draw_indexed`.
pub trait RendererApi {
    fn init(&mut self, ctx: &mut dyn GraphicsContext);

    fn shutdown(&mut self, ctx: &mut dyn GraphicsContext);

    fn set_viewport(&mut self, ctx: &mut dyn GraphicsContext, x: u32, y: u32, width: u32, height: u32);

    fn state(&self) -> &ApiState;

    fn state_mut(&mut self) -> &mut ApiState;

    fn set_clear_color(&mut self, color: Vec4) {
        self.state_mut().clear_color = color;
    }

    fn clear(&mut self, ctx: &mut dyn GraphicsContext) {
        ctx.clear(self.state().clear_color);
    }

    fn set_primitive_topology(&mut self, topology: PrimitiveTopology) {
        self.state_mut().topology = topology;
    }

    fn bind_render_target(&mut self, ctx: &mut dyn GraphicsContext) {
        ctx.bind_render_target();
    }

    /// Draws `count` indices from the bound buffers. `count` is already resolved.
    fn draw_indexed(&mut self, ctx: &mut dyn GraphicsContext, index_buffer: &dyn IndexBuffer, count: u32);
}
