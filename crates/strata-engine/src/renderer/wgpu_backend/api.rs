use crate::renderer::api::{ApiState, RendererApi};
use crate::renderer::buffer::IndexBuffer;
use crate::renderer::context::GraphicsContext;

use super::device::{Viewport, WgpuDeviceContext};
use super::resources::device_context;

/// Renderer API half of the wgpu backend. Draws encode against the state
/// bound in [`WgpuDeviceContext`].
#[derive(Debug, Default)]
pub struct WgpuRendererApi {
    state: ApiState,
}

impl RendererApi for WgpuRendererApi {
    fn init(&mut self, ctx: &mut dyn GraphicsContext) {
        self.state = ApiState::default();
        let (width, height) = ctx.size();
        self.set_viewport(ctx, 0, 0, width, height);
    }

    fn shutdown(&mut self, _ctx: &mut dyn GraphicsContext) {}

    fn set_viewport(&mut self, ctx: &mut dyn GraphicsContext, x: u32, y: u32, width: u32, height: u32) {
        if let Some(dc) = device_context(ctx) {
            dc.viewport = Viewport { x, y, width, height };
        }
    }

    fn state(&self) -> &ApiState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ApiState {
        &mut self.state
    }

    fn draw_indexed(&mut self, ctx: &mut dyn GraphicsContext, _index_buffer: &dyn IndexBuffer, count: u32) {
        let topology = self.state.topology;
        if let Some(dc) = device_context(ctx) {
            WgpuDeviceContext::draw_indexed(dc, count, topology);
        }
    }
}
