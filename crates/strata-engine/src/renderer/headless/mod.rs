//! Recording backend with no GPU.
//!
//! Every context call, resource upload, binding and draw lands in a shared
//! [`CommandLog`]. Used for tests and for running layers on machines without
//! a display.

mod recorder;
mod resources;

use std::any::Any;

use anyhow::Result;
use glam::Vec4;

use crate::engine_assert;

use super::api::{ApiState, RendererApi};
use super::buffer::{BufferLayout, IndexBuffer, VertexBuffer};
use super::constant_buffer::ConstantBuffer;
use super::context::{GraphicsApi, GraphicsContext};
use super::resource::{
    BindSlot, NullConstantBuffer, NullIndexBuffer, NullShader, NullTexture, NullVertexBuffer, ResourceId,
};
use super::shader::{missing_entry_points, Shader};
use super::texture::Texture2D;

pub use recorder::{Bindings, CommandLog, DrawCall, RecordedCommand, SharedCommandLog};

use resources::{
    HeadlessConstantBuffer, HeadlessIndexBuffer, HeadlessShader, HeadlessTexture,
    HeadlessVertexBuffer,
};

/// Bound pipeline state, reached through [`GraphicsContext::native_device_context`].
pub struct HeadlessDeviceContext {
    log: SharedCommandLog,
    bindings: Bindings,
}

impl HeadlessDeviceContext {
    fn record(&self, command: RecordedCommand) {
        self.log.borrow_mut().push(command);
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }
}

pub struct HeadlessContext {
    device: HeadlessDeviceContext,
    initialized: bool,
    size: (u32, u32),
    vsync: bool,
}

impl HeadlessContext {
    /// Context whose log keeps the last [`CommandLog::DEFAULT_LIMIT`] commands.
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_log(CommandLog::bounded(CommandLog::DEFAULT_LIMIT), width, height)
    }

    /// Records into an existing log so callers can inspect it afterwards.
    pub fn with_log(log: SharedCommandLog, width: u32, height: u32) -> Self {
        Self {
            device: HeadlessDeviceContext {
                log,
                bindings: Bindings::default(),
            },
            initialized: false,
            size: (width, height),
            vsync: true,
        }
    }

    pub fn log(&self) -> SharedCommandLog {
        self.device.log.clone()
    }

    fn record(&self, command: RecordedCommand) {
        self.device.record(command);
    }

    fn ready(&self, what: &str) -> bool {
        engine_assert!(self.initialized, "{what} created before GraphicsContext::init")
    }
}

impl GraphicsContext for HeadlessContext {
    fn api(&self) -> GraphicsApi {
        GraphicsApi::Headless
    }

    fn init(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }
        self.initialized = true;
        self.record(RecordedCommand::Init);
        log::info!("headless graphics context initialized ({}x{})", self.size.0, self.size.1);
        Ok(())
    }

    fn shutdown(&mut self) {
        if !self.initialized {
            return;
        }
        self.initialized = false;
        self.device.bindings = Bindings::default();
        self.record(RecordedCommand::Shutdown);
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn clear(&mut self, color: Vec4) {
        self.record(RecordedCommand::Clear(color));
    }

    fn swap_buffers(&mut self) {
        self.record(RecordedCommand::SwapBuffers);
    }

    fn on_resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 || (width, height) == self.size {
            return;
        }
        self.size = (width, height);
        self.record(RecordedCommand::Resize { width, height });
        self.record(RecordedCommand::SetViewport { x: 0, y: 0, width, height });
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn bind_render_target(&mut self) {
        self.record(RecordedCommand::BindRenderTarget);
    }

    fn unbind(&mut self, slot: BindSlot) {
        self.device.bindings.clear_slot(slot);
        self.record(RecordedCommand::Unbind(slot));
    }

    fn set_vsync(&mut self, enabled: bool) {
        self.vsync = enabled;
        self.record(RecordedCommand::SetVsync(enabled));
    }

    fn is_vsync(&self) -> bool {
        self.vsync
    }

    fn native_device(&self) -> &dyn Any {
        &self.device.log
    }

    fn native_device_context(&mut self) -> &mut dyn Any {
        &mut self.device
    }

    fn create_renderer_api(&self) -> Box<dyn RendererApi> {
        Box::new(HeadlessRendererApi::default())
    }

    fn create_vertex_buffer(&self, data: &[u8]) -> Box<dyn VertexBuffer> {
        if !self.ready("vertex buffer") {
            return Box::new(NullVertexBuffer::default());
        }
        let id = ResourceId::next();
        let size = data.len() as u64;
        self.record(RecordedCommand::CreateVertexBuffer { id, size, dynamic: false });
        Box::new(HeadlessVertexBuffer {
            id,
            log: self.log(),
            size,
            dynamic: false,
            layout: BufferLayout::default(),
        })
    }

    fn create_dynamic_vertex_buffer(&self, size: u64) -> Box<dyn VertexBuffer> {
        if !self.ready("vertex buffer") {
            return Box::new(NullVertexBuffer::default());
        }
        let id = ResourceId::next();
        self.record(RecordedCommand::CreateVertexBuffer { id, size, dynamic: true });
        Box::new(HeadlessVertexBuffer {
            id,
            log: self.log(),
            size,
            dynamic: true,
            layout: BufferLayout::default(),
        })
    }

    fn create_index_buffer(&self, indices: &[u32]) -> Box<dyn IndexBuffer> {
        if !self.ready("index buffer") {
            return Box::new(NullIndexBuffer);
        }
        let id = ResourceId::next();
        let count = indices.len() as u32;
        self.record(RecordedCommand::CreateIndexBuffer { id, count });
        Box::new(HeadlessIndexBuffer { id, count })
    }

    fn create_constant_buffer(&self, size: u64) -> Box<dyn ConstantBuffer> {
        if !self.ready("constant buffer") {
            return Box::new(NullConstantBuffer);
        }
        let id = ResourceId::next();
        self.record(RecordedCommand::CreateConstantBuffer { id, size });
        Box::new(HeadlessConstantBuffer { id, log: self.log(), size })
    }

    fn create_shader(&self, name: &str, source: &str) -> Box<dyn Shader> {
        if !self.ready("shader") {
            return Box::new(NullShader::new(name));
        }
        let missing = missing_entry_points(source);
        if !missing.is_empty() {
            log::error!("shader '{name}' failed to compile: missing entry points {missing:?}");
            return Box::new(NullShader::new(name));
        }
        let id = ResourceId::next();
        self.record(RecordedCommand::CreateShader { id, name: name.to_string() });
        Box::new(HeadlessShader { id, name: name.to_string() })
    }

    fn create_texture(&self, width: u32, height: u32) -> Box<dyn Texture2D> {
        if !self.ready("texture") || width == 0 || height == 0 {
            return Box::new(NullTexture);
        }
        let id = ResourceId::next();
        self.record(RecordedCommand::CreateTexture { id, width, height });
        Box::new(HeadlessTexture { id, log: self.log(), width, height })
    }
}

impl Drop for HeadlessContext {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Renderer API half of the headless backend.
#[derive(Debug, Default)]
pub struct HeadlessRendererApi {
    state: ApiState,
}

fn device_context(ctx: &mut dyn GraphicsContext) -> Option<&mut HeadlessDeviceContext> {
    ctx.native_device_context().downcast_mut::<HeadlessDeviceContext>()
}

impl RendererApi for HeadlessRendererApi {
    fn init(&mut self, _ctx: &mut dyn GraphicsContext) {
        self.state = ApiState::default();
    }

    fn shutdown(&mut self, _ctx: &mut dyn GraphicsContext) {}

    fn set_viewport(&mut self, ctx: &mut dyn GraphicsContext, x: u32, y: u32, width: u32, height: u32) {
        if let Some(dc) = device_context(ctx) {
            dc.record(RecordedCommand::SetViewport { x, y, width, height });
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
        let Some(dc) = device_context(ctx) else {
            log::error!("headless renderer api used with a foreign graphics context");
            return;
        };
        let draw = DrawCall {
            count,
            topology,
            bindings: dc.bindings.clone(),
        };
        dc.record(RecordedCommand::DrawIndexed(draw));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready() -> HeadlessContext {
        let mut ctx = HeadlessContext::new(640, 480);
        ctx.init().unwrap();
        ctx
    }

    // ── lifecycle ─────────────────────────────────────────────────────────

    #[test]
    fn shutdown_is_idempotent() {
        let mut ctx = ready();
        let log = ctx.log();
        ctx.shutdown();
        ctx.shutdown();
        drop(ctx);
        assert_eq!(log.borrow().count(|c| *c == RecordedCommand::Shutdown), 1);
    }

    #[test]
    fn zero_and_unchanged_resizes_are_ignored() {
        let mut ctx = ready();
        let log = ctx.log();
        ctx.on_resize(0, 300);
        ctx.on_resize(640, 0);
        ctx.on_resize(640, 480);
        assert_eq!(log.borrow().count(|c| matches!(c, RecordedCommand::Resize { .. })), 0);

        ctx.on_resize(800, 600);
        assert!(log.borrow().contains(&RecordedCommand::Resize { width: 800, height: 600 }));
        assert_eq!(ctx.size(), (800, 600));
    }

    // ── resources ─────────────────────────────────────────────────────────

    #[test]
    #[should_panic(expected = "created before GraphicsContext::init")]
    fn creating_before_init_is_a_precondition_violation() {
        let ctx = HeadlessContext::new(1, 1);
        let _ = ctx.create_index_buffer(&[0, 1, 2]);
    }

    #[test]
    fn bindings_are_captured_by_draws() {
        let mut ctx = ready();
        let log = ctx.log();
        let mut api = ctx.create_renderer_api();

        let ib = ctx.create_index_buffer(&[0, 1, 2]);
        let tex = ctx.create_texture(1, 1);
        ib.bind(&mut ctx);
        tex.bind(&mut ctx, 0);
        api.draw_indexed(&mut ctx, ib.as_ref(), 3);

        let log = log.borrow();
        let draw = log.draws().next().unwrap();
        assert_eq!(draw.count, 3);
        assert_eq!(draw.bindings.index_buffer, Some(ib.id()));
        assert_eq!(draw.bindings.textures.get(&0), Some(&tex.id()));
    }

    #[test]
    fn shader_without_entry_points_is_invalid() {
        let ctx = ready();
        let shader = ctx.create_shader("broken", "fn main() {}");
        assert!(!shader.is_valid());
        assert!(ctx.create_shader("ok", "fn vs_main() {} fn fs_main() {}").is_valid());
    }

    #[test]
    fn missing_texture_file_yields_empty_texture() {
        let ctx = ready();
        let tex = ctx.create_texture_from_file(std::path::Path::new("missing/texture.png"));
        assert!(!tex.is_loaded());
        assert_eq!((tex.width(), tex.height()), (0, 0));
    }
}
