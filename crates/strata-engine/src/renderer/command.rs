use anyhow::Result;
use glam::Vec4;

use super::api::{PrimitiveTopology, RendererApi};
use super::buffer::IndexBuffer;
use super::context::GraphicsContext;

/// Owned front door to the active backend: the graphics context plus the
/// renderer API created from it.
///
/// Every frame-level call in the engine goes through here so the pair is
/// always used together.
pub struct RenderCommand {
    // The API is shut down against the context, so it is declared first.
    api: Box<dyn RendererApi>,
    context: Box<dyn GraphicsContext>,
    initialized: bool,
}

impl RenderCommand {
    pub fn new(context: Box<dyn GraphicsContext>) -> Self {
        let api = context.create_renderer_api();
        Self {
            api,
            context,
            initialized: false,
        }
    }

    /// Initializes the context, then the API.
    pub fn init(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }
        self.context.init()?;
        self.api.init(self.context.as_mut());
        self.initialized = true;
        Ok(())
    }

    pub fn shutdown(&mut self) {
        if !self.initialized {
            return;
        }
        self.initialized = false;
        self.api.shutdown(self.context.as_mut());
        self.context.shutdown();
    }

    pub fn set_viewport(&mut self, x: u32, y: u32, width: u32, height: u32) {
        self.api.set_viewport(self.context.as_mut(), x, y, width, height);
    }

    pub fn set_clear_color(&mut self, color: Vec4) {
        self.api.set_clear_color(color);
    }

    pub fn clear_color(&self) -> Vec4 {
        self.api.state().clear_color
    }

    pub fn clear(&mut self) {
        self.api.clear(self.context.as_mut());
    }

    pub fn set_primitive_topology(&mut self, topology: PrimitiveTopology) {
        self.api.set_primitive_topology(topology);
    }

    pub fn primitive_topology(&self) -> PrimitiveTopology {
        self.api.state().topology
    }

    pub fn bind_render_target(&mut self) {
        self.api.bind_render_target(self.context.as_mut());
    }

    /// Draws from the bound buffers. A `count` of 0 draws every index in
    /// `index_buffer`.
    pub fn draw_indexed(&mut self, index_buffer: &dyn IndexBuffer, count: u32) {
        let count = if count == 0 { index_buffer.count() } else { count };
        self.api.draw_indexed(self.context.as_mut(), index_buffer, count);
    }

    pub fn swap_buffers(&mut self) {
        self.context.swap_buffers();
    }

    pub fn on_resize(&mut self, width: u32, height: u32) {
        self.context.on_resize(width, height);
    }

    pub fn set_vsync(&mut self, enabled: bool) {
        self.context.set_vsync(enabled);
    }

    pub fn context(&self) -> &dyn GraphicsContext {
        self.context.as_ref()
    }

    pub fn context_mut(&mut self) -> &mut dyn GraphicsContext {
        self.context.as_mut()
    }
}

impl Drop for RenderCommand {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::headless::{HeadlessContext, RecordedCommand};

    fn command() -> (RenderCommand, crate::renderer::headless::SharedCommandLog) {
        let ctx = HeadlessContext::new(320, 240);
        let log = ctx.log();
        let mut cmd = RenderCommand::new(Box::new(ctx));
        cmd.init().unwrap();
        (cmd, log)
    }

    #[test]
    fn zero_count_draws_every_index() {
        let (mut cmd, log) = command();
        let ib = cmd.context().create_index_buffer(&[0, 1, 2, 2, 3, 0]);
        cmd.draw_indexed(ib.as_ref(), 0);
        cmd.draw_indexed(ib.as_ref(), 3);

        let counts: Vec<u32> = log.borrow().draws().map(|d| d.count).collect();
        assert_eq!(counts, vec![6, 3]);
    }

    #[test]
    fn clear_uses_the_stored_color() {
        let (mut cmd, log) = command();
        let magenta = Vec4::new(1.0, 0.0, 1.0, 1.0);
        cmd.set_clear_color(magenta);
        cmd.clear();
        assert!(log.borrow().contains(&RecordedCommand::Clear(magenta)));
    }

    #[test]
    fn topology_reaches_the_draw() {
        let (mut cmd, log) = command();
        let ib = cmd.context().create_index_buffer(&[0, 1]);
        cmd.set_primitive_topology(PrimitiveTopology::LineList);
        cmd.draw_indexed(ib.as_ref(), 0);
        assert_eq!(
            log.borrow().draws().next().map(|d| d.topology),
            Some(PrimitiveTopology::LineList)
        );
    }

    #[test]
    fn drop_shuts_the_context_down_once() {
        let (mut cmd, log) = command();
        cmd.shutdown();
        drop(cmd);
        assert_eq!(log.borrow().count(|c| *c == RecordedCommand::Shutdown), 1);
    }
}
