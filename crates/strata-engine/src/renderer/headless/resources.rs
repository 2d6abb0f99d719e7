use crate::engine_assert;
use crate::renderer::buffer::{BufferLayout, IndexBuffer, VertexBuffer};
use crate::renderer::constant_buffer::ConstantBuffer;
use crate::renderer::context::GraphicsContext;
use crate::renderer::resource::ResourceId;
use crate::renderer::shader::Shader;
use crate::renderer::texture::{expected_len, Texture2D};

use super::recorder::{RecordedCommand, SharedCommandLog};
use super::HeadlessDeviceContext;

fn device_context(ctx: &mut dyn GraphicsContext) -> Option<&mut HeadlessDeviceContext> {
    let dc = ctx.native_device_context().downcast_mut::<HeadlessDeviceContext>();
    if !engine_assert!(dc.is_some(), "headless resource bound to a foreign graphics context") {
        return None;
    }
    dc
}

pub(super) struct HeadlessVertexBuffer {
    pub(super) id: ResourceId,
    pub(super) log: SharedCommandLog,
    pub(super) size: u64,
    pub(super) dynamic: bool,
    pub(super) layout: BufferLayout,
}

impl VertexBuffer for HeadlessVertexBuffer {
    fn id(&self) -> ResourceId {
        self.id
    }

    fn bind(&self, ctx: &mut dyn GraphicsContext) {
        if let Some(dc) = device_context(ctx) {
            dc.bindings.vertex_buffer = Some(self.id);
            dc.record(RecordedCommand::BindVertexBuffer(self.id));
        }
    }

    fn set_data(&mut self, data: &[u8]) {
        if !engine_assert!(self.dynamic, "set_data on a static vertex buffer") {
            return;
        }
        if !engine_assert!(
            data.len() as u64 <= self.size,
            "vertex upload of {} bytes exceeds capacity {}",
            data.len(),
            self.size
        ) {
            return;
        }
        self.log.borrow_mut().push(RecordedCommand::SetVertexData {
            id: self.id,
            bytes: data.to_vec(),
        });
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    fn layout(&self) -> &BufferLayout {
        &self.layout
    }

    fn set_layout(&mut self, layout: BufferLayout) {
        self.layout = layout;
    }
}

pub(super) struct HeadlessIndexBuffer {
    pub(super) id: ResourceId,
    pub(super) count: u32,
}

impl IndexBuffer for HeadlessIndexBuffer {
    fn id(&self) -> ResourceId {
        self.id
    }

    fn bind(&self, ctx: &mut dyn GraphicsContext) {
        if let Some(dc) = device_context(ctx) {
            dc.bindings.index_buffer = Some(self.id);
            dc.record(RecordedCommand::BindIndexBuffer(self.id));
        }
    }

    fn count(&self) -> u32 {
        self.count
    }
}

pub(super) struct HeadlessConstantBuffer {
    pub(super) id: ResourceId,
    pub(super) log: SharedCommandLog,
    pub(super) size: u64,
}

impl ConstantBuffer for HeadlessConstantBuffer {
    fn id(&self) -> ResourceId {
        self.id
    }

    fn bind(&self, ctx: &mut dyn GraphicsContext, slot: u32) {
        if let Some(dc) = device_context(ctx) {
            dc.bindings.constant_buffers.insert(slot, self.id);
            dc.record(RecordedCommand::BindConstantBuffer { slot, id: self.id });
        }
    }

    fn set_data(&mut self, data: &[u8]) {
        if !engine_assert!(data.len() as u64 <= self.size, "constant upload exceeds buffer size") {
            return;
        }
        self.log.borrow_mut().push(RecordedCommand::SetConstantData {
            id: self.id,
            bytes: data.to_vec(),
        });
    }

    fn size(&self) -> u64 {
        self.size
    }
}

pub(super) struct HeadlessShader {
    pub(super) id: ResourceId,
    pub(super) name: String,
}

impl Shader for HeadlessShader {
    fn id(&self) -> ResourceId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn bind(&self, ctx: &mut dyn GraphicsContext) {
        if let Some(dc) = device_context(ctx) {
            dc.bindings.shader = Some(self.id);
            dc.record(RecordedCommand::BindShader(self.id));
        }
    }

    fn is_valid(&self) -> bool {
        true
    }
}

pub(super) struct HeadlessTexture {
    pub(super) id: ResourceId,
    pub(super) log: SharedCommandLog,
    pub(super) width: u32,
    pub(super) height: u32,
}

impl Texture2D for HeadlessTexture {
    fn id(&self) -> ResourceId {
        self.id
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn bind(&self, ctx: &mut dyn GraphicsContext, slot: u32) {
        if let Some(dc) = device_context(ctx) {
            dc.bindings.textures.insert(slot, self.id);
            dc.record(RecordedCommand::BindTexture { slot, id: self.id });
        }
    }

    fn set_data(&mut self, data: &[u8]) {
        let expected = expected_len(self.width, self.height);
        if !engine_assert!(
            data.len() == expected,
            "texture data must be {expected} bytes, got {}",
            data.len()
        ) {
            return;
        }
        self.log.borrow_mut().push(RecordedCommand::SetTextureData {
            id: self.id,
            bytes: data.to_vec(),
        });
    }
}
