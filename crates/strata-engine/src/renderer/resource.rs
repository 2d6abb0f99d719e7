//! Resource identity and the inert resources handed out after a failure.

use std::sync::atomic::{AtomicU64, Ordering};

use super::buffer::{BufferLayout, IndexBuffer, VertexBuffer};
use super::constant_buffer::ConstantBuffer;
use super::context::GraphicsContext;
use super::shader::Shader;
use super::texture::Texture2D;

/// Process-unique identity of a GPU resource. `NULL` marks an inert resource.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ResourceId(u64);

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

impl ResourceId {
    pub const NULL: Self = Self(0);

    pub(crate) fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn is_null(self) -> bool {
        self == Self::NULL
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// A pipeline binding point.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BindSlot {
    Shader,
    VertexBuffer,
    IndexBuffer,
    ConstantBuffer(u32),
    Texture(u32),
}

// Binding a null resource empties its slot and uploads are ignored, so a
// failed creation yields an empty draw instead of a crash or a stale binding.

#[derive(Debug, Default)]
pub(crate) struct NullVertexBuffer {
    layout: BufferLayout,
}

impl VertexBuffer for NullVertexBuffer {
    fn id(&self) -> ResourceId {
        ResourceId::NULL
    }
    fn bind(&self, ctx: &mut dyn GraphicsContext) {
        ctx.unbind(BindSlot::VertexBuffer);
    }
    fn set_data(&mut self, _data: &[u8]) {}
    fn size(&self) -> u64 {
        0
    }
    fn is_dynamic(&self) -> bool {
        false
    }
    fn layout(&self) -> &BufferLayout {
        &self.layout
    }
    fn set_layout(&mut self, layout: BufferLayout) {
        self.layout = layout;
    }
}

#[derive(Debug, Default)]
pub(crate) struct NullIndexBuffer;

impl IndexBuffer for NullIndexBuffer {
    fn id(&self) -> ResourceId {
        ResourceId::NULL
    }
    fn bind(&self, ctx: &mut dyn GraphicsContext) {
        ctx.unbind(BindSlot::IndexBuffer);
    }
    fn count(&self) -> u32 {
        0
    }
}

#[derive(Debug, Default)]
pub(crate) struct NullConstantBuffer;

impl ConstantBuffer for NullConstantBuffer {
    fn id(&self) -> ResourceId {
        ResourceId::NULL
    }
    fn bind(&self, ctx: &mut dyn GraphicsContext, slot: u32) {
        ctx.unbind(BindSlot::ConstantBuffer(slot));
    }
    fn set_data(&mut self, _data: &[u8]) {}
    fn size(&self) -> u64 {
        0
    }
}

#[derive(Debug)]
pub(crate) struct NullShader {
    name: String,
}

impl NullShader {
    pub(crate) fn new(name: &str) -> Self {
        Self { name: name.to_string() }
    }
}

impl Shader for NullShader {
    fn id(&self) -> ResourceId {
        ResourceId::NULL
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn bind(&self, ctx: &mut dyn GraphicsContext) {
        ctx.unbind(BindSlot::Shader);
    }
    fn is_valid(&self) -> bool {
        false
    }
}

#[derive(Debug, Default)]
pub(crate) struct NullTexture;

impl Texture2D for NullTexture {
    fn id(&self) -> ResourceId {
        ResourceId::NULL
    }
    fn width(&self) -> u32 {
        0
    }
    fn height(&self) -> u32 {
        0
    }
    fn bind(&self, ctx: &mut dyn GraphicsContext, slot: u32) {
        ctx.unbind(BindSlot::Texture(slot));
    }
    fn set_data(&mut self, _data: &[u8]) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_never_null() {
        let a = ResourceId::next();
        let b = ResourceId::next();
        assert_ne!(a, b);
        assert!(!a.is_null());
        assert!(ResourceId::NULL.is_null());
    }

    #[test]
    fn null_texture_reports_unloaded() {
        assert!(!NullTexture.is_loaded());
        assert!(!NullShader::new("broken").is_valid());
    }
}
