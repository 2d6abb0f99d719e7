use std::borrow::Cow;
use std::sync::Arc;

use wgpu::util::DeviceExt;

use crate::engine_assert;
use crate::renderer::buffer::{BufferLayout, IndexBuffer, VertexBuffer};
use crate::renderer::constant_buffer::ConstantBuffer;
use crate::renderer::context::GraphicsContext;
use crate::renderer::resource::ResourceId;
use crate::renderer::shader::Shader;
use crate::renderer::texture::{expected_len, Texture2D, BYTES_PER_PIXEL};

use super::device::{GpuShared, ShaderModule, WgpuDeviceContext};

pub(super) fn device_context(ctx: &mut dyn GraphicsContext) -> Option<&mut WgpuDeviceContext> {
    let dc = ctx.native_device_context().downcast_mut::<WgpuDeviceContext>();
    if !engine_assert!(dc.is_some(), "wgpu resource bound to a foreign graphics context") {
        return None;
    }
    dc
}

/// `write_buffer` needs 4-byte multiples.
fn padded(data: &[u8]) -> Cow<'_, [u8]> {
    let align = wgpu::COPY_BUFFER_ALIGNMENT as usize;
    if data.len() % align == 0 {
        Cow::Borrowed(data)
    } else {
        let mut bytes = data.to_vec();
        bytes.resize(data.len().next_multiple_of(align), 0);
        Cow::Owned(bytes)
    }
}

fn aligned_size(size: u64) -> u64 {
    size.max(wgpu::COPY_BUFFER_ALIGNMENT)
        .next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT)
}

// ── vertex buffer ─────────────────────────────────────────────────────────

pub(super) struct WgpuVertexBuffer {
    id: ResourceId,
    shared: Arc<GpuShared>,
    buffer: Arc<wgpu::Buffer>,
    size: u64,
    dynamic: bool,
    layout: BufferLayout,
}

impl WgpuVertexBuffer {
    pub(super) fn new_static(shared: Arc<GpuShared>, data: &[u8]) -> Self {
        let buffer = shared
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("strata static vbo"),
                contents: data,
                usage: wgpu::BufferUsages::VERTEX,
            });
        Self {
            id: ResourceId::next(),
            shared,
            buffer: Arc::new(buffer),
            size: data.len() as u64,
            dynamic: false,
            layout: BufferLayout::default(),
        }
    }

    pub(super) fn new_dynamic(shared: Arc<GpuShared>, size: u64) -> Self {
        let buffer = shared.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("strata dynamic vbo"),
            size: aligned_size(size),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self {
            id: ResourceId::next(),
            shared,
            buffer: Arc::new(buffer),
            size,
            dynamic: true,
            layout: BufferLayout::default(),
        }
    }
}

impl VertexBuffer for WgpuVertexBuffer {
    fn id(&self) -> ResourceId {
        self.id
    }

    fn bind(&self, ctx: &mut dyn GraphicsContext) {
        if let Some(dc) = device_context(ctx) {
            dc.bound.vertex_buffer = Some((self.buffer.clone(), self.layout.clone()));
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
        self.shared.queue.write_buffer(&self.buffer, 0, &padded(data));
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

// ── index buffer ──────────────────────────────────────────────────────────

pub(super) struct WgpuIndexBuffer {
    id: ResourceId,
    buffer: Arc<wgpu::Buffer>,
    count: u32,
}

impl WgpuIndexBuffer {
    pub(super) fn new(shared: &GpuShared, indices: &[u32]) -> Self {
        let buffer = shared
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("strata ibo"),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });
        Self {
            id: ResourceId::next(),
            buffer: Arc::new(buffer),
            count: indices.len() as u32,
        }
    }
}

impl IndexBuffer for WgpuIndexBuffer {
    fn id(&self) -> ResourceId {
        self.id
    }

    fn bind(&self, ctx: &mut dyn GraphicsContext) {
        if let Some(dc) = device_context(ctx) {
            dc.bound.index_buffer = Some(self.buffer.clone());
        }
    }

    fn count(&self) -> u32 {
        self.count
    }
}

// ── constant buffer ───────────────────────────────────────────────────────

pub(super) struct WgpuConstantBuffer {
    id: ResourceId,
    shared: Arc<GpuShared>,
    buffer: wgpu::Buffer,
    bind_group: Arc<wgpu::BindGroup>,
    size: u64,
}

impl WgpuConstantBuffer {
    pub(super) fn new(shared: Arc<GpuShared>, size: u64) -> Self {
        // Uniform bindings are sized in 16-byte rows.
        let buffer = shared.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("strata constant buffer"),
            size: size.max(16).next_multiple_of(16),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = shared.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("strata constant bind group"),
            layout: &shared.scene_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        Self {
            id: ResourceId::next(),
            shared,
            buffer,
            bind_group: Arc::new(bind_group),
            size,
        }
    }
}

impl ConstantBuffer for WgpuConstantBuffer {
    fn id(&self) -> ResourceId {
        self.id
    }

    fn bind(&self, ctx: &mut dyn GraphicsContext, slot: u32) {
        if slot != 0 {
            log::warn!("constant buffer slot {slot} is not supported by the wgpu backend");
            return;
        }
        if let Some(dc) = device_context(ctx) {
            dc.bound.scene = Some(self.bind_group.clone());
        }
    }

    fn set_data(&mut self, data: &[u8]) {
        if !engine_assert!(data.len() as u64 <= self.size, "constant upload exceeds buffer size") {
            return;
        }
        self.shared.queue.write_buffer(&self.buffer, 0, &padded(data));
    }

    fn size(&self) -> u64 {
        self.size
    }
}

// ── shader ────────────────────────────────────────────────────────────────

pub(super) struct WgpuShader {
    module: Arc<ShaderModule>,
}

impl WgpuShader {
    /// `None` when compilation reported errors; they are logged.
    pub(super) fn compile(shared: &GpuShared, name: &str, source: &str) -> Option<Self> {
        let module = shared.validated(&format!("shader '{name}'"), |device| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(name),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            })
        })?;

        let info = pollster::block_on(module.get_compilation_info());
        let mut failed = false;
        for message in &info.messages {
            match message.message_type {
                wgpu::CompilationMessageType::Error => {
                    log::error!("shader '{name}': {}", message.message);
                    failed = true;
                }
                wgpu::CompilationMessageType::Warning => {
                    log::warn!("shader '{name}': {}", message.message);
                }
                wgpu::CompilationMessageType::Info => {
                    log::debug!("shader '{name}': {}", message.message);
                }
            }
        }
        if failed {
            return None;
        }

        Some(Self {
            module: Arc::new(ShaderModule {
                id: ResourceId::next(),
                name: name.to_string(),
                module,
            }),
        })
    }
}

impl Shader for WgpuShader {
    fn id(&self) -> ResourceId {
        self.module.id
    }

    fn name(&self) -> &str {
        &self.module.name
    }

    fn bind(&self, ctx: &mut dyn GraphicsContext) {
        if let Some(dc) = device_context(ctx) {
            dc.bound.shader = Some(self.module.clone());
        }
    }

    fn is_valid(&self) -> bool {
        true
    }
}

// ── texture ───────────────────────────────────────────────────────────────

pub(super) struct WgpuTexture {
    id: ResourceId,
    shared: Arc<GpuShared>,
    texture: wgpu::Texture,
    bind_group: Arc<wgpu::BindGroup>,
    width: u32,
    height: u32,
}

impl WgpuTexture {
    pub(super) fn new(shared: Arc<GpuShared>, width: u32, height: u32) -> Self {
        let texture = shared.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("strata texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = shared.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("strata texture bind group"),
            layout: &shared.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&shared.sampler),
                },
            ],
        });
        Self {
            id: ResourceId::next(),
            shared,
            texture,
            bind_group: Arc::new(bind_group),
            width,
            height,
        }
    }
}

impl Texture2D for WgpuTexture {
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
        if slot != 0 {
            log::warn!("texture slot {slot} is not supported by the wgpu backend");
            return;
        }
        if let Some(dc) = device_context(ctx) {
            dc.bound.texture = Some(self.bind_group.clone());
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
        self.shared.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(self.width * BYTES_PER_PIXEL),
                rows_per_image: Some(self.height),
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padding_rounds_up_to_copy_alignment() {
        assert_eq!(padded(&[1, 2, 3]).len(), 4);
        assert!(matches!(padded(&[0; 8]), Cow::Borrowed(_)));
    }

    #[test]
    fn aligned_size_is_never_zero() {
        assert_eq!(aligned_size(0), 4);
        assert_eq!(aligned_size(44 * 4), 176);
        assert_eq!(aligned_size(5), 8);
    }

    // ── validation on a stub device ───────────────────────────────────────

    const FLAT_WGSL: &str = "
        @vertex fn vs_main(@location(0) p: vec2<f32>) -> @builtin(position) vec4<f32> {
            return vec4<f32>(p, 0.0, 1.0);
        }
        @fragment fn fs_main() -> @location(0) vec4<f32> {
            return vec4<f32>(1.0);
        }
    ";

    fn stub_gpu() -> GpuShared {
        let (device, queue) = wgpu::Device::noop(&wgpu::DeviceDescriptor::default());
        GpuShared::new(device, queue)
    }

    #[test]
    fn malformed_wgsl_yields_no_shader() {
        let shared = stub_gpu();
        assert!(WgpuShader::compile(&shared, "broken", "fn vs_main( { } fn fs_main() {}").is_none());
        assert!(WgpuShader::compile(&shared, "flat", FLAT_WGSL).is_some());
    }

    #[test]
    fn invalid_pipeline_is_reported_not_raised() {
        let shared = stub_gpu();
        let Some(shader) = WgpuShader::compile(&shared, "flat", FLAT_WGSL) else {
            panic!("valid shader rejected");
        };

        // Offset 1 is what a leading Bool element produces; vertex formats need 4.
        let attributes = [wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x2,
            offset: 1,
            shader_location: 0,
        }];
        let pipeline = shared.validated("misaligned pipeline", |device| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("misaligned"),
                layout: Some(&shared.pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader.module.module,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: 12,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &attributes,
                    }],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader.module.module,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::TextureFormat::Rgba8Unorm.into())],
                }),
                primitive: wgpu::PrimitiveState::default(),
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            })
        });
        assert!(pipeline.is_none());
    }
}
