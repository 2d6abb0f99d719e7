use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use wgpu::SurfaceError;

use crate::renderer::api::PrimitiveTopology;
use crate::renderer::buffer::BufferLayout;
use crate::renderer::resource::{BindSlot, ResourceId};

use super::conversions::{alpha_blend, primitive_state, vertex_attributes};

/// Device, queue and the layouts every resource is created against.
///
/// Shared by the context and its resources so uploads never need to borrow
/// the context.
pub struct GpuShared {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub(super) scene_layout: wgpu::BindGroupLayout,
    pub(super) texture_layout: wgpu::BindGroupLayout,
    pub(super) pipeline_layout: wgpu::PipelineLayout,
    pub(super) sampler: wgpu::Sampler,
    pub(super) device_lost: Arc<AtomicBool>,
}

impl GpuShared {
    pub(super) fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        // group 0: per-scene constants, group 1: texture + sampler.
        let scene_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("strata scene bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("strata texture bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("strata pipeline layout"),
            bind_group_layouts: &[&scene_layout, &texture_layout],
            immediate_size: 0,
        });

        // Repeat addressing so tiling factors above 1 wrap.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("strata texture sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        // The default sink panics; scoped calls catch their own errors first.
        device.on_uncaptured_error(Arc::new(|err: wgpu::Error| {
            log::error!("uncaptured wgpu error: {err}");
        }));

        let device_lost = Arc::new(AtomicBool::new(false));
        let flag = device_lost.clone();
        device.set_device_lost_callback(move |reason, message| {
            log::error!("graphics device lost ({reason:?}): {message}");
            flag.store(true, Ordering::Release);
        });

        Self {
            device,
            queue,
            scene_layout,
            texture_layout,
            pipeline_layout,
            sampler,
            device_lost,
        }
    }

    pub fn is_device_lost(&self) -> bool {
        self.device_lost.load(Ordering::Acquire)
    }

    /// Runs `create` inside a validation error scope. A captured error is
    /// logged against `what` and turns the result into `None`.
    pub(super) fn validated<T>(
        &self,
        what: &str,
        create: impl FnOnce(&wgpu::Device) -> T,
    ) -> Option<T> {
        let scope = self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = create(&self.device);
        match pollster::block_on(scope.pop()) {
            None => Some(value),
            Some(err) => {
                log::error!("{what}: {err}");
                None
            }
        }
    }
}

/// Compiled shader stages shared by the shader object and bound state.
pub(super) struct ShaderModule {
    pub(super) id: ResourceId,
    pub(super) name: String,
    pub(super) module: wgpu::ShaderModule,
}

/// What the next draw will use.
#[derive(Default)]
pub(super) struct BoundState {
    pub(super) shader: Option<Arc<ShaderModule>>,
    pub(super) vertex_buffer: Option<(Arc<wgpu::Buffer>, BufferLayout)>,
    pub(super) index_buffer: Option<Arc<wgpu::Buffer>>,
    pub(super) scene: Option<Arc<wgpu::BindGroup>>,
    pub(super) texture: Option<Arc<wgpu::BindGroup>>,
}

pub(super) struct Frame {
    pub(super) surface_texture: wgpu::SurfaceTexture,
    pub(super) view: wgpu::TextureView,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub(super) struct Viewport {
    pub(super) x: u32,
    pub(super) y: u32,
    pub(super) width: u32,
    pub(super) height: u32,
}

#[derive(Clone, Eq, PartialEq, Hash)]
struct PipelineKey {
    shader: ResourceId,
    layout: BufferLayout,
    topology: PrimitiveTopology,
}

/// Live GPU objects. Present only between `init` and `shutdown`.
pub(super) struct Gpu {
    pub(super) shared: Arc<GpuShared>,
    pub(super) surface: wgpu::Surface<'static>,
    pub(super) config: wgpu::SurfaceConfiguration,
}

/// Immediate-context state of the wgpu backend.
///
/// Resources bind into it; the renderer API reads it when encoding a draw.
pub struct WgpuDeviceContext {
    pub(super) gpu: Option<Gpu>,
    pub(super) bound: BoundState,
    pub(super) viewport: Viewport,
    pub(super) frame: Option<Frame>,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    failed_pipelines: HashSet<PipelineKey>,
    lost_reported: bool,
}

impl WgpuDeviceContext {
    pub(super) fn new(width: u32, height: u32) -> Self {
        Self {
            gpu: None,
            bound: BoundState::default(),
            viewport: Viewport { x: 0, y: 0, width, height },
            frame: None,
            pipelines: HashMap::new(),
            failed_pipelines: HashSet::new(),
            lost_reported: false,
        }
    }

    pub fn shared(&self) -> Option<&Arc<GpuShared>> {
        self.gpu.as_ref().map(|g| &g.shared)
    }

    pub fn surface_format(&self) -> Option<wgpu::TextureFormat> {
        self.gpu.as_ref().map(|g| g.config.format)
    }

    pub(super) fn unbind(&mut self, slot: BindSlot) {
        match slot {
            BindSlot::Shader => self.bound.shader = None,
            BindSlot::VertexBuffer => self.bound.vertex_buffer = None,
            BindSlot::IndexBuffer => self.bound.index_buffer = None,
            BindSlot::ConstantBuffer(0) => self.bound.scene = None,
            BindSlot::Texture(0) => self.bound.texture = None,
            // Only slot 0 exists for constants and textures.
            BindSlot::ConstantBuffer(_) | BindSlot::Texture(_) => {}
        }
    }

    pub(super) fn release(&mut self) {
        self.frame = None;
        self.bound = BoundState::default();
        self.pipelines.clear();
        self.failed_pipelines.clear();
        self.gpu = None;
    }

    /// Logs device loss once. True while the device is unusable.
    pub(super) fn check_device_lost(&mut self) -> bool {
        let Some(gpu) = self.gpu.as_ref() else {
            return false;
        };
        if !gpu.shared.is_device_lost() {
            return false;
        }
        if !self.lost_reported {
            log::error!("device lost; rendering is suspended (recovery not implemented)");
            self.lost_reported = true;
        }
        true
    }

    /// Acquires the swap-chain image for this frame if not yet held.
    pub(super) fn acquire_frame(&mut self) -> bool {
        if self.frame.is_some() {
            return true;
        }
        if self.check_device_lost() {
            return false;
        }
        let Some(gpu) = self.gpu.as_ref() else {
            return false;
        };

        match gpu.surface.get_current_texture() {
            Ok(surface_texture) => {
                let view = surface_texture
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());
                self.frame = Some(Frame { surface_texture, view });
                true
            }
            Err(err) => {
                self.handle_surface_error(err);
                false
            }
        }
    }

    fn handle_surface_error(&mut self, err: SurfaceError) {
        let Some(gpu) = self.gpu.as_ref() else {
            return;
        };
        match err {
            SurfaceError::Outdated => {
                log::debug!("surface outdated; reconfiguring");
                gpu.surface.configure(&gpu.shared.device, &gpu.config);
            }
            SurfaceError::Lost => {
                log::error!("surface lost on acquire; frame skipped (recovery not implemented)");
            }
            SurfaceError::OutOfMemory => {
                log::error!("out of memory acquiring the next frame");
            }
            SurfaceError::Timeout => {
                log::warn!("timed out acquiring the next frame; skipping");
            }
            SurfaceError::Other => {
                log::warn!("failed to acquire the next frame; skipping");
            }
        }
    }

    /// Reconfigures the swap chain. The caller filters zero and unchanged sizes.
    pub(super) fn resize(&mut self, width: u32, height: u32) {
        // Drop the back buffer view before the swap chain is rebuilt.
        self.frame = None;
        self.viewport = Viewport { x: 0, y: 0, width, height };

        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        gpu.config.width = width;
        gpu.config.height = height;
        gpu.surface.configure(&gpu.shared.device, &gpu.config);
    }

    pub(super) fn set_present_mode(&mut self, mode: wgpu::PresentMode) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        if gpu.config.present_mode == mode {
            return;
        }
        self.frame = None;
        gpu.config.present_mode = mode;
        gpu.surface.configure(&gpu.shared.device, &gpu.config);
    }

    pub(super) fn clear(&mut self, color: wgpu::Color) {
        if !self.acquire_frame() {
            return;
        }
        let (Some(gpu), Some(frame)) = (self.gpu.as_ref(), self.frame.as_ref()) else {
            return;
        };

        let mut encoder = gpu
            .shared
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("strata clear encoder"),
            });
        {
            let _rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("strata clear"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(color),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }
        gpu.shared.queue.submit(std::iter::once(encoder.finish()));
    }

    pub(super) fn present(&mut self) {
        if self.check_device_lost() {
            self.frame = None;
            return;
        }
        if let Some(frame) = self.frame.take() {
            drop(frame.view);
            frame.surface_texture.present();
        }
    }

    /// Encodes one indexed draw from the bound state into its own pass.
    pub(super) fn draw_indexed(&mut self, count: u32, topology: PrimitiveTopology) {
        if count == 0 || !self.acquire_frame() {
            return;
        }

        let Some(shader) = self.bound.shader.clone() else {
            log::warn!("draw_indexed with no shader bound; skipped");
            return;
        };
        let Some((vertex_buffer, layout)) = self.bound.vertex_buffer.clone() else {
            log::warn!("draw_indexed with no vertex buffer bound; skipped");
            return;
        };
        let Some(index_buffer) = self.bound.index_buffer.clone() else {
            log::warn!("draw_indexed with no index buffer bound; skipped");
            return;
        };
        let (Some(scene), Some(texture)) = (self.bound.scene.clone(), self.bound.texture.clone())
        else {
            log::warn!("draw_indexed with missing scene or texture bindings; skipped");
            return;
        };

        if !self.ensure_pipeline(&shader, &layout, topology) {
            return;
        }

        let key = PipelineKey { shader: shader.id, layout, topology };
        let (Some(gpu), Some(frame), Some(pipeline)) =
            (self.gpu.as_ref(), self.frame.as_ref(), self.pipelines.get(&key))
        else {
            return;
        };

        let target = (gpu.config.width, gpu.config.height);
        let vp = self.viewport;
        let x = vp.x.min(target.0);
        let y = vp.y.min(target.1);
        let width = vp.width.min(target.0 - x);
        let height = vp.height.min(target.1 - y);
        if width == 0 || height == 0 {
            return;
        }

        let mut encoder = gpu
            .shared
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("strata draw encoder"),
            });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("strata draw"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            rpass.set_viewport(x as f32, y as f32, width as f32, height as f32, 0.0, 1.0);
            rpass.set_pipeline(pipeline);
            rpass.set_bind_group(0, scene.as_ref(), &[]);
            rpass.set_bind_group(1, texture.as_ref(), &[]);
            rpass.set_vertex_buffer(0, vertex_buffer.slice(..));
            rpass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            rpass.draw_indexed(0..count, 0, 0..1);
        }
        gpu.shared.queue.submit(std::iter::once(encoder.finish()));
    }

    fn ensure_pipeline(
        &mut self,
        shader: &ShaderModule,
        layout: &BufferLayout,
        topology: PrimitiveTopology,
    ) -> bool {
        let key = PipelineKey {
            shader: shader.id,
            layout: layout.clone(),
            topology,
        };
        if self.pipelines.contains_key(&key) {
            return true;
        }
        if self.failed_pipelines.contains(&key) {
            return false;
        }

        let Some(gpu) = self.gpu.as_ref() else {
            return false;
        };
        let Some(primitive) = primitive_state(topology) else {
            log::warn!("cannot draw with topology {topology:?}");
            return false;
        };

        let attributes = vertex_attributes(layout);
        let buffers = [wgpu::VertexBufferLayout {
            array_stride: layout.stride() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &attributes,
        }];

        log::debug!("building pipeline for shader '{}' ({topology:?})", shader.name);

        let what = format!("pipeline for shader '{}'", shader.name);
        let pipeline = gpu.shared.validated(&what, |device| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(shader.name.as_str()),
                layout: Some(&gpu.shared.pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader.module,
                    entry_point: Some(crate::renderer::shader::VERTEX_ENTRY),
                    compilation_options: Default::default(),
                    buffers: &buffers,
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader.module,
                    entry_point: Some(crate::renderer::shader::FRAGMENT_ENTRY),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: gpu.config.format,
                        blend: Some(alpha_blend()),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive,
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            })
        });

        match pipeline {
            Some(pipeline) => {
                self.pipelines.insert(key, pipeline);
                true
            }
            None => {
                self.failed_pipelines.insert(key);
                false
            }
        }
    }
}
