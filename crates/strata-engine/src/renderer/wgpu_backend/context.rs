use std::any::Any;
use std::sync::Arc;

use anyhow::{Context, Result};
use glam::Vec4;

use crate::core::GraphicsConfig;
use crate::engine_assert;
use crate::renderer::api::RendererApi;
use crate::renderer::buffer::{IndexBuffer, VertexBuffer};
use crate::renderer::constant_buffer::ConstantBuffer;
use crate::renderer::context::{GraphicsApi, GraphicsContext};
use crate::renderer::resource::{
    BindSlot, NullConstantBuffer, NullIndexBuffer, NullShader, NullTexture, NullVertexBuffer,
};
use crate::renderer::shader::{missing_entry_points, Shader};
use crate::renderer::texture::Texture2D;
use crate::window::{NativeWindow, Window};

use super::api::WgpuRendererApi;
use super::device::{Gpu, GpuShared, WgpuDeviceContext};
use super::resources::{
    WgpuConstantBuffer, WgpuIndexBuffer, WgpuShader, WgpuTexture, WgpuVertexBuffer,
};

/// Graphics context backed by a wgpu device and a window surface.
///
/// Nothing touches the GPU until [`GraphicsContext::init`]; construction only
/// captures the window handle and the requested settings.
pub struct WgpuContext {
    // Declared first so the surface is released before the window handle.
    dc: WgpuDeviceContext,
    instance: Option<wgpu::Instance>,
    window: Option<Arc<dyn NativeWindow>>,
    present_modes: Vec<wgpu::PresentMode>,
    prefer_srgb: bool,
    vsync: bool,
    size: (u32, u32),
}

impl WgpuContext {
    pub fn new(window: &dyn Window, config: &GraphicsConfig) -> Self {
        let size = (window.width(), window.height());
        Self {
            dc: WgpuDeviceContext::new(size.0, size.1),
            instance: None,
            window: window.native_window(),
            present_modes: Vec::new(),
            prefer_srgb: config.prefer_srgb,
            vsync: window.is_vsync(),
            size,
        }
    }

    pub fn device_context(&self) -> &WgpuDeviceContext {
        &self.dc
    }

    fn present_mode(&self) -> wgpu::PresentMode {
        choose_present_mode(&self.present_modes, self.vsync)
    }

    fn shared(&self, what: &str) -> Option<Arc<GpuShared>> {
        let shared = self.dc.shared().cloned();
        if !engine_assert!(shared.is_some(), "{what} created before GraphicsContext::init") {
            return None;
        }
        shared
    }

    async fn request_gpu(&mut self) -> Result<Gpu> {
        let window = self
            .window
            .clone()
            .context("window does not expose a native handle")?;
        let (width, height) = self.size;
        anyhow::ensure!(width > 0 && height > 0, "window has zero size");

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .context("failed to create wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("strata device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let caps = surface.get_capabilities(&adapter);
        let format = choose_surface_format(&caps, self.prefer_srgb)
            .context("no supported surface formats")?;
        self.present_modes = caps.present_modes.clone();

        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: self.present_mode(),
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let info = adapter.get_info();
        log::info!(
            "wgpu context initialized: {} ({:?}), format {format:?}, {:?}",
            info.name,
            info.backend,
            config.present_mode
        );

        self.instance = Some(instance);
        Ok(Gpu {
            shared: Arc::new(GpuShared::new(device, queue)),
            surface,
            config,
        })
    }
}

impl GraphicsContext for WgpuContext {
    fn api(&self) -> GraphicsApi {
        GraphicsApi::Wgpu
    }

    fn init(&mut self) -> Result<()> {
        if self.dc.gpu.is_some() {
            return Ok(());
        }
        let gpu = pollster::block_on(self.request_gpu())?;
        self.dc.gpu = Some(gpu);
        Ok(())
    }

    fn shutdown(&mut self) {
        if self.dc.gpu.is_none() {
            return;
        }
        if let Some(shared) = self.dc.shared() {
            // Let in-flight submissions finish before the device goes away.
            let _ = shared.device.poll(wgpu::PollType::wait_indefinitely());
        }
        self.dc.release();
        self.instance = None;
        log::info!("wgpu context shut down");
    }

    fn is_initialized(&self) -> bool {
        self.dc.gpu.is_some()
    }

    fn clear(&mut self, color: Vec4) {
        self.dc.clear(wgpu::Color {
            r: color.x as f64,
            g: color.y as f64,
            b: color.z as f64,
            a: color.w as f64,
        });
    }

    fn swap_buffers(&mut self) {
        self.dc.present();
    }

    fn on_resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 || (width, height) == self.size {
            return;
        }
        self.size = (width, height);
        self.dc.resize(width, height);
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn bind_render_target(&mut self) {
        // The swap chain image is the only target; make sure it is acquired.
        self.dc.acquire_frame();
    }

    fn unbind(&mut self, slot: BindSlot) {
        self.dc.unbind(slot);
    }

    fn set_vsync(&mut self, enabled: bool) {
        self.vsync = enabled;
        let mode = self.present_mode();
        self.dc.set_present_mode(mode);
    }

    fn is_vsync(&self) -> bool {
        self.vsync
    }

    fn native_device(&self) -> &dyn Any {
        match self.dc.shared() {
            Some(shared) => shared as &dyn Any,
            None => &(),
        }
    }

    fn native_device_context(&mut self) -> &mut dyn Any {
        &mut self.dc
    }

    fn create_renderer_api(&self) -> Box<dyn RendererApi> {
        Box::new(WgpuRendererApi::default())
    }

    fn create_vertex_buffer(&self, data: &[u8]) -> Box<dyn VertexBuffer> {
        match self.shared("vertex buffer") {
            Some(shared) => Box::new(WgpuVertexBuffer::new_static(shared, data)),
            None => Box::new(NullVertexBuffer::default()),
        }
    }

    fn create_dynamic_vertex_buffer(&self, size: u64) -> Box<dyn VertexBuffer> {
        match self.shared("vertex buffer") {
            Some(shared) => Box::new(WgpuVertexBuffer::new_dynamic(shared, size)),
            None => Box::new(NullVertexBuffer::default()),
        }
    }

    fn create_index_buffer(&self, indices: &[u32]) -> Box<dyn IndexBuffer> {
        match self.shared("index buffer") {
            Some(shared) => Box::new(WgpuIndexBuffer::new(&shared, indices)),
            None => Box::new(NullIndexBuffer),
        }
    }

    fn create_constant_buffer(&self, size: u64) -> Box<dyn ConstantBuffer> {
        match self.shared("constant buffer") {
            Some(shared) => Box::new(WgpuConstantBuffer::new(shared, size)),
            None => Box::new(NullConstantBuffer),
        }
    }

    fn create_shader(&self, name: &str, source: &str) -> Box<dyn Shader> {
        let Some(shared) = self.shared("shader") else {
            return Box::new(NullShader::new(name));
        };
        let missing = missing_entry_points(source);
        if !missing.is_empty() {
            log::error!("shader '{name}' failed to compile: missing entry points {missing:?}");
            return Box::new(NullShader::new(name));
        }
        match WgpuShader::compile(&shared, name, source) {
            Some(shader) => Box::new(shader),
            None => {
                log::error!("shader '{name}' failed to compile");
                Box::new(NullShader::new(name))
            }
        }
    }

    fn create_texture(&self, width: u32, height: u32) -> Box<dyn Texture2D> {
        let Some(shared) = self.shared("texture") else {
            return Box::new(NullTexture);
        };
        if width == 0 || height == 0 {
            log::warn!("refusing to create a {width}x{height} texture");
            return Box::new(NullTexture);
        }
        Box::new(WgpuTexture::new(shared, width, height))
    }
}

impl Drop for WgpuContext {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn choose_surface_format(
    caps: &wgpu::SurfaceCapabilities,
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    let first = caps.formats.first().copied()?;
    if prefer_srgb {
        let srgb = [
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Rgba8UnormSrgb,
        ];
        if let Some(f) = srgb.into_iter().find(|f| caps.formats.contains(f)) {
            return Some(f);
        }
    } else if let Some(f) = caps.formats.iter().copied().find(|f| !f.is_srgb()) {
        return Some(f);
    }
    Some(first)
}

/// Fifo always exists; without vsync take the lowest-latency mode offered.
fn choose_present_mode(available: &[wgpu::PresentMode], vsync: bool) -> wgpu::PresentMode {
    if vsync {
        return wgpu::PresentMode::Fifo;
    }
    [wgpu::PresentMode::Immediate, wgpu::PresentMode::Mailbox]
        .into_iter()
        .find(|m| available.contains(m))
        .unwrap_or(wgpu::PresentMode::Fifo)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vsync_always_uses_fifo() {
        let modes = [wgpu::PresentMode::Immediate, wgpu::PresentMode::Fifo];
        assert_eq!(choose_present_mode(&modes, true), wgpu::PresentMode::Fifo);
    }

    #[test]
    fn no_vsync_prefers_immediate_then_mailbox() {
        let all = [
            wgpu::PresentMode::Fifo,
            wgpu::PresentMode::Mailbox,
            wgpu::PresentMode::Immediate,
        ];
        assert_eq!(choose_present_mode(&all, false), wgpu::PresentMode::Immediate);
        let no_immediate = [wgpu::PresentMode::Fifo, wgpu::PresentMode::Mailbox];
        assert_eq!(choose_present_mode(&no_immediate, false), wgpu::PresentMode::Mailbox);
        assert_eq!(choose_present_mode(&[], false), wgpu::PresentMode::Fifo);
    }
}
