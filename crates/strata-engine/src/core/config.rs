use glam::Vec4;

use crate::logging::LoggingConfig;
use crate::renderer::GraphicsApi;
use crate::window::WindowProps;

/// Graphics backend settings.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphicsConfig {
    pub api: GraphicsApi,
    /// Color each frame is cleared to.
    pub clear_color: Vec4,
    /// Pick an sRGB swap chain format when the surface offers one.
    pub prefer_srgb: bool,
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            api: GraphicsApi::Wgpu,
            clear_color: Vec4::new(0.1, 0.1, 0.1, 1.0),
            prefer_srgb: false,
        }
    }
}

/// Everything [`Application::new`](super::Application::new) needs.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub window: WindowProps,
    pub graphics: GraphicsConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.window.title = title.into();
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.window.width = width;
        self.window.height = height;
        self
    }

    pub fn with_api(mut self, api: GraphicsApi) -> Self {
        self.graphics.api = api;
        self
    }
}
