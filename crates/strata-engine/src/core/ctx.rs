use anyhow::Result;

use crate::event::EventBus;
use crate::input::InputState;
use crate::renderer::{GraphicsContext, RenderCommand, Renderer, Renderer2D};
use crate::time::FrameTime;
use crate::window::Window;

/// Control directive set by layers through [`LayerCtx::request_exit`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum AppControl {
    #[default]
    Continue,
    Exit,
}

/// What a layer can reach while it runs.
///
/// Built fresh for each hook call; nothing here outlives the call.
pub struct LayerCtx<'a> {
    pub window: &'a dyn Window,
    pub graphics: &'a mut RenderCommand,
    pub renderer: &'a mut Renderer,
    pub renderer_2d: &'a mut Renderer2D,
    pub input: &'a InputState,
    pub events: &'a mut EventBus,
    pub time: FrameTime,
    control: &'a mut AppControl,
}

impl LayerCtx<'_> {
    /// Stops the run loop at the start of the next frame.
    pub fn request_exit(&mut self) {
        *self.control = AppControl::Exit;
    }

    pub fn exit_requested(&self) -> bool {
        *self.control == AppControl::Exit
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.window.width(), self.window.height())
    }

    pub fn aspect_ratio(&self) -> f32 {
        let (w, h) = self.window_size();
        w as f32 / h.max(1) as f32
    }
}

/// Engine services owned by the application.
///
/// Field order is drop order: renderers release their resources before the
/// graphics context, which goes before the window it draws into.
pub(crate) struct Services {
    pub(crate) renderer_2d: Renderer2D,
    pub(crate) renderer: Renderer,
    pub(crate) graphics: RenderCommand,
    pub(crate) window: Box<dyn Window>,
    pub(crate) input: InputState,
    pub(crate) events: EventBus,
    pub(crate) control: AppControl,
}

impl Services {
    /// Initializes the graphics stack for `window`.
    pub(crate) fn new(window: Box<dyn Window>, context: Box<dyn GraphicsContext>) -> Result<Self> {
        let mut graphics = RenderCommand::new(context);
        graphics.init()?;

        let renderer = Renderer::new(&mut graphics);
        let renderer_2d = Renderer2D::new(&mut graphics);

        Ok(Self {
            renderer_2d,
            renderer,
            graphics,
            window,
            input: InputState::new(),
            events: EventBus::new(),
            control: AppControl::Continue,
        })
    }

    pub(crate) fn ctx(&mut self, time: FrameTime) -> LayerCtx<'_> {
        LayerCtx {
            window: self.window.as_ref(),
            graphics: &mut self.graphics,
            renderer: &mut self.renderer,
            renderer_2d: &mut self.renderer_2d,
            input: &self.input,
            events: &mut self.events,
            time,
            control: &mut self.control,
        }
    }
}

#[cfg(test)]
impl Services {
    /// Headless services on a 640x480 window.
    pub(crate) fn headless() -> Self {
        use crate::renderer::headless::HeadlessContext;
        use crate::window::{HeadlessWindow, WindowProps};

        let window = HeadlessWindow::new(&WindowProps::new("test", 640, 480));
        let context = HeadlessContext::new(640, 480);
        match Self::new(Box::new(window), Box::new(context)) {
            Ok(services) => services,
            Err(e) => panic!("headless services failed: {e:#}"),
        }
    }
}
