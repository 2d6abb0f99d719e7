use std::cell::Cell;

use anyhow::{Context, Result};

use crate::engine_assert;
use crate::event::{
    AppInitEvent, AppShutdownEvent, AppUpdateEvent, Event, EventBus, EventDispatcher,
    WindowCloseEvent, WindowResizeEvent,
};
use crate::input::InputState;
use crate::layer::{Layer, LayerId, LayerStack};
use crate::logging::init_logging;
use crate::renderer::{create_graphics_context, GraphicsContext, RenderCommand};
use crate::time::{FrameClock, FrameTime};
use crate::window::{WinitWindow, Window};

use super::config::AppConfig;
use super::ctx::{AppControl, Services};
use super::debug_ui::DebugUi;

/// Lifecycle phase of an [`Application`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppState {
    Constructing,
    Running,
    ShuttingDown,
}

thread_local! {
    static LIVE_APPLICATIONS: Cell<u32> = const { Cell::new(0) };
}

/// One live application per thread.
struct InstanceGuard;

impl InstanceGuard {
    fn acquire() -> Self {
        let live = LIVE_APPLICATIONS.with(Cell::get);
        engine_assert!(live == 0, "an Application already exists on this thread");
        LIVE_APPLICATIONS.with(|n| n.set(live + 1));
        Self
    }
}

impl Drop for InstanceGuard {
    fn drop(&mut self) {
        LIVE_APPLICATIONS.with(|n| n.set(n.get().saturating_sub(1)));
    }
}

/// Owns the window, the graphics stack and the layer stack, and runs the
/// frame loop.
///
/// Frame: tick the clock, pump window events, then (unless minimized) clear,
/// update layers bottom-to-top, run the UI hooks and present. Events go
/// through [`Application::on_event`].
pub struct Application {
    // Layers detach before the services they may hold resources from.
    layers: LayerStack,
    debug_ui: Option<Box<dyn DebugUi>>,
    services: Services,
    clock: FrameClock,
    time: FrameTime,
    state: AppState,
    running: bool,
    minimized: bool,
    _guard: InstanceGuard,
}

impl Application {
    /// Opens a desktop window and the configured graphics backend.
    pub fn new(config: AppConfig) -> Result<Self> {
        init_logging(config.logging.clone());

        let window = WinitWindow::new(&config.window).context("failed to open the main window")?;
        let context = create_graphics_context(&config.graphics, &window);
        Self::with_platform(config, Box::new(window), context)
    }

    /// Builds the application around an existing window and an
    /// uninitialized graphics context.
    pub fn with_platform(
        config: AppConfig,
        window: Box<dyn Window>,
        context: Box<dyn GraphicsContext>,
    ) -> Result<Self> {
        let guard = InstanceGuard::acquire();

        let mut services = match Services::new(window, context) {
            Ok(services) => services,
            Err(e) => {
                log::error!("graphics initialization failed: {e:#}");
                return Err(e.context("graphics initialization failed"));
            }
        };

        let (width, height) = (services.window.width(), services.window.height());
        services.graphics.set_clear_color(config.graphics.clear_color);
        services.graphics.set_viewport(0, 0, width, height);

        log::info!(
            "application '{}' ready ({width}x{height}, {:?})",
            services.window.title(),
            services.graphics.context().api()
        );

        Ok(Self {
            layers: LayerStack::new(),
            debug_ui: None,
            services,
            clock: FrameClock::new(),
            time: FrameTime::initial(),
            state: AppState::Constructing,
            running: true,
            minimized: false,
            _guard: guard,
        })
    }

    pub fn push_layer(&mut self, layer: Box<dyn Layer>) -> LayerId {
        log::debug!("pushing layer '{}'", layer.name());
        let mut ctx = self.services.ctx(self.time);
        let id = self.layers.push_layer(layer, &mut ctx);
        self.apply_control();
        id
    }

    pub fn push_overlay(&mut self, overlay: Box<dyn Layer>) -> LayerId {
        log::debug!("pushing overlay '{}'", overlay.name());
        let mut ctx = self.services.ctx(self.time);
        let id = self.layers.push_overlay(overlay, &mut ctx);
        self.apply_control();
        id
    }

    pub fn pop_layer(&mut self, id: LayerId) -> Option<Box<dyn Layer>> {
        self.layers.pop_layer(id)
    }

    pub fn pop_overlay(&mut self, id: LayerId) -> Option<Box<dyn Layer>> {
        self.layers.pop_overlay(id)
    }

    pub fn set_debug_ui(&mut self, debug_ui: Option<Box<dyn DebugUi>>) {
        self.debug_ui = debug_ui;
    }

    /// Runs until a close request, then shuts down.
    pub fn run(&mut self) {
        self.state = AppState::Running;
        self.clock.reset();
        self.publish(AppInitEvent.into());

        while self.running {
            self.run_frame();
        }

        self.shutdown();
    }

    /// One iteration of the loop.
    pub fn run_frame(&mut self) {
        self.time = self.clock.tick();

        let mut pending = Vec::new();
        self.services.window.poll_events(&mut |event| pending.push(event));
        for mut event in pending {
            self.on_event(&mut event);
        }

        if !self.minimized {
            self.render_frame();
        }

        self.publish(
            AppUpdateEvent {
                delta_time: self.time.dt,
            }
            .into(),
        );
    }

    fn render_frame(&mut self) {
        self.services.graphics.bind_render_target();
        self.services.graphics.clear();

        {
            let mut ctx = self.services.ctx(self.time);
            self.layers.update(&mut ctx);

            if let Some(ui) = self.debug_ui.as_mut() {
                ui.begin(&mut ctx);
            }
            self.layers.ui_render(&mut ctx);
            if let Some(ui) = self.debug_ui.as_mut() {
                ui.end(&mut ctx);
            }
        }

        self.services.graphics.swap_buffers();
        self.apply_control();
    }

    /// Routes one event: input state, local handlers, layers top-down, then
    /// the event bus if nothing handled it.
    pub fn on_event(&mut self, event: &mut Event) {
        log::trace!("{event}");
        self.services.input.apply_event(event);

        let mut dispatcher = EventDispatcher::new(event);
        dispatcher.dispatch::<WindowCloseEvent, _>(|_| {
            self.running = false;
            true
        });
        dispatcher.dispatch::<WindowResizeEvent, _>(|e| {
            if e.width == 0 || e.height == 0 {
                self.minimized = true;
                return false;
            }
            self.minimized = false;
            let services = &mut self.services;
            services.graphics.on_resize(e.width, e.height);
            services
                .renderer
                .on_window_resize(&mut services.graphics, e.width, e.height);
            false
        });

        self.layers.propagate_event(event);

        if !event.is_handled() {
            self.services.events.publish(event);
        }
    }

    /// Same effect as a window close request.
    pub fn close(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_minimized(&self) -> bool {
        self.minimized
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    pub fn window(&self) -> &dyn Window {
        self.services.window.as_ref()
    }

    pub fn graphics(&mut self) -> &mut RenderCommand {
        &mut self.services.graphics
    }

    pub fn input(&self) -> &InputState {
        &self.services.input
    }

    /// Subscribe here before [`Application::run`] to see `AppInit`.
    pub fn events(&mut self) -> &mut EventBus {
        &mut self.services.events
    }

    pub fn layers(&self) -> &LayerStack {
        &self.layers
    }

    fn publish(&mut self, mut event: Event) {
        self.services.events.publish(&mut event);
    }

    fn apply_control(&mut self) {
        if self.services.control == AppControl::Exit {
            log::debug!("exit requested by a layer");
            self.services.control = AppControl::Continue;
            self.close();
        }
    }

    fn shutdown(&mut self) {
        if self.state == AppState::ShuttingDown {
            return;
        }
        self.state = AppState::ShuttingDown;
        log::info!("shutting down after {} frames", self.time.frame_index);

        self.publish(AppShutdownEvent.into());
        self.layers.clear();
        self.debug_ui = None;
        self.services.graphics.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::core::{GraphicsConfig, LayerCtx};
    use crate::event::{EventCategory, EventType, KeyPressedEvent};
    use crate::input::KeyCode;
    use crate::renderer::headless::{CommandLog, HeadlessContext, RecordedCommand, SharedCommandLog};
    use crate::renderer::GraphicsApi;
    use crate::window::{EventInjector, HeadlessWindow, WindowProps};

    struct Harness {
        app: Application,
        log: SharedCommandLog,
        injector: EventInjector,
    }

    fn harness() -> Harness {
        let props = WindowProps::new("test", 640, 480);
        let window = HeadlessWindow::new(&props);
        let injector = window.injector();
        let context = HeadlessContext::new(props.width, props.height);
        let log = context.log();
        let config = AppConfig {
            window: props,
            graphics: GraphicsConfig {
                api: GraphicsApi::Headless,
                ..GraphicsConfig::default()
            },
            ..AppConfig::default()
        };
        let app = Application::with_platform(config, Box::new(window), Box::new(context))
            .unwrap();
        Harness { app, log, injector }
    }

    type Journal = Rc<RefCell<Vec<String>>>;

    struct Recorder {
        name: &'static str,
        journal: Journal,
        handle_keys: bool,
        exit_after: Option<u32>,
        updates: u32,
    }

    impl Recorder {
        fn new(name: &'static str, journal: &Journal) -> Self {
            Self {
                name,
                journal: journal.clone(),
                handle_keys: false,
                exit_after: None,
                updates: 0,
            }
        }
    }

    impl Layer for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        fn on_update(&mut self, ctx: &mut LayerCtx<'_>) {
            self.updates += 1;
            self.journal.borrow_mut().push(format!("{}:update", self.name));
            if self.exit_after == Some(self.updates) {
                ctx.request_exit();
            }
        }

        fn on_event(&mut self, event: &mut Event) {
            self.journal
                .borrow_mut()
                .push(format!("{}:{}", self.name, event.name()));
            if self.handle_keys && event.is_in_category(EventCategory::KEYBOARD) {
                event.mark_handled();
            }
        }

        fn on_ui_render(&mut self, _ctx: &mut LayerCtx<'_>) {
            self.journal.borrow_mut().push(format!("{}:ui", self.name));
        }
    }

    struct UiTracer(Journal);

    impl DebugUi for UiTracer {
        fn begin(&mut self, _ctx: &mut LayerCtx<'_>) {
            self.0.borrow_mut().push("ui:begin".into());
        }

        fn end(&mut self, _ctx: &mut LayerCtx<'_>) {
            self.0.borrow_mut().push("ui:end".into());
        }
    }

    fn key() -> KeyPressedEvent {
        KeyPressedEvent { key: KeyCode::Space, repeat: false }
    }

    // ── resize and minimize ──────────────────────────────────────────────

    #[test]
    fn minimize_then_restore_forwards_only_the_real_size() {
        let mut h = harness();

        h.injector.push(WindowResizeEvent { width: 0, height: 0 });
        h.app.run_frame();
        assert!(h.app.is_minimized());

        h.injector.push(WindowResizeEvent { width: 800, height: 600 });
        h.app.run_frame();
        assert!(!h.app.is_minimized());

        let log = h.log.borrow();
        let resizes: Vec<_> = log
            .commands()
            .iter()
            .filter(|c| matches!(c, RecordedCommand::Resize { .. }))
            .collect();
        assert_eq!(resizes, vec![&RecordedCommand::Resize { width: 800, height: 600 }]);
        assert!(log.contains(&RecordedCommand::SetViewport { x: 0, y: 0, width: 800, height: 600 }));
    }

    #[test]
    fn minimized_frames_skip_rendering_but_keep_pumping() {
        let mut h = harness();
        let journal = Journal::default();
        h.app.push_layer(Box::new(Recorder::new("L1", &journal)));

        h.injector.push(WindowResizeEvent { width: 0, height: 0 });
        h.app.run_frame();
        let clears = h.log.borrow().count(|c| matches!(c, RecordedCommand::Clear(_)));
        assert_eq!(clears, 0);
        assert!(!journal.borrow().contains(&"L1:update".to_string()));

        h.injector.push(KeyPressedEvent { key: KeyCode::A, repeat: false });
        h.app.run_frame();
        assert!(journal.borrow().contains(&"L1:KeyPressed".to_string()));
        assert!(h.app.input().is_key_pressed(KeyCode::A));
    }

    // ── event routing ────────────────────────────────────────────────────

    #[test]
    fn overlay_that_handles_blocks_lower_layers() {
        let mut h = harness();
        let journal = Journal::default();
        h.app.push_layer(Box::new(Recorder::new("L1", &journal)));
        let mut overlay = Recorder::new("O1", &journal);
        overlay.handle_keys = true;
        h.app.push_overlay(Box::new(overlay));

        let mut event = Event::from(key());
        h.app.on_event(&mut event);

        assert!(event.is_handled());
        let journal = journal.borrow();
        assert!(journal.contains(&"O1:KeyPressed".to_string()));
        assert!(!journal.contains(&"L1:KeyPressed".to_string()));
    }

    #[test]
    fn unhandled_events_reach_the_bus() {
        let mut h = harness();
        let seen = Rc::new(Cell::new(0));
        let counter = seen.clone();
        h.app.events().subscribe::<KeyPressedEvent, _>(move |_| {
            counter.set(counter.get() + 1);
            false
        });

        h.app.on_event(&mut key().into());
        assert_eq!(seen.get(), 1);

        let journal = Journal::default();
        let mut blocker = Recorder::new("O1", &journal);
        blocker.handle_keys = true;
        h.app.push_overlay(Box::new(blocker));
        h.app.on_event(&mut key().into());
        assert_eq!(seen.get(), 1);
    }

    // ── loop ─────────────────────────────────────────────────────────────

    #[test]
    fn window_close_ends_the_loop() {
        let mut h = harness();
        let types = Rc::new(RefCell::new(Vec::new()));
        let sink = types.clone();
        h.app
            .events()
            .subscribe_category(EventCategory::APPLICATION, move |e| {
                if e.event_type() != EventType::AppUpdate {
                    sink.borrow_mut().push(e.event_type());
                }
                false
            });

        h.injector.push(WindowCloseEvent);
        h.app.run();

        assert!(!h.app.is_running());
        assert_eq!(h.app.state(), AppState::ShuttingDown);
        assert_eq!(*types.borrow(), vec![EventType::AppInit, EventType::AppShutdown]);
        assert!(h.log.borrow().contains(&RecordedCommand::Shutdown));
    }

    #[test]
    fn frame_order_is_clear_update_ui_present() {
        let mut h = harness();
        let journal = Journal::default();
        h.app.push_layer(Box::new(Recorder::new("L1", &journal)));
        h.app.push_overlay(Box::new(Recorder::new("O1", &journal)));
        h.app.set_debug_ui(Some(Box::new(UiTracer(journal.clone()))));

        h.app.run_frame();

        assert_eq!(
            *journal.borrow(),
            vec!["L1:update", "O1:update", "ui:begin", "L1:ui", "O1:ui", "ui:end"]
        );
        let log = h.log.borrow();
        let clear = log.commands().iter().position(|c| matches!(c, RecordedCommand::Clear(_)));
        let present = log.commands().iter().position(|c| *c == RecordedCommand::SwapBuffers);
        assert!(clear.is_some() && clear < present);
    }

    #[test]
    fn long_headless_runs_keep_bounded_history() {
        let mut h = harness();
        for _ in 0..3000 {
            h.app.run_frame();
        }
        let log = h.log.borrow();
        assert!(log.len() <= CommandLog::DEFAULT_LIMIT);
        assert!(log.discarded() > 0);
        assert_eq!(log.commands().last(), Some(&RecordedCommand::SwapBuffers));
    }

    #[test]
    fn layer_can_request_exit() {
        let mut h = harness();
        let journal = Journal::default();
        let mut quitter = Recorder::new("L1", &journal);
        quitter.exit_after = Some(3);
        h.app.push_layer(Box::new(quitter));

        h.app.run();
        assert_eq!(journal.borrow().iter().filter(|s| s.ends_with(":update")).count(), 3);
    }

    #[test]
    #[should_panic(expected = "already exists")]
    fn second_application_on_a_thread_is_rejected() {
        let _first = harness();
        let _second = harness();
    }
}
