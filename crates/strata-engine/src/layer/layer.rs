use crate::core::LayerCtx;
use crate::event::Event;

/// A slice of application logic driven by the run loop.
///
/// Layers are updated bottom-to-top and receive events top-to-bottom.
/// Every hook has an empty default.
pub trait Layer {
    fn name(&self) -> &str;

    /// Called right after the layer is pushed.
    fn on_attach(&mut self, ctx: &mut LayerCtx<'_>) {
        let _ = ctx;
    }

    /// Called right before the layer is popped, or when the stack is dropped.
    fn on_detach(&mut self) {}

    fn on_update(&mut self, ctx: &mut LayerCtx<'_>) {
        let _ = ctx;
    }

    /// Mark the event handled to stop it reaching the layers below.
    fn on_event(&mut self, event: &mut Event) {
        let _ = event;
    }

    /// Called between the debug UI's `begin` and `end` each rendered frame.
    fn on_ui_render(&mut self, ctx: &mut LayerCtx<'_>) {
        let _ = ctx;
    }
}
