use super::LayerCtx;

/// Immediate-mode debug overlay hooks.
///
/// When installed, `begin` and `end` bracket every layer's
/// [`on_ui_render`](crate::layer::Layer::on_ui_render) on frames that are
/// not minimized.
pub trait DebugUi {
    fn begin(&mut self, ctx: &mut LayerCtx<'_>);

    fn end(&mut self, ctx: &mut LayerCtx<'_>);
}
