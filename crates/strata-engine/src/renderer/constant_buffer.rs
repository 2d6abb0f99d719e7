use super::context::GraphicsContext;
use super::resource::ResourceId;

/// Small uniform buffer read by shader stages, bound to a numbered slot.
pub trait ConstantBuffer {
    fn id(&self) -> ResourceId;

    fn bind(&self, ctx: &mut dyn GraphicsContext, slot: u32);

    /// Overwrites the buffer from offset 0. `data` must fit in [`size`](Self::size).
    fn set_data(&mut self, data: &[u8]);

    fn size(&self) -> u64;
}
