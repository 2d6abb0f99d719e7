use std::path::Path;

use super::context::GraphicsContext;
use super::resource::ResourceId;

/// Bytes per texel; textures are always RGBA8.
pub const BYTES_PER_PIXEL: u32 = 4;

/// A 2D RGBA8 texture.
pub trait Texture2D {
    fn id(&self) -> ResourceId;

    fn width(&self) -> u32;

    fn height(&self) -> u32;

    fn bind(&self, ctx: &mut dyn GraphicsContext, slot: u32);

    /// Uploads the full image. `data.len()` must equal `width * height * 4`.
    fn set_data(&mut self, data: &[u8]);

    /// False for textures whose source failed to decode.
    fn is_loaded(&self) -> bool {
        self.width() > 0 && self.height() > 0
    }
}

/// Decodes an image file into tightly packed RGBA8 rows, top row first.
pub(crate) fn decode_rgba(path: &Path) -> image::ImageResult<image::RgbaImage> {
    Ok(image::open(path)?.to_rgba8())
}

/// Checks an upload against the texture's dimensions.
pub(crate) fn expected_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * BYTES_PER_PIXEL as usize
}
