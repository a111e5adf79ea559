//! Hand-off from decoded key bitmaps to displayable images.

use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::{ImageEncoder, RgbaImage};
use tracing::debug;

use crate::bmp::{self, DecodedBitmap};

pub fn to_rgba_image(bitmap: &DecodedBitmap) -> anyhow::Result<RgbaImage> {
    RgbaImage::from_raw(bitmap.width, bitmap.height, bitmap.pixels.clone())
        .ok_or_else(|| anyhow::anyhow!("pixel buffer does not match {}x{}", bitmap.width, bitmap.height))
}

/// Nearest-neighbour upscale so single pixels stay crisp in previews.
pub fn scale_preview(bitmap: &DecodedBitmap, width: u32, height: u32) -> anyhow::Result<RgbaImage> {
    let img = to_rgba_image(bitmap)?;
    Ok(image::imageops::resize(&img, width, height, FilterType::Nearest))
}

pub fn encode_png(img: &RgbaImage) -> anyhow::Result<Vec<u8>> {
    let mut out = Vec::new();
    let enc = PngEncoder::new(&mut out);
    enc.write_image(
        img.as_raw(),
        img.width(),
        img.height(),
        image::ColorType::Rgba8.into(),
    )?;
    Ok(out)
}

/// Decode a key bitmap and re-encode it as PNG for display.
pub fn bmp_to_png(bytes: &[u8]) -> anyhow::Result<Vec<u8>> {
    let decoded = bmp::decode(bytes)?;
    debug!(width = decoded.width, height = decoded.height, "decoded key bitmap");
    encode_png(&to_rgba_image(&decoded)?)
}
