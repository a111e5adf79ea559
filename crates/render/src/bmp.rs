//! Decoder for the 1-bit monochrome BMPs the macropad displays on its keys.
//!
//! Only the subset the device writes is accepted:
//! - `BM` signature with a BITMAPINFOHEADER (or larger) info header
//! - one color plane, no compression, 1 bit per pixel
//! - bottom-up rows, or top-down when the height is negative
//!
//! The palette is ignored: a set bit is white, a clear bit is black.

/// File header (14) + BITMAPINFOHEADER (40).
pub const MIN_FILE_LEN: usize = 54;
const MIN_INFO_HEADER_LEN: u32 = 40;
const SIGNATURE: [u8; 2] = *b"BM";

const WHITE: [u8; 4] = [255, 255, 255, 255];
const BLACK: [u8; 4] = [0, 0, 0, 255];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BmpError {
    #[error("invalid BMP: file too small ({0} bytes)")]
    TooSmall(usize),
    #[error("invalid BMP: missing BM signature")]
    BadSignature,
    #[error("invalid BMP: unsupported header format (info header size {0})")]
    HeaderSize(u32),
    #[error("invalid BMP: unsupported planes count {0}")]
    Planes(u16),
    #[error("invalid BMP: compression not supported (method {0})")]
    Compression(u32),
    #[error("invalid BMP: {0}-bit not supported (only 1-bit monochrome)")]
    BitDepth(u16),
    #[error("invalid BMP: negative width {0}")]
    Width(i32),
    #[error("invalid BMP: file too small for image data (need {needed} bytes, have {actual})")]
    Truncated { needed: u64, actual: usize },
}

/// RGBA8 pixels, row 0 at the visual top, every pixel fully opaque.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedBitmap {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl DecodedBitmap {
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize * self.width as usize) + x as usize) * 4;
        let px = self.pixels.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    pub fn is_white(&self, x: u32, y: u32) -> bool {
        self.pixel(x, y) == Some(WHITE)
    }
}

/// Bytes per stored row: one bit per pixel, padded to a 4-byte boundary.
pub fn row_stride(width: u32) -> u64 {
    let bytes = (u64::from(width) + 7) / 8;
    (bytes + 3) / 4 * 4
}

pub fn decode(bytes: &[u8]) -> Result<DecodedBitmap, BmpError> {
    if bytes.len() < MIN_FILE_LEN {
        return Err(BmpError::TooSmall(bytes.len()));
    }
    if bytes[0..2] != SIGNATURE {
        return Err(BmpError::BadSignature);
    }

    let data_offset = le_u32(bytes, 10);
    let header_size = le_u32(bytes, 14);
    if header_size < MIN_INFO_HEADER_LEN {
        return Err(BmpError::HeaderSize(header_size));
    }

    let width = le_i32(bytes, 18);
    let height = le_i32(bytes, 22);
    let planes = le_u16(bytes, 26);
    let bits_per_pixel = le_u16(bytes, 28);
    let compression = le_u32(bytes, 30);

    if planes != 1 {
        return Err(BmpError::Planes(planes));
    }
    if compression != 0 {
        return Err(BmpError::Compression(compression));
    }
    if bits_per_pixel != 1 {
        return Err(BmpError::BitDepth(bits_per_pixel));
    }
    if width < 0 {
        return Err(BmpError::Width(width));
    }

    let width = width as u32;
    let abs_height = height.unsigned_abs();
    let top_down = height < 0;

    let stride = row_stride(width);
    let needed = u64::from(data_offset) + stride * u64::from(abs_height);
    if needed > bytes.len() as u64 {
        return Err(BmpError::Truncated {
            needed,
            actual: bytes.len(),
        });
    }

    // A zero-width image has a zero stride, so the check above says nothing about its height.
    if width == 0 || abs_height == 0 {
        return Ok(DecodedBitmap {
            width,
            height: abs_height,
            pixels: Vec::new(),
        });
    }

    // Bounded by the check above, so these fit in usize.
    let stride = stride as usize;
    let data_offset = data_offset as usize;
    let (w, h) = (width as usize, abs_height as usize);

    let mut pixels = Vec::with_capacity(w * h * 4);
    for y in 0..h {
        let src_y = if top_down { y } else { h - 1 - y };
        let row = &bytes[data_offset + src_y * stride..][..stride];
        for x in 0..w {
            let bit = (row[x / 8] >> (7 - (x % 8))) & 1;
            pixels.extend_from_slice(if bit == 1 { &WHITE } else { &BLACK });
        }
    }

    Ok(DecodedBitmap {
        width,
        height: abs_height,
        pixels,
    })
}

fn le_u16(b: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([b[at], b[at + 1]])
}

fn le_u32(b: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([b[at], b[at + 1], b[at + 2], b[at + 3]])
}

fn le_i32(b: &[u8], at: usize) -> i32 {
    i32::from_le_bytes([b[at], b[at + 1], b[at + 2], b[at + 3]])
}
