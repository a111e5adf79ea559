//! Key bitmap decoding and preview rendering.

pub mod bmp;
pub mod raster;

pub use bmp::{decode, BmpError, DecodedBitmap};
