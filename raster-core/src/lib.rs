#![cfg_attr(not(test), no_std)]
//! Embedded 2D raster graphics engine for a caller-supplied pixel buffer:
//! seven pixel encodings, a primitive rasteriser, and streaming BMP24/32
//! and GIF89a loaders. Never allocates; every entry point is generic over
//! the host-supplied `raster_hal` traits for file and timer access.

pub mod bmp;
pub mod error;
pub mod framebuffer;
pub mod gif;
pub mod pixel;
pub mod primitives;

pub use bmp::load_bmp;
pub use error::{LoadError, RasterError};
pub use framebuffer::FrameBuffer;
pub use gif::{load_gif, GifCancelToken};
pub use pixel::PixelFormat;

/// Public format identifiers, matching `pixel::ids` one-for-one. `MVLSB`,
/// `MHLSB`, `MHMSB` are the short aliases spec.md §4.H lists alongside the
/// long names.
pub const MONO_VLSB: u8 = pixel::ids::MONO_VLSB;
pub const MVLSB: u8 = pixel::ids::MONO_VLSB;
pub const MONO_HLSB: u8 = pixel::ids::MONO_HLSB;
pub const MHLSB: u8 = pixel::ids::MONO_HLSB;
pub const MONO_HMSB: u8 = pixel::ids::MONO_HMSB;
pub const MHMSB: u8 = pixel::ids::MONO_HMSB;
pub const RGB565: u8 = pixel::ids::RGB565;
pub const GS2_HMSB: u8 = pixel::ids::GS2_HMSB;
pub const GS4_HMSB: u8 = pixel::ids::GS4_HMSB;
pub const PL8: u8 = pixel::ids::PL8;
/// Historical synonym for `PL8`: the source wires `GS8` through the same
/// byte-per-pixel set/get/fill_rect as `PL8`, with no behavioural
/// difference, so no separate `PixelFormat` variant exists for it.
pub const GS8: u8 = pixel::ids::PL8;

impl<'a> FrameBuffer<'a> {
    /// `MONO_VLSB`-only legacy constructor, one positional argument
    /// shorter than `new`. Matches the reference binding's original
    /// three-argument `FrameBuffer1` entry point, from before the
    /// multi-format rewrite added `format` and `stride`.
    pub fn new_mono_vlsb(buf: &'a mut [u8], width: u32, height: u32) -> Result<Self, RasterError> {
        Self::new_auto_stride(buf, width, height, MONO_VLSB)
    }

    /// Alias for [`FrameBuffer::triangle`] under the source's misspelled
    /// name, kept so ports of existing call sites don't need editing.
    #[allow(clippy::too_many_arguments)]
    pub fn traingle(
        &mut self,
        x0: i32,
        y0: i32,
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        col: u32,
        fill: bool,
    ) {
        self.triangle(x0, y0, x1, y1, x2, y2, col, fill);
    }
}
