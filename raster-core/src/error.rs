//! Error types for framebuffer construction and the BMP/GIF loaders.
//!
//! Primitive drawing never fails — out-of-range coordinates clip or no-op,
//! per the rasteriser's contract. Only construction and decode sessions
//! produce one of these.

use core::fmt;

/// Failure modes that don't involve the host filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterError {
    /// Construction with an unrecognised format identifier.
    InvalidFormat,
    /// The caller-supplied buffer is smaller than the format's geometry requires.
    BufferTooSmall { required: usize, actual: usize },
    /// BMP bit depth was neither 24 nor 32.
    UnsupportedBmpDepth(u16),
    /// The first six bytes of the file were not a GIF87a/GIF89a signature.
    GifSignatureInvalid,
    /// The Logical/Image Screen Descriptor or a colour table failed to parse.
    GifHeaderError,
    /// A frame's LZW stream held an out-of-range palette index or a
    /// corrupt code stream.
    GifFrameError,
}

impl fmt::Display for RasterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            RasterError::InvalidFormat => write!(f, "invalid pixel format"),
            RasterError::BufferTooSmall { required, actual } => {
                write!(f, "buffer too small: need {required} bytes, got {actual}")
            }
            RasterError::UnsupportedBmpDepth(depth) => {
                write!(f, "unsupported BMP bit depth {depth} (only 24/32 supported)")
            }
            RasterError::GifSignatureInvalid => write!(f, "not a GIF87a/GIF89a file"),
            RasterError::GifHeaderError => write!(f, "malformed GIF header or colour table"),
            RasterError::GifFrameError => write!(f, "malformed GIF frame data"),
        }
    }
}

/// Failure from a file-backed loader (BMP/GIF): either a raster-level error
/// or an I/O failure bubbled up from the host's `raster_hal::FileSystem`.
///
/// Generic over the host's I/O error type, the same shape as
/// `pico-gs-core::gpu::driver::GpuError<E>` wraps a transport error.
#[derive(Debug)]
pub enum LoadError<E> {
    Raster(RasterError),
    Io(E),
}

impl<E> From<RasterError> for LoadError<E> {
    fn from(e: RasterError) -> Self {
        LoadError::Raster(e)
    }
}

impl<E: fmt::Debug> fmt::Display for LoadError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Raster(e) => write!(f, "{e}"),
            LoadError::Io(e) => write!(f, "I/O error: {e:?}"),
        }
    }
}
