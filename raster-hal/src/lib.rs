#![no_std]
//! Platform abstraction traits for `raster-core` host applications.
//!
//! `raster-core` never touches a concrete filesystem, timer, or host object
//! system. Instead it is generic over the traits in this crate, and the
//! firmware binary (or a PC harness) supplies the concrete implementation —
//! a block-device FAT driver and an RTOS tick on target, `std::fs`/`std::thread`
//! on a desktop build.

/// A read-only handle onto one open file.
///
/// Implementations wrap whatever the host calls a file (a FATFS `FIL`, a
/// `std::fs::File`, ...). Positions are absolute byte offsets from the start
/// of the file. Closing the file is `Drop`, not a method on this trait.
pub trait FileHandle {
    /// Host-specific I/O failure (bad sector, disk full on write, ...).
    type Error: core::fmt::Debug;

    /// Read up to `buf.len()` bytes, returning the number actually placed in
    /// `buf`. A short read is not itself an error; `Ok(0)` signals end of
    /// file. `Err` is reserved for genuine I/O failure.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Seek to an absolute byte offset from the start of the file.
    fn seek(&mut self, offset: u32) -> Result<(), Self::Error>;

    /// Current byte offset from the start of the file.
    fn tell(&self) -> u32;
}

/// Opens files by path.
///
/// `raster-core`'s loaders take `&mut impl FileSystem` and a `&str` path;
/// they never see the filesystem's own mount state.
pub trait FileSystem {
    /// The file handle this filesystem hands back from `open`.
    type File: FileHandle<Error = Self::Error>;
    /// Host-specific I/O failure, shared with `FileHandle::Error`.
    type Error: core::fmt::Debug;

    /// Open `path` read-only. Returns `Err` if the path does not exist or
    /// the underlying medium faults.
    fn open(&mut self, path: &str) -> Result<Self::File, Self::Error>;
}

/// Blocking millisecond delay, used by the GIF decoder to pace animation
/// frames between calls to the caller's per-frame callback.
pub trait DelayMs {
    /// Block the calling thread for approximately `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32);
}
