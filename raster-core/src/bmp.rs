//! BMP24/32 loader: streams an uncompressed, bottom-up Windows DIB
//! straight into a `FrameBuffer`, one scratch buffer at a time. Grounded
//! on `modframebuf.c`'s `framebuf_loadbmp`, including its row-padding and
//! off-by-one quirks (see DESIGN.md).

use raster_hal::{FileHandle, FileSystem};

use crate::error::{LoadError, RasterError};
use crate::framebuffer::FrameBuffer;

const BMP_DBUF_SIZE: usize = 512;
const HEADER_MIN: usize = 30;

/// Load a 24/32-bit uncompressed BMP from `path` onto `fb`, top-left
/// corner of the image placed at `(x0, y0)`.
///
/// Only 24bpp BGR and 32bpp BGRA (alpha ignored) are supported; anything
/// else is `RasterError::UnsupportedBmpDepth`. BMP row padding to a
/// 4-byte boundary is **not** honoured, matching the source this was
/// ported from — images whose row byte count isn't already a multiple of
/// 4 will desynchronise. This is a preserved defect, not a missing
/// feature.
pub fn load_bmp<FS: FileSystem>(
    fb: &mut FrameBuffer<'_>,
    fs: &mut FS,
    path: &str,
    x0: i32,
    y0: i32,
) -> Result<(), LoadError<FS::Error>> {
    let mut file = fs.open(path).map_err(LoadError::Io)?;
    let mut databuf = [0u8; BMP_DBUF_SIZE];
    let mut br = file.read(&mut databuf).map_err(LoadError::Io)?;
    if br < HEADER_MIN {
        return Err(RasterError::GifHeaderError.into());
    }

    let bf_off_bits = u32::from_le_bytes([databuf[10], databuf[11], databuf[12], databuf[13]]);
    let bi_width = i32::from_le_bytes([databuf[18], databuf[19], databuf[20], databuf[21]]);
    let bi_height = i32::from_le_bytes([databuf[22], databuf[23], databuf[24], databuf[25]]);
    let bi_bit_count = u16::from_le_bytes([databuf[28], databuf[29]]);
    let color_byte = (bi_bit_count / 8) as u32;

    if color_byte != 3 && color_byte != 4 {
        return Err(RasterError::UnsupportedBmpDepth(bi_bit_count).into());
    }

    let img_width = bi_width.unsigned_abs();
    let img_height = bi_height.unsigned_abs();
    let rowlen = img_width * color_byte;

    let mut count = bf_off_bits as usize;
    let mut x: u32 = 0;
    let mut y: u32 = img_height;
    let mut rgb: u32 = 0;
    let mut color: u32 = 0;
    let mut countpix: u32 = 0;
    let mut readlen = BMP_DBUF_SIZE;

    'outer: loop {
        while count < readlen {
            let byte = databuf[count];
            match color_byte {
                3 => match rgb {
                    0 => color = byte as u32,
                    1 => color += (byte as u32) << 8,
                    2 => color += (byte as u32) << 16,
                    _ => {}
                },
                4 => match rgb {
                    0 => color = byte as u32,
                    1 => color += (byte as u32) << 8,
                    2 => color += (byte as u32) << 16,
                    3 => {}
                    _ => {}
                },
                _ => unreachable!(),
            }
            rgb += 1;
            count += 1;

            if rgb == color_byte {
                if x < img_width {
                    fb.pixel_set(x0 + x as i32, y0 + y as i32, color);
                }
                x += 1;
                color = 0;
                rgb = 0;
            }

            countpix += 1;
            if countpix >= rowlen {
                y -= 1;
                if y == 0 {
                    break 'outer;
                }
                x = 0;
                countpix = 0;
                color = 0;
                rgb = 0;
            }
        }

        br = file.read(&mut databuf).map_err(LoadError::Io)?;
        if br != readlen {
            readlen = br;
        }
        if br == 0 {
            break;
        }
        count = 0;
    }

    Ok(())
}
