//! GIF89a streaming decoder: header/colour-table parsing, the graphic
//! control extension, interlaced/non-interlaced frame assembly, and
//! per-frame disposal, driven as a blocking loop with a user callback
//! between frames. Grounded on `modframebuf.c`'s `gif_*`/`framebuf_loadgif`
//! family.

mod lzw;

use raster_hal::{DelayMs, FileHandle, FileSystem};

use crate::error::{LoadError, RasterError};
use crate::framebuffer::FrameBuffer;
use lzw::{LzwState, END_OF_FRAME};

const INTERLACE_OFFSET: [u16; 4] = [8, 8, 4, 2];
const INTERLACE_YPOS: [u16; 4] = [0, 4, 2, 1];

const INTRO_IMAGE: u8 = 0x2C;
const INTRO_EXTENSION: u8 = 0x21;
const INTRO_TERMINATOR: u8 = 0x3B;

const EXT_PLAINTEXT: u8 = 0x01;
const EXT_GRAPHICCTL: u8 = 0xF9;
const EXT_COMMENT: u8 = 0xFE;
const EXT_APPLICATION: u8 = 0xFF;

/// Cooperative cancellation handle passed to the per-frame callback.
/// Session-local, never a module-wide flag, per spec.md §9's redesign
/// flag for the source's `gifdecoding` global.
#[derive(Default)]
pub struct GifCancelToken {
    cancelled: bool,
}

impl GifCancelToken {
    /// Request that the animation loop stop after this frame, and that
    /// the current inter-frame delay be cut short.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

#[derive(Clone, Copy, Default)]
struct LogicalScreenDescriptor {
    width: u16,
    height: u16,
    flags: u8,
    bg_color_index: u8,
}

#[derive(Clone, Copy, Default, PartialEq, Eq)]
struct ImageScreenDescriptor {
    xoff: u16,
    yoff: u16,
    width: u16,
    height: u16,
    flags: u8,
}

fn check_signature<FH: FileHandle>(file: &mut FH) -> Result<(), LoadError<FH::Error>> {
    let mut sig = [0u8; 6];
    file.read(&mut sig).map_err(LoadError::Io)?;
    let ok = &sig[0..3] == b"GIF" && sig[3] == b'8' && (sig[4] == b'7' || sig[4] == b'9') && sig[5] == b'a';
    if ok {
        Ok(())
    } else {
        Err(RasterError::GifSignatureInvalid.into())
    }
}

fn read_logical_screen_descriptor<FH: FileHandle>(
    file: &mut FH,
    color_table: &mut [u32; 256],
) -> Result<LogicalScreenDescriptor, LoadError<FH::Error>> {
    let mut raw = [0u8; 7];
    file.read(&mut raw).map_err(LoadError::Io)?;
    let lsd = LogicalScreenDescriptor {
        width: u16::from_le_bytes([raw[0], raw[1]]),
        height: u16::from_le_bytes([raw[2], raw[3]]),
        flags: raw[4],
        bg_color_index: raw[5],
    };
    if lsd.flags & 0x80 != 0 {
        let num = 2usize << (lsd.flags & 0x07) as usize;
        read_color_table(file, color_table, num)?;
    }
    Ok(lsd)
}

fn read_color_table<FH: FileHandle>(
    file: &mut FH,
    table: &mut [u32; 256],
    num: usize,
) -> Result<(), LoadError<FH::Error>> {
    let mut rgb = [0u8; 3];
    for slot in table.iter_mut().take(num) {
        file.read(&mut rgb).map_err(LoadError::Io)?;
        *slot = ((rgb[0] as u32) << 16) | ((rgb[1] as u32) << 8) | rgb[2] as u32;
    }
    Ok(())
}

fn read_image_screen_descriptor<FH: FileHandle>(
    file: &mut FH,
) -> Result<ImageScreenDescriptor, LoadError<FH::Error>> {
    let mut raw = [0u8; 9];
    file.read(&mut raw).map_err(LoadError::Io)?;
    Ok(ImageScreenDescriptor {
        xoff: u16::from_le_bytes([raw[0], raw[1]]),
        yoff: u16::from_le_bytes([raw[2], raw[3]]),
        width: u16::from_le_bytes([raw[4], raw[5]]),
        height: u16::from_le_bytes([raw[6], raw[7]]),
        flags: raw[8],
    })
}

/// Read a graphic control extension's 4-byte payload. Delay is stored
/// verbatim as whatever 16-bit little-endian value the file holds; the
/// source treats it as already being in 10ms units despite GIF's own
/// convention of 1/100s units, and so do we.
fn read_graphic_control_extension<FH: FileHandle>(
    file: &mut FH,
) -> Result<(u16, u8, Option<u8>), LoadError<FH::Error>> {
    let mut len_byte = [0u8; 1];
    file.read(&mut len_byte).map_err(LoadError::Io)?;
    if len_byte[0] != 4 {
        return Err(RasterError::GifHeaderError.into());
    }
    let mut buf = [0u8; 4];
    file.read(&mut buf).map_err(LoadError::Io)?;
    let delay = u16::from_le_bytes([buf[1], buf[2]]);
    let disposal = (buf[0] >> 2) & 0x7;
    let transparency = if buf[0] & 0x1 != 0 { Some(buf[3]) } else { None };
    let mut terminator = [0u8; 1];
    file.read(&mut terminator).map_err(LoadError::Io)?;
    if terminator[0] != 0 {
        return Err(RasterError::GifHeaderError.into());
    }
    Ok((delay, disposal, transparency))
}

fn read_extension<FH: FileHandle>(
    file: &mut FH,
) -> Result<Option<(u16, u8, Option<u8>)>, LoadError<FH::Error>> {
    let mut label = [0u8; 1];
    file.read(&mut label).map_err(LoadError::Io)?;
    match label[0] {
        EXT_PLAINTEXT | EXT_APPLICATION | EXT_COMMENT => {
            while lzw::skip_data_block(file)? > 0 {}
            Ok(None)
        }
        EXT_GRAPHICCTL => Ok(Some(read_graphic_control_extension(file)?)),
        _ => Err(RasterError::GifHeaderError.into()),
    }
}

/// Paint background-colour strips over the previous frame's region that
/// the current frame's region doesn't cover — the symmetric difference
/// of the two axis-aligned rectangles, as four strips. Clamped to
/// `<=320x320`, a historical hard-coded canvas limit preserved from the
/// source (see DESIGN.md).
#[allow(clippy::too_many_arguments)]
fn clear_to_bkcolor(
    fb: &mut FrameBuffer<'_>,
    x: i32,
    y: i32,
    isd: &ImageScreenDescriptor,
    prev: &ImageScreenDescriptor,
    color: u32,
) {
    if prev.width == 0 || prev.height == 0 {
        return;
    }
    let (px, py, pw, ph) = (prev.xoff as i32, prev.yoff as i32, prev.width as i32, prev.height as i32);
    let (ix, iy) = (isd.xoff as i32, isd.yoff as i32);

    // x1/y1 are inclusive corner coordinates, matching the commented-out
    // `pic_phy.fill(x0,y0,x1,y1,color)` call sites below derive them from
    // (corner - 1); converting to a clip_rect extent needs the +1 back.
    let mut strip = |x0: i32, y0: i32, x1: i32, y1: i32| {
        if x0 < x1 && y0 < y1 && x1 <= 320 && y1 <= 320 {
            fb.clip_rect(x0, y0, x1 - x0 + 1, y1 - y0 + 1, color);
        }
    };

    if iy > py {
        strip(x + px, y + py, x + px + pw - 1, y + iy - 1);
    }
    if ix > px {
        strip(x + px, y + py, x + ix - 1, y + py + ph - 1);
    }
    if isd.yoff as i32 + isd.height as i32 < py + ph {
        strip(x + px, y + iy + isd.height as i32 - 1, x + px + pw - 1, y + py + ph - 1);
    }
    if ix + isd.width as i32 < px + pw {
        strip(x + ix + isd.width as i32 - 1, y + py, x + px + pw - 1, y + py + ph - 1);
    }
}

/// Decode and draw one frame's LZW-compressed row data, run-length
/// compressing identical consecutive palette indices into horizontal
/// fills. Returns once the end code is reached or every row is drawn.
#[allow(clippy::too_many_arguments)]
fn disp_image<FH: FileHandle>(
    file: &mut FH,
    fb: &mut FrameBuffer<'_>,
    isd: &ImageScreenDescriptor,
    color_table: &[u32; 256],
    bg_color_index: u8,
    num_colors: usize,
    x0: i32,
    y0: i32,
    transparency: i32,
    disposal: u8,
) -> Result<(), LoadError<FH::Error>> {
    let width = isd.width as i32;
    let height = isd.height as i32;
    let xend = width + x0 - 1;
    let bkcolor = color_table[bg_color_index as usize];

    let mut code_size = [0u8; 1];
    file.read(&mut code_size).map_err(LoadError::Io)?;
    let mut lzw = LzwState::new(code_size[0]);

    let interlaced = isd.flags & 0x40 != 0;
    let mut pass = 0usize;
    let mut ypos = y0;

    for _ycnt in 0..height {
        let mut cnt: i32 = 0;
        let mut old_index: i32 = -1;
        let mut xpos = x0;

        while xpos <= xend {
            let index = lzw.next_indexed_byte(file)?;
            if index == END_OF_FRAME {
                return Ok(());
            }
            if index < 0 || index as usize >= num_colors {
                return Err(RasterError::GifFrameError.into());
            }

            if index == old_index {
                cnt += 1;
            } else {
                if cnt != 0 {
                    if old_index != transparency || disposal == 2 {
                        fb.clip_rect(xpos - cnt - 1, ypos, cnt + 1, 1, color_table[old_index as usize]);
                    }
                    cnt = 0;
                } else if old_index >= 0 {
                    if old_index != transparency {
                        fb.pixel_set(xpos - 1, ypos, color_table[old_index as usize]);
                    } else if disposal == 2 {
                        fb.pixel_set(xpos - 1, ypos, bkcolor);
                    }
                }
            }
            old_index = index;
            xpos += 1;
        }

        if old_index != transparency || disposal == 2 {
            let color_index = if old_index != transparency {
                color_table[old_index as usize]
            } else {
                bkcolor
            };
            if cnt != 0 {
                fb.clip_rect(xpos - cnt - 1, ypos, cnt + 1, 1, color_index);
            } else {
                fb.pixel_set(xend, ypos, color_index);
            }
        }

        if interlaced {
            ypos += INTERLACE_OFFSET[pass] as i32;
            if ypos - y0 >= height {
                pass += 1;
                if pass < INTERLACE_YPOS.len() {
                    ypos = INTERLACE_YPOS[pass] as i32 + y0;
                }
            }
        } else {
            ypos += 1;
        }
    }
    Ok(())
}

enum FrameOutcome {
    Drawn,
    End,
}

/// Read one introducer byte and dispatch: an image descriptor draws a
/// frame, an extension updates delay/disposal/transparency state, and
/// the terminator ends the animation.
///
/// `delay` is session state, not per-call state: it's the decoder's
/// persisted `gif->delay` field in the source, which a frame with no
/// preceding graphic control extension simply leaves at whatever the
/// last extension set it to. `disposal`/`trans_index` are genuinely
/// per-call locals in the source (re-declared fresh on every
/// `gif_drawimage` invocation), so those reset here too.
#[allow(clippy::too_many_arguments)]
fn draw_image<FH: FileHandle>(
    file: &mut FH,
    fb: &mut FrameBuffer<'_>,
    lsd: &LogicalScreenDescriptor,
    color_table: &mut [u32; 256],
    backup_table: &mut [u32; 256],
    num_colors: &mut usize,
    prev_isd: &mut ImageScreenDescriptor,
    delay: &mut u16,
    x0: i32,
    y0: i32,
) -> Result<FrameOutcome, LoadError<FH::Error>> {
    let mut trans_index: i32 = -1;
    // Matches a GIF with no preceding graphic control extension for its
    // first image: the source reads this uninitialised stack variable,
    // which we cannot reproduce safely. Zero (disposal "none") is the
    // value it would hold on a freshly zeroed stack in practice.
    let mut disposal: u8 = 0;

    loop {
        let mut introducer = [0u8; 1];
        file.read(&mut introducer).map_err(LoadError::Io)?;

        match introducer[0] {
            INTRO_IMAGE => {
                let previous = *prev_isd;
                let isd = read_image_screen_descriptor(file)?;
                *prev_isd = isd;

                if isd.flags & 0x80 != 0 {
                    *backup_table = *color_table;
                    let local_num = 2usize << (isd.flags & 0x07) as usize;
                    read_color_table(file, color_table, local_num)?;
                    *num_colors = local_num;
                }

                if disposal == 2 {
                    clear_to_bkcolor(fb, x0, y0, &isd, &previous, color_table[lsd.bg_color_index as usize]);
                }

                disp_image(
                    file,
                    fb,
                    &isd,
                    color_table,
                    lsd.bg_color_index,
                    *num_colors,
                    x0 + isd.xoff as i32,
                    y0 + isd.yoff as i32,
                    trans_index,
                    disposal,
                )?;

                loop {
                    let mut len_byte = [0u8; 1];
                    file.read(&mut len_byte).map_err(LoadError::Io)?;
                    if len_byte[0] == 0 {
                        break;
                    }
                    let pos = file.tell();
                    file.seek(pos + len_byte[0] as u32).map_err(LoadError::Io)?;
                }
                return Ok(FrameOutcome::Drawn);
            }
            INTRO_TERMINATOR => return Ok(FrameOutcome::End),
            INTRO_EXTENSION => {
                if let Some((new_delay, new_disposal, new_trans)) = read_extension(file)? {
                    *delay = new_delay;
                    disposal = new_disposal;
                    if let Some(t) = new_trans {
                        trans_index = t as i32;
                    }
                }
            }
            _ => return Err(RasterError::GifHeaderError.into()),
        }
    }
}

/// Decode and play a GIF89a file onto `fb`, top-left of the logical
/// screen at `(x, y)`. `callback` runs synchronously between frames and
/// receives a cancellation token it may use to stop the animation early;
/// both the outer frame loop and the inter-frame delay observe it.
pub fn load_gif<FS, D>(
    fb: &mut FrameBuffer<'_>,
    fs: &mut FS,
    delay_src: &mut D,
    path: &str,
    x: i32,
    y: i32,
    mut callback: impl FnMut(&mut GifCancelToken),
) -> Result<(), LoadError<FS::Error>>
where
    FS: FileSystem,
    D: DelayMs,
{
    let mut file = fs.open(path).map_err(LoadError::Io)?;
    check_signature(&mut file)?;

    let mut color_table = [0u32; 256];
    let mut backup_table = [0u32; 256];
    let lsd = read_logical_screen_descriptor(&mut file, &mut color_table)?;
    let mut num_colors = if lsd.flags & 0x80 != 0 {
        2usize << (lsd.flags & 0x07) as usize
    } else {
        0
    };

    let mut prev_isd = ImageScreenDescriptor::default();
    let mut token = GifCancelToken::default();
    // Persisted across frames, matching the source's `gif->delay` struct
    // field: a frame with no preceding graphic control extension keeps
    // whatever the last one set, rather than resetting to 0.
    let mut delay: u16 = 0;

    loop {
        let outcome = draw_image(
            &mut file,
            fb,
            &lsd,
            &mut color_table,
            &mut backup_table,
            &mut num_colors,
            &mut prev_isd,
            &mut delay,
            x,
            y,
        )?;

        if matches!(outcome, FrameOutcome::End) {
            break;
        }

        callback(&mut token);

        if prev_isd.flags & 0x80 != 0 {
            color_table = backup_table;
        }

        // sleep max(delay, 10) x 10ms, 10ms at a time so cancellation is
        // observed promptly rather than in one long blocking call.
        let mut remaining = core::cmp::max(delay, 10);
        while remaining > 0 && !token.is_cancelled() {
            delay_src.delay_ms(10);
            remaining -= 1;
        }

        if token.is_cancelled() {
            break;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::ids;

    #[test]
    fn clear_to_bkcolor_clears_the_full_strip_including_the_far_edge() {
        // Previous frame covered the whole 4x4 canvas; the new frame only
        // covers the bottom two rows, so the top two rows (all four
        // columns) must be cleared to background colour. Column 3 and row
        // 1 are exactly the far edge the unconverted `x1-x0`/`y1-y0` sizing
        // used to leave uncleared.
        let mut buf = [7u8; 16];
        let mut fb = FrameBuffer::new(&mut buf, 4, 4, ids::PL8, 0).unwrap();

        let prev = ImageScreenDescriptor {
            xoff: 0,
            yoff: 0,
            width: 4,
            height: 4,
            flags: 0,
        };
        let isd = ImageScreenDescriptor {
            xoff: 0,
            yoff: 2,
            width: 4,
            height: 2,
            flags: 0,
        };

        clear_to_bkcolor(&mut fb, 0, 0, &isd, &prev, 9);

        for y in 0..2i32 {
            for x in 0..4i32 {
                assert_eq!(fb.pixel_get(x, y), 9, "uncleared at ({x},{y})");
            }
        }
        for y in 2..4i32 {
            for x in 0..4i32 {
                assert_eq!(fb.pixel_get(x, y), 7, "overpainted at ({x},{y})");
            }
        }
    }

}
