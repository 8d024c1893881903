//! The primitive rasteriser: everything that draws more than one pixel
//! routes, eventually, through `FrameBuffer::clip_rect` or repeated calls
//! to `pixel_set`. Grounded on `modframebuf.c`'s `drawLine`/`framebuf_*`
//! functions, carried over loop-for-loop rather than reinvented.

pub mod font;

use crate::framebuffer::FrameBuffer;

impl<'a> FrameBuffer<'a> {
    pub fn hline(&mut self, x: i32, y: i32, w: i32, col: u32) {
        self.clip_rect(x, y, w, 1, col);
    }

    pub fn vline(&mut self, x: i32, y: i32, h: i32, col: u32) {
        self.clip_rect(x, y, 1, h, col);
    }

    /// Outline rectangle: four strokes. The vertical strokes span the
    /// full supplied `h` at both corners, exactly as the source does —
    /// not trimmed to avoid double-drawing the corner pixels.
    pub fn rect(&mut self, x: i32, y: i32, w: i32, h: i32, col: u32) {
        self.clip_rect(x, y, w, 1, col);
        self.clip_rect(x, y + h - 1, w, 1, col);
        self.clip_rect(x, y, 1, h, col);
        self.clip_rect(x + w - 1, y, 1, h, col);
    }

    /// Integer Bresenham with explicit sign and steep-axis swap. Plots
    /// `dx` interior points via the loop plus the endpoint, drawn last
    /// unconditionally.
    pub fn line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, col: u32) {
        let width = self.width() as i32;
        let height = self.height() as i32;

        let mut dx = x2 - x1;
        let mut sx;
        if dx > 0 {
            sx = 1;
        } else {
            dx = -dx;
            sx = -1;
        }

        let mut dy = y2 - y1;
        let mut sy;
        if dy > 0 {
            sy = 1;
        } else {
            dy = -dy;
            sy = -1;
        }

        let steep = dy > dx;
        let (mut x1, mut y1) = (x1, y1);
        if steep {
            core::mem::swap(&mut x1, &mut y1);
            core::mem::swap(&mut dx, &mut dy);
            core::mem::swap(&mut sx, &mut sy);
        }

        let mut e = 2 * dy - dx;
        for _ in 0..dx {
            if steep {
                if 0 <= y1 && y1 < width && 0 <= x1 && x1 < height {
                    self.pixel_set(y1, x1, col);
                }
            } else if 0 <= x1 && x1 < width && 0 <= y1 && y1 < height {
                self.pixel_set(x1, y1, col);
            }
            while e >= 0 {
                y1 += sy;
                e -= 2 * dx;
            }
            x1 += sx;
            e += 2 * dy;
        }

        if 0 <= x2 && x2 < width && 0 <= y2 && y2 < height {
            self.pixel_set(x2, y2, col);
        }
    }

    /// Midpoint circle. Unfilled: eight-way symmetric points. Filled:
    /// four symmetric vertical spans plus the central stroke.
    pub fn circle(&mut self, x0: i32, y0: i32, r: i32, col: u32, fill: bool) {
        let mut f = 1 - r;
        let mut ddf_x = 1;
        let mut ddf_y = -2 * r;
        let mut x = 0;
        let mut y = r;

        if fill {
            self.clip_rect(x0, y0 - r, 1, 2 * r + 1, col);
        }

        while x < y {
            if f >= 0 {
                y -= 1;
                ddf_y += 2;
                f += ddf_y;
            }
            x += 1;
            ddf_x += 2;
            f += ddf_x;

            if fill {
                self.clip_rect(x0 + x, y0 - y, 1, 2 * y + 1, col);
                self.clip_rect(x0 + y, y0 - x, 1, 2 * x + 1, col);
                self.clip_rect(x0 - x, y0 - y, 1, 2 * y + 1, col);
                self.clip_rect(x0 - y, y0 - x, 1, 2 * x + 1, col);
            } else {
                self.pixel_set(x0 + x, y0 + y, col);
                self.pixel_set(x0 - x, y0 + y, col);
                self.pixel_set(x0 + x, y0 - y, col);
                self.pixel_set(x0 - x, y0 - y, col);
                self.pixel_set(x0 + y, y0 + x, col);
                self.pixel_set(x0 - y, y0 + x, col);
                self.pixel_set(x0 + y, y0 - x, col);
                self.pixel_set(x0 - y, y0 - x, col);
            }
        }
    }

    /// Outline/filled triangle. Filled sorts vertices by y, special-cases
    /// the collinear-on-y degenerate triangle, and otherwise sweeps two
    /// half-triangles with incremental integer-stepped edges; `dy`
    /// divisors are clamped to 1 to dodge division by zero (a degenerate
    /// horizontal edge).
    pub fn triangle(
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
        if !fill {
            self.line(x0, y0, x1, y1, col);
            self.line(x1, y1, x2, y2, col);
            self.line(x2, y2, x0, y0, col);
            return;
        }

        let (mut x0, mut y0) = (x0, y0);
        let (mut x1, mut y1) = (x1, y1);
        let (mut x2, mut y2) = (x2, y2);

        if y0 > y1 {
            core::mem::swap(&mut y0, &mut y1);
            core::mem::swap(&mut x0, &mut x1);
        }
        if y1 > y2 {
            core::mem::swap(&mut y2, &mut y1);
            core::mem::swap(&mut x2, &mut x1);
        }
        if y0 > y1 {
            core::mem::swap(&mut y0, &mut y1);
            core::mem::swap(&mut x0, &mut x1);
        }

        if y0 == y2 {
            let mut a = x0;
            let mut b = x0;
            if x1 < a {
                a = x1;
            } else if x1 > b {
                b = x1;
            }
            if x2 < a {
                a = x2;
            } else if x2 > b {
                b = x2;
            }
            self.clip_rect(a, y0, b - a + 1, 1, col);
            return;
        }

        let dx01 = x1 - x0;
        let mut dy01 = y1 - y0;
        let dx02 = x2 - x0;
        let mut dy02 = y2 - y0;
        let dx12 = x2 - x1;
        let mut dy12 = y2 - y1;
        if dy01 == 0 {
            dy01 = 1;
        }
        if dy02 == 0 {
            dy02 = 1;
        }
        if dy12 == 0 {
            dy12 = 1;
        }

        let mut sa = 0;
        let mut sb = 0;
        let last = if y1 == y2 { y1 } else { y1 - 1 };

        let mut y = y0;
        while y < last + 1 {
            let mut a = x0 + sa / dy01;
            let mut b = x0 + sb / dy02;
            sa += dx01;
            sb += dx02;
            if a > b {
                core::mem::swap(&mut a, &mut b);
            }
            self.clip_rect(a, y, b - a + 1, 1, col);
            y += 1;
        }

        sa = dx12 * (y - y1);
        sb = dx02 * (y - y0);
        while y <= y2 {
            let mut a = x1 + sa / dy12;
            let mut b = x0 + sb / dy02;
            sa += dx12;
            sb += dx02;
            if a > b {
                core::mem::swap(&mut a, &mut b);
            }
            self.clip_rect(a, y, b - a + 1, 1, col);
            y += 1;
        }
    }

    /// Render `text` using the built-in 8x8 font, one glyph per 8 columns.
    /// Pixels are only set where the glyph bit is 1; the background is
    /// left untouched (transparent text).
    pub fn text(&mut self, text: &str, x0: i32, y0: i32, col: u32) {
        let width = self.width() as i32;
        let height = self.height() as i32;
        let mut x = x0;
        for &byte in text.as_bytes() {
            let glyph = font::glyph(byte);
            for &col_bits in glyph.iter() {
                if 0 <= x && x < width {
                    let mut bits = col_bits;
                    let mut y = y0;
                    while bits != 0 {
                        if bits & 1 != 0 && 0 <= y && y < height {
                            self.pixel_set(x, y, col);
                        }
                        bits >>= 1;
                        y += 1;
                    }
                }
                x += 1;
            }
        }
    }

    /// Copy `src` onto `self` with top-left at `(x, y)`. Pixels whose
    /// source value equals `key` are skipped; `key` is compared against
    /// the format's raw stored representation, so for RGB565 sources the
    /// caller must pass the byte-swapped word, not a human colour.
    pub fn blit(&mut self, src: &FrameBuffer<'_>, x: i32, y: i32, key: i32) {
        let (sw, sh) = (src.width() as i32, src.height() as i32);
        let (dw, dh) = (self.width() as i32, self.height() as i32);

        if x >= dw || y >= dh || -x >= sw || -y >= sh {
            return;
        }

        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (-x).max(0);
        let y1 = (-y).max(0);
        let x0end = dw.min(x + sw);
        let y0end = dh.min(y + sh);

        let mut yy0 = y0;
        let mut yy1 = y1;
        while yy0 < y0end {
            let mut cx1 = x1;
            let mut cx0 = x0;
            while cx0 < x0end {
                let pixel = src.pixel_get(cx1, yy1);
                if pixel as i64 != key as i64 {
                    self.pixel_set(cx0, yy0, pixel);
                }
                cx1 += 1;
                cx0 += 1;
            }
            yy1 += 1;
            yy0 += 1;
        }
    }

    /// Shift contents by `(dx, dy)`. Reads precede the writes they would
    /// otherwise be clobbered by: the scan direction on each axis is
    /// chosen opposite the shift's sign. Vacated pixels keep whatever the
    /// source region held; callers wanting a clean vacancy must
    /// `fill_rect`/`clip_rect` it themselves afterwards.
    pub fn scroll(&mut self, dx: i32, dy: i32) {
        let width = self.width() as i32;
        let height = self.height() as i32;

        let (sx, xend, stepx) = if dx < 0 {
            (0, width + dx, 1)
        } else {
            (width - 1, dx - 1, -1)
        };
        let (mut y, yend, stepy) = if dy < 0 {
            (0, height + dy, 1)
        } else {
            (height - 1, dy - 1, -1)
        };

        while y != yend {
            let mut x = sx;
            while x != xend {
                let pixel = self.pixel_get(x - dx, y - dy);
                self.pixel_set(x, y, pixel);
                x += stepx;
            }
            y += stepy;
        }
    }
}
