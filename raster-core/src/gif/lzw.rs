//! Classic variable-width LZW as GIF uses it: a prefix-chain dictionary,
//! a sliding bit window over 255-byte data sub-blocks, and an output
//! stack for expanding a code back into its run of palette indices.
//! Transliterated from `gif_initlzw`/`gif_getnextcode`/`gif_getnextbyte`
//! in `modframebuf.c`.

use raster_hal::FileHandle;

use crate::error::{LoadError, RasterError};

const MAX_LZW_BITS: u32 = 12;
const DICT_SIZE: usize = 1 << MAX_LZW_BITS;
/// Sliding window over the current + previous data sub-block. A GIF data
/// sub-block is at most 255 bytes; 2 bytes of overlap plus that maximum
/// comfortably fits in 280 bytes.
const BUFFER_SIZE: usize = 280;

const MASK_TBL: [u16; 16] = [
    0x0000, 0x0001, 0x0003, 0x0007, 0x000f, 0x001f, 0x003f, 0x007f, 0x00ff, 0x01ff, 0x03ff, 0x07ff,
    0x0fff, 0x1fff, 0x3fff, 0x7fff,
];

/// End-of-data sentinel returned by `next_indexed_byte` when the LZW
/// stream's end code is reached.
pub const END_OF_FRAME: i32 = -2;

pub struct LzwState {
    set_code_size: u8,
    code_size: u16,
    clear_code: u16,
    end_code: u16,
    max_code: u16,
    max_code_size: u16,
    cur_bit: i32,
    last_bit: i32,
    last_byte: usize,
    get_done: bool,
    return_clear: bool,
    first_code: i32,
    old_code: i32,
    buffer: [u8; BUFFER_SIZE],
    stack: [u8; DICT_SIZE],
    sp: usize,
    prefix: [u16; DICT_SIZE],
    code_table: [u16; DICT_SIZE],
}

impl LzwState {
    /// Reset all state for a new frame's initial LZW code size, matching
    /// `gif_initlzw`'s full `memset` + field initialisation.
    pub fn new(code_size: u8) -> Self {
        let clear_code = 1u16 << code_size;
        LzwState {
            set_code_size: code_size,
            code_size: code_size as u16 + 1,
            clear_code,
            end_code: clear_code + 1,
            max_code: clear_code + 2,
            max_code_size: clear_code << 1,
            cur_bit: 0,
            last_bit: 0,
            last_byte: 2,
            get_done: false,
            return_clear: true,
            first_code: 0,
            old_code: 0,
            buffer: [0; BUFFER_SIZE],
            stack: [0; DICT_SIZE],
            sp: 0,
            prefix: [0; DICT_SIZE],
            code_table: [0; DICT_SIZE],
        }
    }

    /// Read `code_size` bits from the sliding window, refilling from the
    /// next data sub-block when the window runs dry. The very first call
    /// always returns the clear code without touching the file.
    fn next_code<FH: FileHandle>(&mut self, file: &mut FH) -> Result<i32, LoadError<FH::Error>> {
        if self.return_clear {
            self.return_clear = false;
            return Ok(self.clear_code as i32);
        }

        let mut end = self.cur_bit + self.code_size as i32;
        if end >= self.last_bit {
            if self.get_done {
                return Err(RasterError::GifFrameError.into());
            }
            self.buffer[0] = self.buffer[self.last_byte - 2];
            self.buffer[1] = self.buffer[self.last_byte - 1];
            let count = read_data_block(file, &mut self.buffer[2..])?;
            if count == 0 {
                self.get_done = true;
            }
            self.last_byte = 2 + count;
            self.cur_bit = (self.cur_bit - self.last_bit) + 16;
            self.last_bit = (2 + count as i32) * 8;
            end = self.cur_bit + self.code_size as i32;
        }

        let j = (end >> 3) as usize;
        let i = (self.cur_bit >> 3) as usize;
        let result: i32 = if i == j {
            self.buffer[i] as i32
        } else if i + 1 == j {
            self.buffer[i] as i32 | (self.buffer[i + 1] as i32) << 8
        } else {
            self.buffer[i] as i32 | (self.buffer[i + 1] as i32) << 8 | (self.buffer[i + 2] as i32) << 16
        };
        let result = (result >> (self.cur_bit & 0x7)) & MASK_TBL[self.code_size as usize] as i32;
        self.cur_bit += self.code_size as i32;
        Ok(result)
    }

    /// Pop a decompressed byte if the output stack still holds one from a
    /// previous code's expansion; otherwise pull and expand the next LZW
    /// code. Returns `END_OF_FRAME` on the GIF end code.
    pub fn next_indexed_byte<FH: FileHandle>(
        &mut self,
        file: &mut FH,
    ) -> Result<i32, LoadError<FH::Error>> {
        if self.sp > 0 {
            self.sp -= 1;
            return Ok(self.stack[self.sp] as i32);
        }

        loop {
            let raw = self.next_code(file)?;
            let mut code = raw as u16;

            if code == self.clear_code {
                if self.clear_code as usize >= DICT_SIZE {
                    return Err(RasterError::GifFrameError.into());
                }
                self.code_table = [0; DICT_SIZE];
                for (i, slot) in self.prefix[..self.clear_code as usize].iter_mut().enumerate() {
                    *slot = i as u16;
                }
                self.code_size = self.set_code_size as u16 + 1;
                self.max_code_size = self.clear_code << 1;
                self.max_code = self.clear_code + 2;
                self.sp = 0;
                loop {
                    self.first_code = self.next_code(file)?;
                    if self.first_code != self.clear_code as i32 {
                        break;
                    }
                }
                self.old_code = self.first_code;
                return Ok(self.first_code);
            }

            if code == self.end_code {
                return Ok(END_OF_FRAME);
            }

            let incode = code;
            if code >= self.max_code {
                self.push(self.first_code as u8);
                code = self.old_code as u16;
            }

            while code >= self.clear_code {
                self.push(self.prefix[code as usize] as u8);
                if code == self.code_table[code as usize] {
                    return Ok(code as i32);
                }
                if self.sp >= self.stack.len() {
                    return Ok(code as i32);
                }
                code = self.code_table[code as usize];
            }

            self.first_code = self.prefix[code as usize] as i32;
            self.push(self.first_code as u8);

            let new_code = self.max_code;
            if (new_code as usize) < DICT_SIZE {
                self.code_table[new_code as usize] = self.old_code as u16;
                self.prefix[new_code as usize] = self.first_code as u16;
                self.max_code += 1;
                if self.max_code >= self.max_code_size && (self.max_code_size as usize) < DICT_SIZE {
                    self.max_code_size <<= 1;
                    self.code_size += 1;
                }
            }

            self.old_code = incode as i32;
            if self.sp > 0 {
                self.sp -= 1;
                return Ok(self.stack[self.sp] as i32);
            }
            // Every push above makes sp > 0 by construction; this is the
            // same defensive loop-back the source has for a path that
            // should be unreachable.
        }
    }

    fn push(&mut self, byte: u8) {
        self.stack[self.sp] = byte;
        self.sp += 1;
    }
}

/// Read one length-prefixed GIF data sub-block into `dest` (or skip it
/// past the file position if the declared length exceeds `dest`'s
/// capacity). Returns the declared length, `0` signalling the block
/// terminator.
fn read_data_block<FH: FileHandle>(file: &mut FH, dest: &mut [u8]) -> Result<usize, LoadError<FH::Error>> {
    let mut len_byte = [0u8; 1];
    file.read(&mut len_byte).map_err(LoadError::Io)?;
    let cnt = len_byte[0] as usize;
    if cnt == 0 {
        return Ok(0);
    }
    if cnt > dest.len() {
        let pos = file.tell();
        file.seek(pos + cnt as u32).map_err(LoadError::Io)?;
        return Ok(cnt);
    }
    file.read(&mut dest[..cnt]).map_err(LoadError::Io)?;
    Ok(cnt)
}

/// Skip over a single data sub-block (used for extension blocks the
/// decoder doesn't otherwise need the payload of).
pub fn skip_data_block<FH: FileHandle>(file: &mut FH) -> Result<usize, LoadError<FH::Error>> {
    let mut len_byte = [0u8; 1];
    file.read(&mut len_byte).map_err(LoadError::Io)?;
    let cnt = len_byte[0] as usize;
    if cnt > 0 {
        let pos = file.tell();
        file.seek(pos + cnt as u32).map_err(LoadError::Io)?;
    }
    Ok(cnt)
}
