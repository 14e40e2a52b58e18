// Column-addressable texture storage. The renderer only ever asks one
// question: "give me column `x` of frame `f` as 16 vertical bits", so the
// seam is a single-method trait and backends can be in-memory sheets or an
// external byte-addressable store.

use thiserror::Error;

/// Textures are square, `TILE_SIZE` × `TILE_SIZE`, one bit per pixel.
pub const TILE_SIZE: u8 = 16;

/// Bytes per frame in a packed sheet: 16 columns × 2 bytes.
pub const FRAME_BYTES: usize = TILE_SIZE as usize * 2;

/// Synchronous, deterministic, random-access column reads.
///
/// Bit `n` of the returned pattern is pixel row `n` of the column, top to
/// bottom. `frame` and `x` are caller-guaranteed valid; this is the pixel
/// loop's only data dependency, so implementations must not block on
/// anything slower than a memory or flash read.
pub trait ColumnStore {
    fn column(&self, frame: u8, x: u8) -> u16;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SheetError {
    #[error("sheet holds {0} bytes, not a multiple of {FRAME_BYTES}")]
    Truncated(usize),

    #[error("sheet is empty")]
    Empty,
}

/// In-memory sheet of packed 16×16 frames.
///
/// Layout per frame: 16 low bytes (rows 0..8 of each column) followed by
/// 16 high bytes (rows 8..16), the native format of 1-bpp sprite sheets on
/// page-addressed displays.
#[derive(Clone, Debug)]
pub struct Sheet {
    bytes: Vec<u8>,
    frames: u8,
}

impl Sheet {
    pub fn new(bytes: Vec<u8>) -> Result<Self, SheetError> {
        if bytes.is_empty() {
            return Err(SheetError::Empty);
        }
        if bytes.len() % FRAME_BYTES != 0 {
            return Err(SheetError::Truncated(bytes.len()));
        }
        let frames = (bytes.len() / FRAME_BYTES).min(u8::MAX as usize) as u8;
        Ok(Sheet { bytes, frames })
    }

    /// Build a sheet from per-column bit patterns, one `[u16; 16]` per
    /// frame. Handy for tests and generated art.
    pub fn from_strips(frames: &[[u16; TILE_SIZE as usize]]) -> Self {
        let mut bytes = Vec::with_capacity(frames.len() * FRAME_BYTES);
        for frame in frames {
            for col in frame {
                bytes.push(*col as u8);
            }
            for col in frame {
                bytes.push((*col >> 8) as u8);
            }
        }
        // Cannot fail: length is frames * FRAME_BYTES by construction
        Sheet {
            frames: frames.len().min(u8::MAX as usize) as u8,
            bytes,
        }
    }

    /// One frame, every column the same pattern. Test helper.
    pub fn uniform(pattern: u16) -> Self {
        Sheet::from_strips(&[[pattern; TILE_SIZE as usize]])
    }

    #[inline]
    pub fn frames(&self) -> u8 {
        self.frames
    }
}

impl ColumnStore for Sheet {
    #[inline]
    fn column(&self, frame: u8, x: u8) -> u16 {
        let base = frame as usize * FRAME_BYTES + x as usize;
        self.bytes[base] as u16 | (self.bytes[base + TILE_SIZE as usize] as u16) << 8
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_roundtrip() {
        let mut strips = [[0u16; 16]; 2];
        strips[0][3] = 0xA5C3;
        strips[1][15] = 0x0001;
        let sheet = Sheet::from_strips(&strips);
        assert_eq!(sheet.frames(), 2);
        assert_eq!(sheet.column(0, 3), 0xA5C3);
        assert_eq!(sheet.column(0, 4), 0);
        assert_eq!(sheet.column(1, 15), 0x0001);
    }

    #[test]
    fn byte_layout_matches_packed_format() {
        // Column 0: low byte 0x0F (rows 0-3 lit), high byte 0x80 (row 15)
        let mut bytes = vec![0u8; FRAME_BYTES];
        bytes[0] = 0x0F;
        bytes[16] = 0x80;
        let sheet = Sheet::new(bytes).unwrap();
        assert_eq!(sheet.column(0, 0), 0x800F);
    }

    #[test]
    fn bad_lengths_rejected() {
        assert_eq!(Sheet::new(vec![]).unwrap_err(), SheetError::Empty);
        assert_eq!(
            Sheet::new(vec![0; 33]).unwrap_err(),
            SheetError::Truncated(33)
        );
    }
}
