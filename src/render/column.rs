//! Vertical-run compositor for the bit-packed framebuffer.
//!
//! Both walls and sprites funnel through here. A run is described by a
//! screen row range plus a 16-bit texture column; the texel cursor is an
//! add-and-carry accumulator: one u8 fractional add per pixel decides
//! whether the texture shifts down a row, and an integer step covers
//! minification below 1:1. No multiply or divide survives inside the
//! per-pixel loops; the single reciprocal per wall column happens up front
//! in [`wall_run`].
//!
//! Runs are written in three phases: a partial leading byte, whole interior
//! bytes, and a partial trailing byte. A run that begins and ends inside
//! one byte is handled entirely by the leading phase.

use super::{Framebuffer, ShadePolarity};
use crate::fixed::{UFix8, UFix16};
use crate::texture::TILE_SIZE;

/// Wall-height clamp for degenerate (near-zero) distances.
const MAX_LINE_HEIGHT: u32 = 32768;
const MIN_LINE_DIST: f32 = 1.0 / MAX_LINE_HEIGHT as f32;

/// 16-bit shift that tolerates counts ≥ 16.
#[inline]
fn shr16(v: u16, n: u16) -> u16 {
    if n >= 16 { 0 } else { v >> n }
}

/// Texel cursor state shared by the wall and sprite loops.
#[derive(Clone, Copy)]
struct Cursor {
    accum: u8,
    accu_step: u8,
    full_step: u16,
}

impl Cursor {
    /// Advance one screen pixel; returns how many source rows to shift.
    #[inline]
    fn advance(&mut self) -> u16 {
        let (a, carry) = self.accum.overflowing_add(self.accu_step);
        self.accum = a;
        self.full_step + carry as u16
    }
}

/// Screen extent, texel step, and skipped-texel count for one wall column
/// at `dist`.
///
/// Contains the only division on the wall path: one reciprocal to turn the
/// perpendicular distance into a pixel height. Distances below the safety
/// threshold clamp to [`MAX_LINE_HEIGHT`] instead of dividing. The last
/// element is the pixel count clipped off the top of the run; the texel
/// cursor starts that many steps in.
pub(crate) fn wall_run(dist: UFix8, view_h: u32) -> (u32, u32, UFix16, u16) {
    let inv_line_height = dist.to_f32() / view_h as f32;
    let step = UFix16::from_f32(TILE_SIZE as f32 * inv_line_height);

    let line_height = if inv_line_height <= MIN_LINE_DIST {
        MAX_LINE_HEIGHT
    } else {
        (1.0 / inv_line_height) as u32
    };

    let half = (line_height >> 1) as i64;
    let mid = (view_h >> 1) as i64;
    let y_start = (mid - half).max(0) as u32;
    let y_end = ((mid + half) as u64).min(view_h as u64) as u32;
    let skipped = (y_start as i64 + half - mid).max(0) as u16;
    (y_start, y_end, step, skipped)
}

/// Composite one wall column: texture bits gated by the dither shade.
#[allow(clippy::too_many_arguments)]
pub(crate) fn draw_wall_column(
    fb: &mut Framebuffer,
    x: u32,
    dist: UFix8,
    shade: u8,
    strip: u16,
    view_h: u32,
    polarity: ShadePolarity,
    corner_shadow: bool,
) {
    let (y_start, y_end, step, skipped) = wall_run(dist, view_h);
    if y_start >= y_end {
        return;
    }
    let tex_pos = step.mul_int(skipped);

    let mut cursor = Cursor {
        accum: tex_pos.frac_hi(),
        accu_step: step.frac_hi(),
        full_step: step.int_part(),
    };
    let mut strip = shr16(strip, tex_pos.int_part());

    let darken = matches!(polarity, ShadePolarity::Darken);
    let start_page = y_start >> 3;
    let end_page = y_end >> 3;
    let mut page = start_page;

    let plot = |byte: &mut u8, bm: u8, strip: u16| {
        let lit = if darken {
            (shade & bm != 0) && (strip & 1 != 0)
        } else {
            (shade & bm == 0) || (strip & 1 != 0)
        };
        if lit {
            *byte |= bm;
        } else {
            *byte &= !bm;
        }
    };

    // Partial leading byte
    if y_start & 7 != 0 {
        let idx = fb.byte_index(page, x);
        let byte = &mut fb.bits_mut()[idx];
        let end_first = ((page + 1) * 8).min(y_end);
        let mut bm = 1u8 << (y_start & 7);
        for _ in y_start..end_first {
            plot(byte, bm, strip);
            strip = shr16(strip, cursor.advance());
            bm = bm.wrapping_shl(1);
        }
        page += 1;
    }

    // Whole interior bytes
    while page < end_page {
        let idx = fb.byte_index(page, x);
        let byte = &mut fb.bits_mut()[idx];
        let mut bm = 1u8;
        for _ in 0..8 {
            plot(byte, bm, strip);
            strip = shr16(strip, cursor.advance());
            bm = bm.wrapping_shl(1);
        }
        page += 1;
    }

    // Partial trailing byte. Skipped when the leading byte already covered
    // the whole run; the geometry of a centered wall never produces a
    // trailing-only partial.
    if y_end & 7 != 0 && start_page != end_page {
        let idx = fb.byte_index(page, x);
        let mut byte = fb.bits_mut()[idx];
        let mut bm = 1u8;
        for _ in (page * 8)..y_end {
            plot(&mut byte, bm, strip);
            strip = shr16(strip, cursor.advance());
            bm = bm.wrapping_shl(1);
        }
        if corner_shadow {
            // Force the first uncovered row dark so walls separate from
            // the floor even at full brightness.
            byte &= !(1u8 << (y_end & 7));
        }
        fb.bits_mut()[idx] = byte;
    }
}

/// Composite one sprite column. Same three-phase walk, but every pixel is
/// gated by the mask strip: mask 0 leaves the background untouched.
#[allow(clippy::too_many_arguments)]
pub(crate) fn draw_sprite_column(
    fb: &mut Framebuffer,
    x: u32,
    y_start: u32,
    y_end: u32,
    strip: u16,
    mask: u16,
    tex_y: UFix8,
    step_y: UFix8,
) {
    if y_start >= y_end {
        return;
    }

    let preshift = tex_y.int_part() as u16;
    let mut strip = shr16(strip, preshift);
    let mut mask = shr16(mask, preshift);
    if mask == 0 {
        return; // fully transparent from here down
    }

    let mut cursor = Cursor {
        accum: tex_y.frac_byte(),
        accu_step: step_y.frac_byte(),
        full_step: step_y.int_part() as u16,
    };

    let start_page = y_start >> 3;
    let end_page = y_end >> 3;
    let mut page = start_page;

    let plot = |byte: &mut u8, bm: u8, strip: u16, mask: u16| {
        if mask & 1 != 0 {
            if strip & 1 != 0 {
                *byte |= bm;
            } else {
                *byte &= !bm;
            }
        }
    };

    // Leading partial byte; also the whole run when it never leaves its
    // first byte, which a short sprite can do even from a page-aligned
    // start (unlike a wall run, which is centered).
    if y_start & 7 != 0 || start_page == end_page {
        let idx = fb.byte_index(page, x);
        let byte = &mut fb.bits_mut()[idx];
        let end_first = ((page + 1) * 8).min(y_end);
        let mut bm = 1u8 << (y_start & 7);
        for _ in y_start..end_first {
            plot(byte, bm, strip, mask);
            let n = cursor.advance();
            strip = shr16(strip, n);
            mask = shr16(mask, n);
            bm = bm.wrapping_shl(1);
        }
        page += 1;
    }

    while page < end_page {
        let idx = fb.byte_index(page, x);
        let byte = &mut fb.bits_mut()[idx];
        let mut bm = 1u8;
        for _ in 0..8 {
            plot(byte, bm, strip, mask);
            let n = cursor.advance();
            strip = shr16(strip, n);
            mask = shr16(mask, n);
            bm = bm.wrapping_shl(1);
        }
        page += 1;
    }

    if y_end & 7 != 0 && start_page != end_page {
        let idx = fb.byte_index(page, x);
        let byte = &mut fb.bits_mut()[idx];
        let mut bm = 1u8;
        for _ in (page * 8)..y_end {
            plot(byte, bm, strip, mask);
            let n = cursor.advance();
            strip = shr16(strip, n);
            mask = shr16(mask, n);
            bm = bm.wrapping_shl(1);
        }
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
