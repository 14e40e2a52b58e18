//! Ordered-dither shading tables.
//!
//! Distance shading on a 1-bit screen is a Bayer pattern: the quantized
//! squared distance picks one of seventeen 8×4 dither masks, from solid to
//! empty, and the wall compositor ANDs texture bits against the column's
//! mask byte. The patterns are stored four bytes per row so a column only
//! needs `x & 3` to find its byte.

use super::ShadePolarity;
use crate::fixed::UFix8;

/// Number of distinct dither gradients. Also the upper limit of the
/// quantized `distance² · darkness` metric; anything at or past it
/// renders fully dark.
pub const GRADIENTS: u8 = 16;

/// Bayer gradient rows, full coverage down to none. `GRADIENTS + 1` rows
/// of four column bytes.
pub(crate) const BAYER_SHADES: [[u8; 4]; GRADIENTS as usize + 1] = [
    [0xFF, 0xFF, 0xFF, 0xFF],
    [0xEE, 0xFF, 0xFF, 0xFF],
    [0xEE, 0xFF, 0xBB, 0xFF],
    [0xEE, 0xFF, 0xAA, 0xFF],
    [0xAA, 0xFF, 0xAA, 0xFF],
    [0xAA, 0xDD, 0xAA, 0xFF],
    [0xAA, 0xDD, 0xAA, 0x77],
    [0xAA, 0xDD, 0xAA, 0x55],
    [0xAA, 0x55, 0xAA, 0x55],
    [0xAA, 0x44, 0xAA, 0x55],
    [0xAA, 0x44, 0xAA, 0x11],
    [0xAA, 0x44, 0xAA, 0x00],
    [0xAA, 0x00, 0xAA, 0x00],
    [0x44, 0x00, 0xAA, 0x00],
    [0x44, 0x00, 0x22, 0x00],
    [0x44, 0x00, 0x00, 0x00],
    [0x00, 0x00, 0x00, 0x00],
];

/// Shade byte for a wall column at `dist`, screen column `x`.
///
/// The metric is `floor(dist² · darkness)`: quadratic falloff, so doubling
/// the light intensity (which halves `darkness` and widens the view
/// distance) pushes every gradient boundary out by √2.
#[inline]
pub fn shade_for(dist: UFix8, x: u32, darkness: UFix8) -> u8 {
    let metric = (dist * darkness * dist).int_part();
    if metric >= GRADIENTS {
        0
    } else {
        BAYER_SHADES[metric as usize][(x & 3) as usize]
    }
}

/// Apply a flat dither level over a screen region, page-aligned in Y like
/// `Framebuffer::clear_region`. `level` 0 leaves the region untouched for
/// `Darken` (full mask) and GRADIENTS wipes it; `Lighten` is the mirror
/// image, filling instead of clearing. Used for whole-screen fades.
pub fn shade_region(
    fb: &mut super::Framebuffer,
    level: u8,
    x: u32,
    y: u32,
    x2: u32,
    y2: u32,
    polarity: ShadePolarity,
) {
    let level = level.min(GRADIENTS) as usize;
    let x2 = x2.min(fb.width());
    let last_page = ((y2 >> 3) + if y2 & 7 != 0 { 1 } else { 0 }).min(fb.pages());
    let first_page = y >> 3;

    for col in x..x2 {
        let mask = BAYER_SHADES[level][(col & 3) as usize];
        for page in first_page..last_page {
            let idx = fb.byte_index(page, col);
            match polarity {
                ShadePolarity::Darken => fb.bits_mut()[idx] &= mask,
                ShadePolarity::Lighten => fb.bits_mut()[idx] |= !mask,
            }
        }
    }
}

/// Fractional fade amount mapped onto the gradient scale.
pub fn fade_level(amount: f32) -> u8 {
    (GRADIENTS as f32 * amount.abs()).round().min(GRADIENTS as f32) as u8
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
