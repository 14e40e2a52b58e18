//! Fixed-point numeric kernel.
//!
//! The render path never divides per pixel; everything is expressed with
//! these low-range types plus one reciprocal table. `UFix8` covers map-space
//! distances (the map is at most 16 cells on a side, so 8 integer bits are
//! plenty), `IFix8` covers signed ray components, `PackFix4` is the compact
//! storage form for sprite positions, and `UFix16` exists only for the
//! high-precision texture stepping inside the column compositor.

use once_cell::sync::Lazy;

/// Unsigned Q8.8. The workhorse of the DDA: side distances, deltas,
/// perpendicular wall distance, texture steps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct UFix8(u16);

/// Signed Q7.8 for ray-direction components.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct IFix8(i16);

/// Unsigned Q4.4. Enough to place anything inside a 16-wide map with
/// sub-cell resolution; used to keep sprite slots small.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct PackFix4(u8);

/// Unsigned Q16.16, column-compositor only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct UFix16(u32);

/// Largest representable `UFix8` (just under 256).
pub const MAX_FIXED: UFix8 = UFix8(u16::MAX);

/// Below this magnitude a ray component is treated as axis-aligned and the
/// corresponding axis never steps. Must satisfy `1 / NEAR_ZERO < MAX_FIXED`.
pub const NEAR_ZERO: UFix8 = UFix8(2); // 1/128

impl UFix8 {
    pub const ZERO: UFix8 = UFix8(0);
    pub const ONE: UFix8 = UFix8(0x100);

    #[inline]
    pub const fn from_bits(bits: u16) -> Self {
        UFix8(bits)
    }

    #[inline]
    pub const fn to_bits(self) -> u16 {
        self.0
    }

    #[inline]
    pub const fn from_int(v: u8) -> Self {
        UFix8((v as u16) << 8)
    }

    /// Saturating conversion; negative input clamps to zero.
    #[inline]
    pub fn from_f32(v: f32) -> Self {
        UFix8((v * 256.0).clamp(0.0, u16::MAX as f32) as u16)
    }

    #[inline]
    pub fn to_f32(self) -> f32 {
        self.0 as f32 / 256.0
    }

    #[inline]
    pub const fn int_part(self) -> u8 {
        (self.0 >> 8) as u8
    }

    /// Fractional bits as a 0..256 byte.
    #[inline]
    pub const fn frac_byte(self) -> u8 {
        self.0 as u8
    }

    /// Fraction stripped, integer part kept.
    #[inline]
    pub const fn floor(self) -> Self {
        UFix8(self.0 & 0xFF00)
    }

    /// Integer part stripped, fraction kept.
    #[inline]
    pub const fn fract(self) -> Self {
        UFix8(self.0 & 0x00FF)
    }

    #[inline]
    pub const fn saturating_add(self, rhs: Self) -> Self {
        UFix8(self.0.saturating_add(rhs.0))
    }

    #[inline]
    pub const fn saturating_sub(self, rhs: Self) -> Self {
        UFix8(self.0.saturating_sub(rhs.0))
    }

    #[inline]
    pub const fn halved(self) -> Self {
        UFix8(self.0 >> 1)
    }
}

/// Widening multiply, saturating on overflow.
impl core::ops::Mul for UFix8 {
    type Output = UFix8;
    #[inline]
    fn mul(self, rhs: UFix8) -> UFix8 {
        let wide = (self.0 as u32 * rhs.0 as u32) >> 8;
        UFix8(wide.min(u16::MAX as u32) as u16)
    }
}

impl core::ops::Add for UFix8 {
    type Output = UFix8;
    #[inline]
    fn add(self, rhs: UFix8) -> UFix8 {
        self.saturating_add(rhs)
    }
}

impl core::ops::AddAssign for UFix8 {
    #[inline]
    fn add_assign(&mut self, rhs: UFix8) {
        *self = self.saturating_add(rhs);
    }
}

impl core::ops::Sub for UFix8 {
    type Output = UFix8;
    #[inline]
    fn sub(self, rhs: UFix8) -> UFix8 {
        self.saturating_sub(rhs)
    }
}

impl IFix8 {
    #[inline]
    pub fn from_f32(v: f32) -> Self {
        IFix8((v * 256.0).clamp(i16::MIN as f32, i16::MAX as f32) as i16)
    }

    #[inline]
    pub fn to_f32(self) -> f32 {
        self.0 as f32 / 256.0
    }

    #[inline]
    pub fn abs_ufix(self) -> UFix8 {
        UFix8(self.0.unsigned_abs())
    }

    #[inline]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }
}

impl PackFix4 {
    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        PackFix4(bits)
    }

    #[inline]
    pub const fn to_bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub fn from_f32(v: f32) -> Self {
        PackFix4((v * 16.0).clamp(0.0, u8::MAX as f32) as u8)
    }

    #[inline]
    pub fn to_f32(self) -> f32 {
        self.0 as f32 / 16.0
    }

    /// Widen back to Q8.8. Exact; `PackFix4` is a strict subset.
    #[inline]
    pub const fn widen(self) -> UFix8 {
        UFix8((self.0 as u16) << 4)
    }
}

impl From<UFix8> for PackFix4 {
    /// Truncating: drops the low 4 fraction bits and the top 4 integer bits.
    /// Caller keeps coordinates inside the 16-cell map range.
    #[inline]
    fn from(v: UFix8) -> PackFix4 {
        PackFix4((v.to_bits() >> 4) as u8)
    }
}

impl UFix16 {
    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        UFix16(bits)
    }

    #[inline]
    pub fn from_f32(v: f32) -> Self {
        UFix16((v * 65536.0).clamp(0.0, u32::MAX as f32) as u32)
    }

    #[inline]
    pub const fn int_part(self) -> u16 {
        (self.0 >> 16) as u16
    }

    /// Top byte of the fraction; the accumulator resolution of the
    /// column compositor.
    #[inline]
    pub const fn frac_hi(self) -> u8 {
        (self.0 >> 8) as u8
    }

    /// Multiply by a small integer (screen-pixel counts).
    #[inline]
    pub const fn mul_int(self, n: u16) -> Self {
        UFix16(self.0.wrapping_mul(n as u32))
    }
}

/// `DIVISORS[i] = 65535 / i` in internal units: the Q8.8 reciprocal of the
/// Q8.8 value whose low byte is `i`. One table serves the whole engine.
static DIVISORS: Lazy<[u16; 256]> = Lazy::new(|| {
    let mut t = [0u16; 256];
    t[0] = u16::MAX;
    let mut i = 1usize;
    while i < 256 {
        t[i] = (u16::MAX as u32 / i as u32) as u16;
        i += 1;
    }
    t
});

/// Reciprocal of a value near unit magnitude, no division.
///
/// Exact-table range is (0, 1); inputs in [1, 2) are halved before lookup
/// and the result halved after, trading precision for range. Callers must
/// pre-scale into ~[1/128, 2); in the raycaster this holds because ray
/// components are guarded by [`NEAR_ZERO`] and never exceed 2.
#[inline]
pub fn recip_near_unit(x: UFix8) -> UFix8 {
    if x.int_part() != 0 {
        UFix8::from_bits(DIVISORS[((x.to_bits() >> 1) & 0xFF) as usize] >> 1)
    } else {
        UFix8::from_bits(DIVISORS[(x.to_bits() & 0xFF) as usize])
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ufix8_roundtrip_and_parts() {
        let v = UFix8::from_f32(3.5);
        assert_eq!(v.int_part(), 3);
        assert_eq!(v.frac_byte(), 128);
        assert!((v.to_f32() - 3.5).abs() < 1e-6);
        assert_eq!(UFix8::from_int(7).to_bits(), 0x0700);
    }

    #[test]
    fn ufix8_saturates_instead_of_wrapping() {
        let big = UFix8::from_int(200);
        assert_eq!(big + big, MAX_FIXED);
        assert_eq!(UFix8::ZERO - UFix8::ONE, UFix8::ZERO);
        assert_eq!(big * big, MAX_FIXED); // 40000 overflows Q8.8
    }

    #[test]
    fn ufix8_mul_matches_float() {
        let a = UFix8::from_f32(1.25);
        let b = UFix8::from_f32(2.5);
        assert!(((a * b).to_f32() - 3.125).abs() < 0.01);
    }

    #[test]
    fn packfix4_widen_is_exact() {
        let p = PackFix4::from_f32(9.75);
        assert_eq!(p.widen().to_f32(), 9.75);
        // Truncation from Q8.8 keeps the coarse fraction
        let q: PackFix4 = UFix8::from_f32(3.96).into();
        assert!((q.to_f32() - 3.9375).abs() < 1e-6);
    }

    #[test]
    fn recip_inside_unit_range() {
        for &v in &[0.25f32, 0.5, 0.75, 0.99] {
            let r = recip_near_unit(UFix8::from_f32(v)).to_f32();
            assert!(
                (r - 1.0 / v).abs() < 0.05,
                "1/{v} came out as {r}"
            );
        }
    }

    #[test]
    fn recip_outer_range_loses_precision_but_works() {
        for &v in &[1.0f32, 1.25, 1.5, 1.9] {
            let r = recip_near_unit(UFix8::from_f32(v)).to_f32();
            assert!(
                (r - 1.0 / v).abs() < 0.1,
                "1/{v} came out as {r}"
            );
        }
    }

    #[test]
    fn recip_never_exceeds_fixed_range() {
        // Smallest guarded input: reciprocal must stay below MAX_FIXED
        let r = recip_near_unit(NEAR_ZERO);
        assert!(r < MAX_FIXED);
        assert!(r.to_f32() > 100.0);
    }

    #[test]
    fn ufix16_stepping_parts() {
        let s = UFix16::from_f32(2.5);
        assert_eq!(s.int_part(), 2);
        assert_eq!(s.frac_hi(), 128);
        assert_eq!(s.mul_int(4).int_part(), 10);
    }
}
