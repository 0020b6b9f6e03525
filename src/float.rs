//! IEEE-754 width conversions used by the wire codec.
//!
//! Conversions here work on bit patterns so NaN payloads survive a narrowing/widening round trip.

const F64_EXP_MASK: u64 = 0x7ff0_0000_0000_0000;
const F64_MANT_MASK: u64 = 0x000f_ffff_ffff_ffff;

/// The narrowest IEEE width that reproduces a float64 bit pattern exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatWidth {
    /// Half precision bits (major 7, ai 25).
    Half(u16),
    /// Single precision bits (major 7, ai 26).
    Single(u32),
    /// Double precision bits (major 7, ai 27).
    Double(u64),
}

#[inline]
const fn is_nan_bits(bits: u64) -> bool {
    (bits & F64_EXP_MASK) == F64_EXP_MASK && (bits & F64_MANT_MASK) != 0
}

/// Narrow a float64 to float32 bits if that is lossless, payload included for NaN.
#[must_use]
pub fn f64_to_f32_exact(value: f64) -> Option<u32> {
    let bits = value.to_bits();
    if is_nan_bits(bits) {
        let mant = bits & F64_MANT_MASK;
        if mant & ((1 << 29) - 1) != 0 {
            return None;
        }
        let sign = ((bits >> 63) as u32) << 31;
        return Some(sign | 0x7f80_0000 | (mant >> 29) as u32);
    }
    #[allow(clippy::cast_possible_truncation)]
    let single = value as f32;
    if f64::from(single).to_bits() == bits {
        Some(single.to_bits())
    } else {
        None
    }
}

/// Narrow float32 bits to float16 bits if that is lossless.
#[must_use]
pub const fn f32_to_f16_exact(bits: u32) -> Option<u16> {
    let sign = ((bits >> 16) & 0x8000) as u16;
    let exp = ((bits >> 23) & 0xff) as i32;
    let mant = bits & 0x007f_ffff;

    if exp == 0xff {
        if mant & 0x1fff != 0 {
            return None;
        }
        return Some(sign | 0x7c00 | (mant >> 13) as u16);
    }
    if exp == 0 {
        // Zero narrows; float32 subnormals are far below the float16 range.
        return if mant == 0 { Some(sign) } else { None };
    }

    let e = exp - 127;
    if e > 15 {
        return None;
    }
    if e >= -14 {
        if mant & 0x1fff != 0 {
            return None;
        }
        return Some(sign | (((e + 15) as u16) << 10) | (mant >> 13) as u16);
    }
    if e >= -24 {
        let significand = mant | 0x0080_0000;
        let shift = (13 + (-14 - e)) as u32;
        if significand & ((1 << shift) - 1) != 0 {
            return None;
        }
        return Some(sign | (significand >> shift) as u16);
    }
    None
}

/// Pick the narrowest width that reproduces `value` bit-for-bit.
#[must_use]
pub fn shortest_width(value: f64) -> FloatWidth {
    match f64_to_f32_exact(value) {
        Some(single) => match f32_to_f16_exact(single) {
            Some(half) => FloatWidth::Half(half),
            None => FloatWidth::Single(single),
        },
        None => FloatWidth::Double(value.to_bits()),
    }
}

/// Widen float16 bits to a float64.
#[must_use]
pub fn f16_to_f64(half: u16) -> f64 {
    let negative = half & 0x8000 != 0;
    let exp = i32::from((half >> 10) & 0x1f);
    let mant = u64::from(half & 0x03ff);

    if exp == 0x1f {
        let sign = if negative { 1u64 << 63 } else { 0 };
        return f64::from_bits(sign | F64_EXP_MASK | (mant << 42));
    }
    #[allow(clippy::cast_precision_loss)]
    let magnitude = if exp == 0 {
        (mant as f64) * 2f64.powi(-24)
    } else {
        ((mant + 1024) as f64) * 2f64.powi(exp - 25)
    };
    if negative {
        -magnitude
    } else {
        magnitude
    }
}

/// Widen float32 bits to a float64, keeping NaN payloads.
#[must_use]
pub fn f32_to_f64(bits: u32) -> f64 {
    if bits & 0x7f80_0000 == 0x7f80_0000 && bits & 0x007f_ffff != 0 {
        let sign = u64::from(bits >> 31) << 63;
        return f64::from_bits(sign | F64_EXP_MASK | (u64::from(bits & 0x007f_ffff) << 29));
    }
    f64::from(f32::from_bits(bits))
}
