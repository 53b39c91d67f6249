//! Bit-level helpers for pulling IEEE-754 doubles apart and putting them
//! back together again. The bucket mapping has to be exact for every finite
//! positive double, subnormals included, so everything in here works on the
//! raw representation rather than float arithmetic that is free to round.
//! Don't reach for these outside the mapping, they make no attempt to be a
//! general purpose float library.

use std::sync::LazyLock;

use libc::c_int;

pub(crate) const MANTISSA_BITS: u32 = 52;
pub(crate) const MANTISSA_MASK: u64 = 0x000f_ffff_ffff_ffff;
pub(crate) const EXPONENT_MASK: u64 = 0x7ff0_0000_0000_0000;
pub(crate) const EXPONENT_BIAS: i64 = 1023;
/// Unbiased exponent of the smallest positive subnormal, `f64::from_bits(1)`.
pub(crate) const MIN_SUBNORMAL_EXPONENT: i64 = -1074;
pub(crate) const MAX_EXPONENT: i64 = 1023;

mod ffi {
    use libc::{c_double, c_int};

    extern "C" {
        pub fn ldexp(x: c_double, n: c_int) -> c_double;
    }
}

/// Leading zero count of every possible byte. Built once, read forever.
static BYTE_LEADING_ZEROS: LazyLock<[u8; 256]> = LazyLock::new(|| {
    let mut table = [8u8; 256];
    for byte in 1u16..256 {
        let mut value = byte as u8;
        let mut zeros = 0;
        while value & 0x80 == 0 {
            zeros += 1;
            value <<= 1;
        }
        table[byte as usize] = zeros;
    }
    table
});

pub(crate) fn leading_zeros_u8(value: u8) -> u32 {
    BYTE_LEADING_ZEROS[value as usize] as u32
}

/// The wider widths cascade down by halves: if the high half is entirely
/// zero it contributes its full width and the low half decides the rest.
pub(crate) fn leading_zeros_u16(value: u16) -> u32 {
    let high = (value >> 8) as u8;
    if high == 0 {
        8 + leading_zeros_u8(value as u8)
    } else {
        leading_zeros_u8(high)
    }
}

pub(crate) fn leading_zeros_u32(value: u32) -> u32 {
    let high = (value >> 16) as u16;
    if high == 0 {
        16 + leading_zeros_u16(value as u16)
    } else {
        leading_zeros_u16(high)
    }
}

pub(crate) fn leading_zeros_u64(value: u64) -> u32 {
    let high = (value >> 32) as u32;
    if high == 0 {
        32 + leading_zeros_u32(value as u32)
    } else {
        leading_zeros_u32(high)
    }
}

/// Remainder in `[0, divisor)` regardless of the sign of `value`. The `%`
/// operator truncates toward zero, which is the wrong direction for the
/// fractional part of a negative bucket index.
pub(crate) fn positive_rem(value: i64, divisor: i64) -> i64 {
    debug_assert!(divisor > 0);
    ((value % divisor) + divisor) % divisor
}

/// True unless `value` is a NaN or an infinity. Both park their biased
/// exponent field at all ones.
pub(crate) fn is_finite(value: f64) -> bool {
    value.to_bits() & EXPONENT_MASK != EXPONENT_MASK
}

/// Compute `x * 2^n` for any exponent, the musl scalbn way: at most two
/// bounded multiplications walk `n` back into the representable band, then
/// the residual is built straight into a constructed double's exponent
/// field for the final multiply. Going below -1022 keeps the intermediate
/// 53 binary digits above the subnormal range so the result only rounds
/// once.
pub(crate) fn scale_by_exp2(x: f64, n: i32) -> f64 {
    let mut y = x;
    let mut m = n;

    if m > 1023 {
        y *= 2_f64.powi(1023);
        m -= 1023;
        if m > 1023 {
            y *= 2_f64.powi(1023);
            m -= 1023;
            if m > 1023 {
                m = 1023;
            }
        }
    } else if m < -1022 {
        y *= 2_f64.powi(-1022) * 2_f64.powi(53);
        m += 1022 - 53;
        if m < -1022 {
            y *= 2_f64.powi(-1022) * 2_f64.powi(53);
            m += 1022 - 53;
            if m < -1022 {
                m = -1022;
            }
        }
    }
    let bits: u64 = ((0x3ff + m) as u64) << MANTISSA_BITS;
    let res = y * f64::from_bits(bits);
    debug_assert_eq!(res, unsafe { ffi::ldexp(x, n as c_int) });
    res
}

/// Split a positive finite double into `(exponent, fraction)` such that
/// `value = 2^exponent * (1 + fraction / 2^52)`. Subnormals have no
/// implicit leading significand bit, so their effective exponent comes from
/// the position of the highest set mantissa bit and the remaining bits are
/// shifted up into a normalized 52-bit fraction. A zero fraction therefore
/// means the value is an exact power of two at every magnitude.
pub(crate) fn decompose(value: f64) -> (i64, u64) {
    let bits = value.to_bits();
    let biased = ((bits & EXPONENT_MASK) >> MANTISSA_BITS) as i64;
    let mantissa = bits & MANTISSA_MASK;
    if biased == 0 {
        debug_assert!(mantissa != 0, "decompose is undefined for zero");
        let msb = 63 - leading_zeros_u64(mantissa) as i64;
        let exponent = MIN_SUBNORMAL_EXPONENT + msb;
        let fraction = (mantissa << (MANTISSA_BITS as i64 - msb)) & MANTISSA_MASK;
        (exponent, fraction)
    } else {
        (biased - EXPONENT_BIAS, mantissa)
    }
}
