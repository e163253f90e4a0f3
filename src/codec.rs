//! Primitive readers and writers for the field types found in SEG-Y and
//! Seismic Unix streams: 2- and 4-byte two's-complement integers in either
//! byte order, IBM System/360 single precision floats, and IEEE 754 single
//! precision floats. All values decode to a canonical `f64`/integer
//! representation. Pure functions, no I/O.

use serde::{Deserialize, Serialize};

use crate::error::{SegyError, SegyResult};

/// Byte order of multi-byte fields in a stream.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Big,
    Little,
}

impl core::fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ByteOrder::Big => write!(f, "big"),
            ByteOrder::Little => write!(f, "little"),
        }
    }
}

#[inline]
fn take2(bytes: &[u8]) -> SegyResult<[u8; 2]> {
    match bytes.get(..2) {
        Some(b) => Ok([b[0], b[1]]),
        None => Err(SegyError::InsufficientBytes {
            expected: 2,
            actual: bytes.len(),
        }),
    }
}

#[inline]
fn take4(bytes: &[u8]) -> SegyResult<[u8; 4]> {
    match bytes.get(..4) {
        Some(b) => Ok([b[0], b[1], b[2], b[3]]),
        None => Err(SegyError::InsufficientBytes {
            expected: 4,
            actual: bytes.len(),
        }),
    }
}

#[inline]
pub fn read_i16(bytes: &[u8], order: ByteOrder) -> SegyResult<i16> {
    let b = take2(bytes)?;
    Ok(match order {
        ByteOrder::Big => i16::from_be_bytes(b),
        ByteOrder::Little => i16::from_le_bytes(b),
    })
}

#[inline]
pub fn read_u16(bytes: &[u8], order: ByteOrder) -> SegyResult<u16> {
    let b = take2(bytes)?;
    Ok(match order {
        ByteOrder::Big => u16::from_be_bytes(b),
        ByteOrder::Little => u16::from_le_bytes(b),
    })
}

#[inline]
pub fn read_i32(bytes: &[u8], order: ByteOrder) -> SegyResult<i32> {
    let b = take4(bytes)?;
    Ok(match order {
        ByteOrder::Big => i32::from_be_bytes(b),
        ByteOrder::Little => i32::from_le_bytes(b),
    })
}

/// 16^e by repeated squaring. Exact for the whole IBM exponent range
/// because every factor is a power of two.
fn pow16(e: i32) -> f64 {
    let mut r = 1.0f64;
    let mut base = if e < 0 { 0.0625 } else { 16.0 };
    let mut n = e.unsigned_abs();
    while n > 0 {
        if n & 1 == 1 {
            r *= base;
        }
        base *= base;
        n >>= 1;
    }
    r
}

/// Decode an IBM System/360 single precision float.
///
/// Layout: 1 sign bit, 7-bit excess-64 base-16 exponent, 24-bit mantissa
/// with no implicit leading bit. value = sign * mantissa/2^24 * 16^(exp-64).
/// All-zero bytes decode to exactly 0.0; no normalization is attempted.
pub fn read_ibm_f32(bytes: &[u8], order: ByteOrder) -> SegyResult<f64> {
    let b = take4(bytes)?;
    let word = match order {
        ByteOrder::Big => u32::from_be_bytes(b),
        ByteOrder::Little => u32::from_le_bytes(b),
    };
    let mantissa = (word & 0x00ff_ffff) as f64;
    if mantissa == 0.0 {
        return Ok(0.0);
    }
    let sign = if word >> 31 == 1 { -1.0 } else { 1.0 };
    let exponent = ((word >> 24) & 0x7f) as i32;
    Ok(sign * (mantissa / 16_777_216.0) * pow16(exponent - 64))
}

/// Decode an IEEE 754 single precision float.
pub fn read_ieee_f32(bytes: &[u8], order: ByteOrder) -> SegyResult<f64> {
    let b = take4(bytes)?;
    let word = match order {
        ByteOrder::Big => u32::from_be_bytes(b),
        ByteOrder::Little => u32::from_le_bytes(b),
    };
    Ok(f32::from_bits(word) as f64)
}

#[inline]
pub fn write_i16(value: i16, order: ByteOrder) -> [u8; 2] {
    match order {
        ByteOrder::Big => value.to_be_bytes(),
        ByteOrder::Little => value.to_le_bytes(),
    }
}

#[inline]
pub fn write_u16(value: u16, order: ByteOrder) -> [u8; 2] {
    match order {
        ByteOrder::Big => value.to_be_bytes(),
        ByteOrder::Little => value.to_le_bytes(),
    }
}

#[inline]
pub fn write_i32(value: i32, order: ByteOrder) -> [u8; 4] {
    match order {
        ByteOrder::Big => value.to_be_bytes(),
        ByteOrder::Little => value.to_le_bytes(),
    }
}

pub fn write_ieee_f32(value: f64, order: ByteOrder) -> [u8; 4] {
    let word = (value as f32).to_bits();
    match order {
        ByteOrder::Big => word.to_be_bytes(),
        ByteOrder::Little => word.to_le_bytes(),
    }
}

/// Encode a value as an IBM System/360 single precision float.
///
/// The magnitude is scaled into [1/16, 1) by a base-16 exponent, then the
/// 24-bit mantissa is rounded. Values beyond the representable range
/// saturate at the extreme exponents.
pub fn write_ibm_f32(value: f64, order: ByteOrder) -> [u8; 4] {
    let word = ibm_bits(value);
    match order {
        ByteOrder::Big => word.to_be_bytes(),
        ByteOrder::Little => word.to_le_bytes(),
    }
}

fn ibm_bits(value: f64) -> u32 {
    if value == 0.0 || !value.is_finite() {
        return 0;
    }
    let sign = if value.is_sign_negative() { 1u32 << 31 } else { 0 };
    let mag = if value < 0.0 { -value } else { value };

    // Unbiased base-2 exponent: mag = m * 2^e2 with m in [1, 2).
    let e2 = ((mag.to_bits() >> 52) & 0x7ff) as i32 - 1023;
    // mag * 16^-e16 lands in [1/16, 1).
    let mut e16 = e2.div_euclid(4) + 1;
    let mut mantissa = (mag * pow16(-e16) * 16_777_216.0 + 0.5) as u32;
    if mantissa >= 1 << 24 {
        // Rounded up to 1.0, renormalize one hex digit.
        mantissa >>= 4;
        e16 += 1;
    }
    let exponent = (e16 + 64).clamp(0, 127) as u32;
    sign | (exponent << 24) | (mantissa & 0x00ff_ffff)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn int_readers_both_orders() {
        assert_eq!(read_i16(&[0x01, 0x02], ByteOrder::Big).unwrap(), 0x0102);
        assert_eq!(read_i16(&[0x01, 0x02], ByteOrder::Little).unwrap(), 0x0201);
        assert_eq!(
            read_i32(&[0xff, 0xff, 0xff, 0xfe], ByteOrder::Big).unwrap(),
            -2
        );
        assert_eq!(
            read_i32(&[0xfe, 0xff, 0xff, 0xff], ByteOrder::Little).unwrap(),
            -2
        );
        assert_eq!(read_u16(&[0xff, 0xff], ByteOrder::Big).unwrap(), 65535);
    }

    #[test]
    fn short_input_is_rejected() {
        assert_eq!(
            read_i16(&[0x01], ByteOrder::Big),
            Err(SegyError::InsufficientBytes {
                expected: 2,
                actual: 1
            })
        );
        assert_eq!(
            read_ibm_f32(&[0x42, 0x76, 0xa0], ByteOrder::Big),
            Err(SegyError::InsufficientBytes {
                expected: 4,
                actual: 3
            })
        );
    }

    #[test]
    fn ibm_zero() {
        assert_eq!(read_ibm_f32(&[0, 0, 0, 0], ByteOrder::Big).unwrap(), 0.0);
        // Nonzero exponent bits with a zero mantissa still decode to 0.0.
        assert_eq!(read_ibm_f32(&[0x42, 0, 0, 0], ByteOrder::Big).unwrap(), 0.0);
    }

    #[test]
    fn ibm_reference_value() {
        // 0x4276A000 is the canonical 118.625 test pattern.
        let v = read_ibm_f32(&[0x42, 0x76, 0xa0, 0x00], ByteOrder::Big).unwrap();
        assert!((v - 118.625).abs() < 1e-6);
        let v = read_ibm_f32(&[0xc2, 0x76, 0xa0, 0x00], ByteOrder::Big).unwrap();
        assert!((v + 118.625).abs() < 1e-6);
        let v = read_ibm_f32(&[0x00, 0xa0, 0x76, 0x42], ByteOrder::Little).unwrap();
        assert!((v - 118.625).abs() < 1e-6);
    }

    #[test]
    fn ibm_encode_reference_value() {
        assert_eq!(
            write_ibm_f32(118.625, ByteOrder::Big),
            [0x42, 0x76, 0xa0, 0x00]
        );
        assert_eq!(
            write_ibm_f32(-118.625, ByteOrder::Big),
            [0xc2, 0x76, 0xa0, 0x00]
        );
        assert_eq!(write_ibm_f32(0.0, ByteOrder::Big), [0, 0, 0, 0]);
    }

    #[test]
    fn ibm_round_trip() {
        for &v in &[1.0, -1.0, 0.125, 3.1415926, -1234.5678, 1e-6, 1e6] {
            let bytes = write_ibm_f32(v, ByteOrder::Big);
            let back = read_ibm_f32(&bytes, ByteOrder::Big).unwrap();
            assert!(
                (back - v).abs() <= v.abs() * 1e-6,
                "{} decoded to {}",
                v,
                back
            );
        }
    }

    #[test]
    fn ieee_round_trip() {
        for &v in &[0.0, 1.5, -2.25, 1e10, -1e-10] {
            let bytes = write_ieee_f32(v, ByteOrder::Little);
            assert_eq!(read_ieee_f32(&bytes, ByteOrder::Little).unwrap(), v);
        }
    }
}
