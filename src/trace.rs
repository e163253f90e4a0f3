//! Per-trace structures: the 240-byte trace header that precedes each
//! sample block, the sample block codec itself, and the assembled [`Trace`].

use serde::{Deserialize, Serialize};

use crate::codec::{self, ByteOrder};
use crate::error::{SegyError, SegyResult};
use crate::header::SampleFormat;
use crate::lib::Vec;

/// Length of a trace header in bytes (identical for SEG-Y and SU).
pub const TRACE_HEADER_LEN: usize = 240;

#[inline]
fn field_i16(hd: &[u8], off: usize, order: ByteOrder) -> i16 {
    let b = [hd[off], hd[off + 1]];
    match order {
        ByteOrder::Big => i16::from_be_bytes(b),
        ByteOrder::Little => i16::from_le_bytes(b),
    }
}

#[inline]
fn field_u16(hd: &[u8], off: usize, order: ByteOrder) -> u16 {
    let b = [hd[off], hd[off + 1]];
    match order {
        ByteOrder::Big => u16::from_be_bytes(b),
        ByteOrder::Little => u16::from_le_bytes(b),
    }
}

#[inline]
fn field_i32(hd: &[u8], off: usize, order: ByteOrder) -> i32 {
    let b = [hd[off], hd[off + 1], hd[off + 2], hd[off + 3]];
    match order {
        ByteOrder::Big => i32::from_be_bytes(b),
        ByteOrder::Little => i32::from_le_bytes(b),
    }
}

/// trace sequence number within line:
///
/// |  type  | length | offset |
/// |--------|--------|--------|
/// | INT32  |   4    |    0   |
macro_rules! sequence_in_line {
    ($hd:expr, $order:expr) => {
        field_i32($hd, 0, $order)
    };
}

/// trace sequence number within file:
///
/// |  type  | length | offset |
/// |--------|--------|--------|
/// | INT32  |   4    |    4   |
macro_rules! sequence_in_file {
    ($hd:expr, $order:expr) => {
        field_i32($hd, 4, $order)
    };
}

/// original field record number:
///
/// |  type  | length | offset |
/// |--------|--------|--------|
/// | INT32  |   4    |    8   |
macro_rules! field_record {
    ($hd:expr, $order:expr) => {
        field_i32($hd, 8, $order)
    };
}

/// trace number within the original field record:
///
/// |  type  | length | offset |
/// |--------|--------|--------|
/// | INT32  |   4    |   12   |
macro_rules! trace_in_field_record {
    ($hd:expr, $order:expr) => {
        field_i32($hd, 12, $order)
    };
}

/// trace identification code:
///
/// |  type  | length | offset |
/// |--------|--------|--------|
/// | INT16  |   2    |   28   |
macro_rules! trace_id_code {
    ($hd:expr, $order:expr) => {
        field_i16($hd, 28, $order)
    };
}

/// number of samples in this trace:
///
/// |  type  | length | offset |
/// |--------|--------|--------|
/// | UINT16 |   2    |  114   |
macro_rules! num_samples {
    ($hd:expr, $order:expr) => {
        field_u16($hd, 114, $order)
    };
}

/// sample interval in microseconds for this trace:
///
/// |  type  | length | offset |
/// |--------|--------|--------|
/// | UINT16 |   2    |  116   |
macro_rules! trace_sample_interval {
    ($hd:expr, $order:expr) => {
        field_u16($hd, 116, $order)
    };
}

/// year data recorded:
///
/// |  type  | length | offset |
/// |--------|--------|--------|
/// | INT16  |   2    |  156   |
macro_rules! year {
    ($hd:expr, $order:expr) => {
        field_i16($hd, 156, $order)
    };
}

/// day of year:
///
/// |  type  | length | offset |
/// |--------|--------|--------|
/// | INT16  |   2    |  158   |
macro_rules! day_of_year {
    ($hd:expr, $order:expr) => {
        field_i16($hd, 158, $order)
    };
}

/// hour of day:
///
/// |  type  | length | offset |
/// |--------|--------|--------|
/// | INT16  |   2    |  160   |
macro_rules! hour {
    ($hd:expr, $order:expr) => {
        field_i16($hd, 160, $order)
    };
}

/// minute of hour:
///
/// |  type  | length | offset |
/// |--------|--------|--------|
/// | INT16  |   2    |  162   |
macro_rules! minute {
    ($hd:expr, $order:expr) => {
        field_i16($hd, 162, $order)
    };
}

/// second of minute:
///
/// |  type  | length | offset |
/// |--------|--------|--------|
/// | INT16  |   2    |  164   |
macro_rules! second {
    ($hd:expr, $order:expr) => {
        field_i16($hd, 164, $order)
    };
}

/// The decoded per-trace header. Owned by its trace's record; the decoder
/// holds no reference after yielding.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct TraceHeader {
    pub sequence_in_line: i32,
    pub sequence_in_file: i32,
    pub field_record: i32,
    pub trace_in_field_record: i32,
    pub trace_id_code: i16,
    /// Number of samples in this trace. Zero means "use the file-level
    /// default" from the binary header.
    pub num_samples: u16,
    /// Sample interval override in microseconds; zero defers to the file
    /// default.
    pub sample_interval_us: u16,
    pub year: i16,
    pub day_of_year: i16,
    pub hour: i16,
    pub minute: i16,
    pub second: i16,
}

impl TraceHeader {
    /// An all-zero header for file construction.
    pub fn new() -> Self {
        Self {
            sequence_in_line: 0,
            sequence_in_file: 0,
            field_record: 0,
            trace_in_field_record: 0,
            trace_id_code: 0,
            num_samples: 0,
            sample_interval_us: 0,
            year: 0,
            day_of_year: 0,
            hour: 0,
            minute: 0,
            second: 0,
        }
    }

    /// Parse a 240-byte trace header with the stream's byte order.
    pub fn parse(bytes: &[u8], order: ByteOrder) -> SegyResult<Self> {
        if bytes.len() < TRACE_HEADER_LEN {
            return Err(SegyError::InsufficientBytes {
                expected: TRACE_HEADER_LEN,
                actual: bytes.len(),
            });
        }
        Ok(Self {
            sequence_in_line: sequence_in_line!(bytes, order),
            sequence_in_file: sequence_in_file!(bytes, order),
            field_record: field_record!(bytes, order),
            trace_in_field_record: trace_in_field_record!(bytes, order),
            trace_id_code: trace_id_code!(bytes, order),
            num_samples: num_samples!(bytes, order),
            sample_interval_us: trace_sample_interval!(bytes, order),
            year: year!(bytes, order),
            day_of_year: day_of_year!(bytes, order),
            hour: hour!(bytes, order),
            minute: minute!(bytes, order),
            second: second!(bytes, order),
        })
    }

    /// The sample count governing this trace: the per-trace field when set,
    /// otherwise the file-level default.
    pub fn effective_samples(&self, file_default: u16) -> u16 {
        if self.num_samples != 0 {
            self.num_samples
        } else {
            file_default
        }
    }

    /// Re-encode to the on-disk 240-byte representation. Unmodeled fields
    /// are written as zeros.
    pub fn to_bytes(&self, order: ByteOrder) -> Vec<u8> {
        let mut out = [0u8; TRACE_HEADER_LEN];
        out[0..4].copy_from_slice(&codec::write_i32(self.sequence_in_line, order));
        out[4..8].copy_from_slice(&codec::write_i32(self.sequence_in_file, order));
        out[8..12].copy_from_slice(&codec::write_i32(self.field_record, order));
        out[12..16].copy_from_slice(&codec::write_i32(self.trace_in_field_record, order));
        out[28..30].copy_from_slice(&codec::write_i16(self.trace_id_code, order));
        out[114..116].copy_from_slice(&codec::write_u16(self.num_samples, order));
        out[116..118].copy_from_slice(&codec::write_u16(self.sample_interval_us, order));
        out[156..158].copy_from_slice(&codec::write_i16(self.year, order));
        out[158..160].copy_from_slice(&codec::write_i16(self.day_of_year, order));
        out[160..162].copy_from_slice(&codec::write_i16(self.hour, order));
        out[162..164].copy_from_slice(&codec::write_i16(self.minute, order));
        out[164..166].copy_from_slice(&codec::write_i16(self.second, order));
        out.to_vec()
    }

    /// Recording start time from the date fields, when they hold a valid
    /// calendar date.
    #[cfg(feature = "chrono")]
    pub fn start_time(&self) -> Option<chrono::NaiveDateTime> {
        let date = chrono::NaiveDate::from_yo_opt(self.year as i32, self.day_of_year as u32)?;
        date.and_hms_opt(self.hour as u32, self.minute as u32, self.second as u32)
    }
}

impl Default for TraceHeader {
    fn default() -> Self {
        Self::new()
    }
}

/// One decoded trace: its header plus the canonical `f64` sample sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub header: TraceHeader,
    pub samples: Vec<f64>,
}

/// Decode `count` samples from the front of `bytes`, consuming exactly
/// `count * format.width()` bytes. On-disk order is preserved.
pub fn decode_samples(
    bytes: &[u8],
    count: usize,
    format: SampleFormat,
    order: ByteOrder,
) -> SegyResult<Vec<f64>> {
    let width = format.width();
    let need = count * width;
    if bytes.len() < need {
        return Err(SegyError::TruncatedSampleBlock {
            expected: need,
            actual: bytes.len(),
        });
    }
    let mut out = Vec::with_capacity(count);
    for chunk in bytes[..need].chunks_exact(width) {
        let v = match format {
            SampleFormat::IbmFloat => codec::read_ibm_f32(chunk, order)?,
            SampleFormat::IeeeFloat => codec::read_ieee_f32(chunk, order)?,
            SampleFormat::Int32 => codec::read_i32(chunk, order)? as f64,
            SampleFormat::Int16 => codec::read_i16(chunk, order)? as f64,
            SampleFormat::Int8 => chunk[0] as i8 as f64,
        };
        out.push(v);
    }
    Ok(out)
}

/// Round-to-nearest for integer sample encodings, saturating at the type
/// bounds via `as`.
#[inline]
fn round_half_away(v: f64) -> f64 {
    if v >= 0.0 {
        v + 0.5
    } else {
        v - 0.5
    }
}

/// Encode samples to their on-disk representation.
pub fn encode_samples(samples: &[f64], format: SampleFormat, order: ByteOrder) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * format.width());
    for &v in samples {
        match format {
            SampleFormat::IbmFloat => out.extend_from_slice(&codec::write_ibm_f32(v, order)),
            SampleFormat::IeeeFloat => out.extend_from_slice(&codec::write_ieee_f32(v, order)),
            SampleFormat::Int32 => {
                out.extend_from_slice(&codec::write_i32(round_half_away(v) as i32, order))
            }
            SampleFormat::Int16 => {
                out.extend_from_slice(&codec::write_i16(round_half_away(v) as i16, order))
            }
            SampleFormat::Int8 => out.push((round_half_away(v) as i8) as u8),
        }
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn header_round_trip_both_orders() {
        let mut hd = TraceHeader::new();
        hd.sequence_in_line = 3;
        hd.sequence_in_file = 3;
        hd.field_record = 17;
        hd.num_samples = 750;
        hd.sample_interval_us = 2000;
        hd.year = 2020;
        hd.day_of_year = 123;
        hd.hour = 14;
        hd.minute = 59;
        hd.second = 2;
        for order in [ByteOrder::Big, ByteOrder::Little] {
            let back = TraceHeader::parse(&hd.to_bytes(order), order).unwrap();
            assert_eq!(back, hd);
        }
    }

    #[test]
    fn short_header_is_rejected() {
        assert_eq!(
            TraceHeader::parse(&[0u8; 120], ByteOrder::Big),
            Err(SegyError::InsufficientBytes {
                expected: TRACE_HEADER_LEN,
                actual: 120
            })
        );
    }

    #[test]
    fn sample_count_fallback_is_explicit() {
        let mut hd = TraceHeader::new();
        assert_eq!(hd.effective_samples(500), 500);
        hd.num_samples = 7;
        assert_eq!(hd.effective_samples(500), 7);
    }

    #[test]
    fn zero_bytes_decode_to_zero_for_every_format() {
        for fmt in [
            SampleFormat::IbmFloat,
            SampleFormat::Int32,
            SampleFormat::Int16,
            SampleFormat::IeeeFloat,
            SampleFormat::Int8,
        ] {
            let zeros = crate::lib::Vec::from([0u8; 64]);
            let count = 64 / fmt.width();
            let decoded = decode_samples(&zeros, count, fmt, ByteOrder::Big).unwrap();
            assert_eq!(decoded.len(), count);
            assert!(decoded.iter().all(|&v| v == 0.0), "{fmt}");
        }
    }

    #[test]
    fn truncated_block_is_rejected() {
        let bytes = [0u8; 10];
        assert_eq!(
            decode_samples(&bytes, 3, SampleFormat::IeeeFloat, ByteOrder::Big),
            Err(SegyError::TruncatedSampleBlock {
                expected: 12,
                actual: 10
            })
        );
    }

    #[test]
    fn sample_round_trip_integers() {
        let samples = [0.0, 1.0, -1.0, 32000.0, -32000.0];
        for order in [ByteOrder::Big, ByteOrder::Little] {
            for fmt in [SampleFormat::Int16, SampleFormat::Int32] {
                let bytes = encode_samples(&samples, fmt, order);
                let back = decode_samples(&bytes, samples.len(), fmt, order).unwrap();
                assert_eq!(back, samples);
            }
        }
    }

    #[test]
    fn sample_round_trip_floats() {
        let samples = [0.0, 0.5, -118.625, 3.25];
        for fmt in [SampleFormat::IbmFloat, SampleFormat::IeeeFloat] {
            let bytes = encode_samples(&samples, fmt, ByteOrder::Little);
            let back = decode_samples(&bytes, samples.len(), fmt, ByteOrder::Little).unwrap();
            for (a, b) in back.iter().zip(samples.iter()) {
                assert!((a - b).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn decode_order_matches_disk_order() {
        let bytes = encode_samples(&[1.0, 2.0, 3.0], SampleFormat::Int16, ByteOrder::Big);
        let back = decode_samples(&bytes, 3, SampleFormat::Int16, ByteOrder::Big).unwrap();
        assert_eq!(back, [1.0, 2.0, 3.0]);
    }

    #[cfg(feature = "chrono")]
    #[test]
    fn start_time_conversion() {
        let mut hd = TraceHeader::new();
        hd.year = 2009;
        hd.day_of_year = 173;
        hd.hour = 14;
        hd.minute = 47;
        hd.second = 37;
        let t = hd.start_time().unwrap();
        assert_eq!(
            t,
            chrono::NaiveDate::from_ymd_opt(2009, 6, 22)
                .unwrap()
                .and_hms_opt(14, 47, 37)
                .unwrap()
        );
        hd.day_of_year = 999;
        assert!(hd.start_time().is_none());
    }
}
