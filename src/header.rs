//! The 400-byte binary file header of a SEG-Y rev 1 stream. Fixed byte
//! offsets per the published layout; the header is the sole source of truth
//! for how every subsequent trace is decoded.

use serde::{Deserialize, Serialize};

use crate::codec::{self, ByteOrder};
use crate::error::{SegyError, SegyResult};
use crate::lib::Vec;
use crate::textual::TextEncoding;

/// Length of the binary file header in bytes.
pub const BINARY_HEADER_LEN: usize = 400;

/// Byte offset of the sample format code within the binary header.
const FORMAT_CODE_OFFSET: usize = 24;

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

/// job identification number:
///
/// |  type  | length | offset |
/// |--------|--------|--------|
/// | INT32  |   4    |    0   |
macro_rules! job_id {
    ($hd:expr, $order:expr) => {
        field_i32($hd, 0, $order)
    };
}

/// line number:
///
/// |  type  | length | offset |
/// |--------|--------|--------|
/// | INT32  |   4    |    4   |
macro_rules! line_number {
    ($hd:expr, $order:expr) => {
        field_i32($hd, 4, $order)
    };
}

/// reel number:
///
/// |  type  | length | offset |
/// |--------|--------|--------|
/// | INT32  |   4    |    8   |
macro_rules! reel_number {
    ($hd:expr, $order:expr) => {
        field_i32($hd, 8, $order)
    };
}

/// data traces per ensemble:
///
/// |  type  | length | offset |
/// |--------|--------|--------|
/// | INT16  |   2    |   12   |
macro_rules! traces_per_ensemble {
    ($hd:expr, $order:expr) => {
        field_i16($hd, 12, $order)
    };
}

/// auxiliary traces per ensemble:
///
/// |  type  | length | offset |
/// |--------|--------|--------|
/// | INT16  |   2    |   14   |
macro_rules! aux_traces_per_ensemble {
    ($hd:expr, $order:expr) => {
        field_i16($hd, 14, $order)
    };
}

/// sample interval in microseconds:
///
/// |  type  | length | offset |
/// |--------|--------|--------|
/// | UINT16 |   2    |   16   |
macro_rules! sample_interval {
    ($hd:expr, $order:expr) => {
        field_u16($hd, 16, $order)
    };
}

/// sample interval of the original field recording:
///
/// |  type  | length | offset |
/// |--------|--------|--------|
/// | UINT16 |   2    |   18   |
macro_rules! original_sample_interval {
    ($hd:expr, $order:expr) => {
        field_u16($hd, 18, $order)
    };
}

/// samples per data trace:
///
/// |  type  | length | offset |
/// |--------|--------|--------|
/// | UINT16 |   2    |   20   |
macro_rules! samples_per_trace {
    ($hd:expr, $order:expr) => {
        field_u16($hd, 20, $order)
    };
}

/// samples per trace of the original field recording:
///
/// |  type  | length | offset |
/// |--------|--------|--------|
/// | UINT16 |   2    |   22   |
macro_rules! original_samples_per_trace {
    ($hd:expr, $order:expr) => {
        field_u16($hd, 22, $order)
    };
}

/// data sample format code:
///
/// |  type  | length | offset |
/// |--------|--------|--------|
/// | INT16  |   2    |   24   |
macro_rules! format_code {
    ($hd:expr, $order:expr) => {
        field_i16($hd, FORMAT_CODE_OFFSET, $order)
    };
}

/// measurement system (1 = meters, 2 = feet):
///
/// |  type  | length | offset |
/// |--------|--------|--------|
/// | INT16  |   2    |   54   |
macro_rules! measurement_system {
    ($hd:expr, $order:expr) => {
        field_i16($hd, 54, $order)
    };
}

/// format revision number (0x0100 for rev 1):
///
/// |  type  | length | offset |
/// |--------|--------|--------|
/// | UINT16 |   2    |  300   |
macro_rules! revision {
    ($hd:expr, $order:expr) => {
        field_u16($hd, 300, $order)
    };
}

/// fixed length trace flag:
///
/// |  type  | length | offset |
/// |--------|--------|--------|
/// | INT16  |   2    |  302   |
macro_rules! fixed_length_flag {
    ($hd:expr, $order:expr) => {
        field_i16($hd, 302, $order)
    };
}

/// number of extended textual headers:
///
/// |  type  | length | offset |
/// |--------|--------|--------|
/// | INT16  |   2    |  304   |
macro_rules! extended_text_headers {
    ($hd:expr, $order:expr) => {
        field_i16($hd, 304, $order)
    };
}

/// Sample format codes recognized by the decoder. An unrecognized code is a
/// hard decode error, never a silent default.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    /// 4-byte IBM floating point (code 1).
    IbmFloat,
    /// 4-byte two's-complement integer (code 2).
    Int32,
    /// 2-byte two's-complement integer (code 3).
    Int16,
    /// 4-byte IEEE floating point (code 5).
    IeeeFloat,
    /// 1-byte two's-complement integer (code 8).
    Int8,
}

impl SampleFormat {
    /// Map a raw format code to a `SampleFormat`, or `None` for codes the
    /// decoder does not support (including the obsolete gain-ranged code 4).
    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(Self::IbmFloat),
            2 => Some(Self::Int32),
            3 => Some(Self::Int16),
            5 => Some(Self::IeeeFloat),
            8 => Some(Self::Int8),
            _ => None,
        }
    }

    pub fn code(self) -> i16 {
        match self {
            Self::IbmFloat => 1,
            Self::Int32 => 2,
            Self::Int16 => 3,
            Self::IeeeFloat => 5,
            Self::Int8 => 8,
        }
    }

    /// On-disk width of one sample in bytes.
    pub fn width(self) -> usize {
        match self {
            Self::IbmFloat | Self::Int32 | Self::IeeeFloat => 4,
            Self::Int16 => 2,
            Self::Int8 => 1,
        }
    }
}

impl core::fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::IbmFloat => write!(f, "IBM float"),
            Self::Int32 => write!(f, "int32"),
            Self::Int16 => write!(f, "int16"),
            Self::IeeeFloat => write!(f, "IEEE float"),
            Self::Int8 => write!(f, "int8"),
        }
    }
}

/// The full variant triple that drives every decode decision for a stream.
/// Immutable once determined from the binary header (or supplied for SU
/// data, which embeds no indicator).
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct FormatDescriptor {
    pub byte_order: ByteOrder,
    pub sample_format: SampleFormat,
    pub text_encoding: TextEncoding,
}

impl core::fmt::Display for FormatDescriptor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{}-endian {} / {}",
            self.byte_order, self.sample_format, self.text_encoding
        )
    }
}

/// The decoded binary file header. Created once per file, immutable
/// thereafter.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct BinaryHeader {
    pub job_id: i32,
    pub line_number: i32,
    pub reel_number: i32,
    pub traces_per_ensemble: i16,
    pub aux_traces_per_ensemble: i16,
    /// Sample interval in microseconds, the file-wide default.
    pub sample_interval_us: u16,
    pub original_sample_interval_us: u16,
    /// Samples per trace, the file-wide default a per-trace header may
    /// override.
    pub samples_per_trace: u16,
    pub original_samples_per_trace: u16,
    pub sample_format: SampleFormat,
    pub measurement_system: i16,
    /// Format revision marker, 0x0100 for rev 1.
    pub revision: u16,
    pub fixed_length_traces: bool,
    pub extended_text_headers: i16,
    /// Byte order the header itself decoded with; all trace headers and
    /// sample blocks follow it.
    pub byte_order: ByteOrder,
}

impl BinaryHeader {
    /// A blank rev 1 header for file construction. Counts and intervals
    /// start at zero and are filled in by the caller.
    pub fn new(sample_format: SampleFormat, byte_order: ByteOrder) -> Self {
        Self {
            job_id: 0,
            line_number: 0,
            reel_number: 0,
            traces_per_ensemble: 0,
            aux_traces_per_ensemble: 0,
            sample_interval_us: 0,
            original_sample_interval_us: 0,
            samples_per_trace: 0,
            original_samples_per_trace: 0,
            sample_format,
            measurement_system: 1,
            revision: 0x0100,
            fixed_length_traces: false,
            extended_text_headers: 0,
            byte_order,
        }
    }

    /// Parse a binary header, determining its byte order by trial decode:
    /// big-endian first, then little-endian, accepting whichever yields a
    /// recognized sample format code. Neither working is
    /// `UndeterminedEndianness`, unless both orders read the same
    /// (unrecognized) code, which is `UnsupportedSampleFormat`.
    pub fn parse(bytes: &[u8]) -> SegyResult<Self> {
        Self::check_len(bytes)?;
        let be_code = format_code!(bytes, ByteOrder::Big);
        if SampleFormat::from_code(be_code).is_some() {
            return Self::parse_with_order(bytes, ByteOrder::Big);
        }
        let le_code = format_code!(bytes, ByteOrder::Little);
        if SampleFormat::from_code(le_code).is_some() {
            log::debug!(
                "format code {} not recognized as big-endian, falling back to little-endian",
                be_code
            );
            return Self::parse_with_order(bytes, ByteOrder::Little);
        }
        if be_code == le_code {
            Err(SegyError::UnsupportedSampleFormat(be_code))
        } else {
            Err(SegyError::UndeterminedEndianness)
        }
    }

    /// Parse with a known byte order. An unrecognized sample format code is
    /// `UnsupportedSampleFormat`.
    pub fn parse_with_order(bytes: &[u8], order: ByteOrder) -> SegyResult<Self> {
        Self::check_len(bytes)?;
        let code = format_code!(bytes, order);
        let sample_format =
            SampleFormat::from_code(code).ok_or(SegyError::UnsupportedSampleFormat(code))?;
        Self::parse_with_format(bytes, order, sample_format)
    }

    /// Parse with both the byte order and sample format supplied, ignoring
    /// the format code field entirely.
    pub(crate) fn parse_with_format(
        bytes: &[u8],
        order: ByteOrder,
        sample_format: SampleFormat,
    ) -> SegyResult<Self> {
        Self::check_len(bytes)?;
        Ok(Self {
            job_id: job_id!(bytes, order),
            line_number: line_number!(bytes, order),
            reel_number: reel_number!(bytes, order),
            traces_per_ensemble: traces_per_ensemble!(bytes, order),
            aux_traces_per_ensemble: aux_traces_per_ensemble!(bytes, order),
            sample_interval_us: sample_interval!(bytes, order),
            original_sample_interval_us: original_sample_interval!(bytes, order),
            samples_per_trace: samples_per_trace!(bytes, order),
            original_samples_per_trace: original_samples_per_trace!(bytes, order),
            sample_format,
            measurement_system: measurement_system!(bytes, order),
            revision: revision!(bytes, order),
            fixed_length_traces: fixed_length_flag!(bytes, order) != 0,
            extended_text_headers: extended_text_headers!(bytes, order),
            byte_order: order,
        })
    }

    /// Re-encode to the on-disk 400-byte representation. Fields the struct
    /// does not model are written as zeros.
    pub fn to_bytes(&self) -> Vec<u8> {
        let order = self.byte_order;
        let mut out = [0u8; BINARY_HEADER_LEN];
        out[0..4].copy_from_slice(&codec::write_i32(self.job_id, order));
        out[4..8].copy_from_slice(&codec::write_i32(self.line_number, order));
        out[8..12].copy_from_slice(&codec::write_i32(self.reel_number, order));
        out[12..14].copy_from_slice(&codec::write_i16(self.traces_per_ensemble, order));
        out[14..16].copy_from_slice(&codec::write_i16(self.aux_traces_per_ensemble, order));
        out[16..18].copy_from_slice(&codec::write_u16(self.sample_interval_us, order));
        out[18..20].copy_from_slice(&codec::write_u16(self.original_sample_interval_us, order));
        out[20..22].copy_from_slice(&codec::write_u16(self.samples_per_trace, order));
        out[22..24].copy_from_slice(&codec::write_u16(self.original_samples_per_trace, order));
        out[24..26].copy_from_slice(&codec::write_i16(self.sample_format.code(), order));
        out[54..56].copy_from_slice(&codec::write_i16(self.measurement_system, order));
        out[300..302].copy_from_slice(&codec::write_u16(self.revision, order));
        out[302..304].copy_from_slice(&codec::write_i16(
            i16::from(self.fixed_length_traces),
            order,
        ));
        out[304..306].copy_from_slice(&codec::write_i16(self.extended_text_headers, order));
        out.to_vec()
    }

    fn check_len(bytes: &[u8]) -> SegyResult<()> {
        if bytes.len() < BINARY_HEADER_LEN {
            return Err(SegyError::InsufficientBytes {
                expected: BINARY_HEADER_LEN,
                actual: bytes.len(),
            });
        }
        Ok(())
    }
}
