//! Error types for SEG-Y and Seismic Unix decoding.

use thiserror::Error;

/// Everything that can go wrong while decoding a trace stream.
///
/// `UnsupportedSampleFormat` and `UndeterminedEndianness` abort a file
/// outright: without a trusted binary header no trace can be decoded.
/// The truncation and corruption variants are recoverable in the sense
/// that every trace decoded before the failure point is still returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SegyError {
    #[error("insufficient bytes: expected {expected}, got {actual}")]
    InsufficientBytes { expected: usize, actual: usize },

    #[error("unsupported sample format code: {0}")]
    UnsupportedSampleFormat(i16),

    #[error("binary header matches no recognized byte order")]
    UndeterminedEndianness,

    #[error("truncated trace header at offset {offset} (trace {trace_index})")]
    TruncatedTrace { offset: usize, trace_index: usize },

    #[error("truncated sample block: expected {expected} bytes, got {actual}")]
    TruncatedSampleBlock { expected: usize, actual: usize },

    #[error("unexpected end of stream: expected {expected} bytes, got {actual}")]
    UnexpectedEof { expected: usize, actual: usize },

    #[error("unparseable stream at offset {offset} (trace {trace_index})")]
    Unparseable { offset: usize, trace_index: usize },
}

pub type SegyResult<T> = core::result::Result<T, SegyError>;
