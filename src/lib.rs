#![no_std]
#![deny(unsafe_code)]
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

#[cfg(feature = "std")]
extern crate std;

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(not(any(feature = "std", feature = "alloc")))]
compile_error!("segyio crate requires either std or alloc feature to be enabled");

pub use codec::ByteOrder;
pub use error::{SegyError, SegyResult};
pub use header::{BinaryHeader, FormatDescriptor, SampleFormat, BINARY_HEADER_LEN};
pub use reader::{
    read_segy, write_segy, write_su, Anomaly, AnomalyKind, DecodedFile, ReaderConfig, SegyReader,
    SuReader,
};
pub use textual::{guess_encoding, TextEncoding, TextHeader, TEXT_HEADER_LEN, TEXT_LINE_LEN};
pub use trace::{decode_samples, encode_samples, Trace, TraceHeader, TRACE_HEADER_LEN};

pub mod codec;
mod error;
mod header;
mod reader;
mod textual;
mod trace;

mod lib {
    #[cfg(feature = "alloc")]
    pub use alloc::{
        format,
        string::{String, ToString},
        vec::Vec,
    };
    #[cfg(feature = "std")]
    pub use std::{
        format,
        string::{String, ToString},
        vec::Vec,
    };
}
