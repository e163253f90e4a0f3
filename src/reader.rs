//! Sequential consumption of SEG-Y and Seismic Unix byte streams.
//!
//! [`SegyReader`] walks a stream in order — textual header, binary header,
//! then trace header + sample block pairs — yielding one [`Trace`] per
//! iteration so callers can stop early without paying for the rest of the
//! file. Structural damage (stray bytes between blocks, truncated blocks)
//! is detected, reported as [`Anomaly`] records with byte offsets, and
//! survived: everything decoded before the damage is always returned.
//! [`SuReader`] does the same for SU streams, which have no file-level
//! headers and take their format from the caller.

use serde::Serialize;

use crate::error::{SegyError, SegyResult};
use crate::header::{BinaryHeader, FormatDescriptor, SampleFormat, BINARY_HEADER_LEN};
use crate::lib::{String, Vec};
use crate::textual::{self, TextEncoding, TextHeader, TEXT_HEADER_LEN};
use crate::trace::{decode_samples, encode_samples, Trace, TraceHeader, TRACE_HEADER_LEN};
use crate::codec::ByteOrder;

/// Decoding policy knobs. Everything is explicit; nothing beyond the
/// documented endianness and text-encoding heuristics is inferred.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Bypass the binary-header heuristics and force a format.
    pub format_override: Option<FormatDescriptor>,
    /// How far past a corrupt trace boundary the walker scans for the next
    /// recognizable trace header before giving up.
    pub resync_window_bytes: usize,
    /// Halt with an error on the first corruption instead of resyncing.
    pub strict: bool,
    /// Parse trace headers but skip sample decoding (samples come back
    /// empty); the stream walk itself is unchanged.
    pub headonly: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            format_override: None,
            resync_window_bytes: 1024,
            strict: false,
            headonly: false,
        }
    }
}

/// What kind of structural damage an [`Anomaly`] records.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnomalyKind {
    /// Stray bytes before a trace boundary; the walker resynchronized past
    /// them.
    Desync,
    /// Stream ended inside a trace header.
    TruncatedTrace,
    /// Stream ended inside a sample block.
    TruncatedSampleBlock,
    /// Corruption the walker could not scan past; the remainder of the
    /// stream was abandoned.
    Unparseable,
}

impl core::fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            AnomalyKind::Desync => write!(f, "stray bytes before trace boundary"),
            AnomalyKind::TruncatedTrace => write!(f, "truncated trace header"),
            AnomalyKind::TruncatedSampleBlock => write!(f, "truncated sample block"),
            AnomalyKind::Unparseable => write!(f, "unparseable remainder"),
        }
    }
}

/// One detected corruption, located for the operator: the byte offset in
/// the source stream and the index of the trace expected there.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Anomaly {
    pub offset: usize,
    pub trace_index: usize,
    pub kind: AnomalyKind,
}

impl core::fmt::Display for Anomaly {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{} at byte offset {} (trace {})",
            self.kind, self.offset, self.trace_index
        )
    }
}

/// Everything decoded from one stream. Traces appear in stream order;
/// `anomalies` records every point where the walker found unexpected byte
/// counts, whether it continued or aborted.
#[derive(Debug, Clone)]
pub struct DecodedFile {
    pub text_header: Option<TextHeader>,
    pub binary_header: Option<BinaryHeader>,
    pub descriptor: Option<FormatDescriptor>,
    pub traces: Vec<Trace>,
    pub anomalies: Vec<Anomaly>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct HeaderSummary<'a> {
    descriptor: &'a Option<FormatDescriptor>,
    binary_header: &'a Option<BinaryHeader>,
    text_header: &'a Option<TextHeader>,
}

impl DecodedFile {
    pub fn is_clean(&self) -> bool {
        self.anomalies.is_empty()
    }

    /// JSON rendering of the file-level headers, for operator tooling.
    pub fn header_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&HeaderSummary {
            descriptor: &self.descriptor,
            binary_header: &self.binary_header,
            text_header: &self.text_header,
        })
    }
}

/// Sanity test applied to a parsed trace header during the normal walk.
/// Loose on purpose: it only has to catch shifted garbage, not enforce
/// strict numbering schemes real files routinely violate.
fn header_plausible(hd: &TraceHeader, prev_sequence: i32, default_ns: u16) -> bool {
    if hd.sequence_in_line < 0
        || hd.sequence_in_file < 0
        || hd.field_record < 0
        || hd.trace_in_field_record < 0
    {
        return false;
    }
    if hd.effective_samples(default_ns) == 0 {
        return false;
    }
    // Non-monotonic sequence numbers mean the stream lost alignment.
    if prev_sequence > 0 && hd.sequence_in_line > 0 && hd.sequence_in_line < prev_sequence {
        return false;
    }
    true
}

/// Shared trace-loop state machine for SEG-Y and SU streams.
#[derive(Debug)]
struct TraceWalker {
    offset: usize,
    trace_index: usize,
    prev_sequence: i32,
    /// Absorbing: set on clean end of stream and on every failure path.
    faulted: bool,
}

impl TraceWalker {
    fn new(offset: usize) -> Self {
        Self {
            offset,
            trace_index: 0,
            prev_sequence: 0,
            faulted: false,
        }
    }

    fn next_trace(
        &mut self,
        bytes: &[u8],
        descriptor: &FormatDescriptor,
        default_ns: u16,
        config: &ReaderConfig,
        anomalies: &mut Vec<Anomaly>,
    ) -> Option<SegyResult<Trace>> {
        if self.faulted {
            return None;
        }
        let len = bytes.len();
        if self.offset >= len {
            // Exhausted exactly at a trace boundary.
            self.faulted = true;
            return None;
        }
        if len - self.offset < TRACE_HEADER_LEN {
            log::warn!(
                "stream ends inside trace header at offset {} (trace {})",
                self.offset,
                self.trace_index
            );
            anomalies.push(Anomaly {
                offset: self.offset,
                trace_index: self.trace_index,
                kind: AnomalyKind::TruncatedTrace,
            });
            self.faulted = true;
            if config.strict {
                return Some(Err(SegyError::TruncatedTrace {
                    offset: self.offset,
                    trace_index: self.trace_index,
                }));
            }
            return None;
        }

        let mut start = self.offset;
        let mut header = match TraceHeader::parse(&bytes[start..], descriptor.byte_order) {
            Ok(h) => h,
            Err(e) => {
                self.faulted = true;
                return Some(Err(e));
            }
        };

        if !header_plausible(&header, self.prev_sequence, default_ns) {
            log::warn!(
                "implausible trace header at offset {} (trace {}): seq {}, {} samples declared",
                start,
                self.trace_index,
                header.sequence_in_line,
                header.num_samples
            );
            if config.strict {
                anomalies.push(Anomaly {
                    offset: start,
                    trace_index: self.trace_index,
                    kind: AnomalyKind::Desync,
                });
                self.faulted = true;
                return Some(Err(SegyError::Unparseable {
                    offset: start,
                    trace_index: self.trace_index,
                }));
            }
            match self.resync(bytes, descriptor, default_ns, config) {
                Some(found) => {
                    log::warn!(
                        "resynchronized after {} stray bytes at offset {}",
                        found - start,
                        start
                    );
                    anomalies.push(Anomaly {
                        offset: start,
                        trace_index: self.trace_index,
                        kind: AnomalyKind::Desync,
                    });
                    start = found;
                    header = match TraceHeader::parse(&bytes[start..], descriptor.byte_order) {
                        Ok(h) => h,
                        Err(e) => {
                            self.faulted = true;
                            return Some(Err(e));
                        }
                    };
                }
                None => {
                    log::warn!(
                        "no trace boundary within {} bytes of offset {}, abandoning remainder",
                        config.resync_window_bytes,
                        start
                    );
                    anomalies.push(Anomaly {
                        offset: start,
                        trace_index: self.trace_index,
                        kind: AnomalyKind::Unparseable,
                    });
                    self.faulted = true;
                    return None;
                }
            }
        }

        let ns = header.effective_samples(default_ns) as usize;
        let body = start + TRACE_HEADER_LEN;
        let need = ns * descriptor.sample_format.width();
        if len - body < need {
            log::warn!(
                "stream ends inside sample block at offset {} (trace {}): need {}, have {}",
                body,
                self.trace_index,
                need,
                len - body
            );
            anomalies.push(Anomaly {
                offset: body,
                trace_index: self.trace_index,
                kind: AnomalyKind::TruncatedSampleBlock,
            });
            self.faulted = true;
            if config.strict {
                return Some(Err(SegyError::TruncatedSampleBlock {
                    expected: need,
                    actual: len - body,
                }));
            }
            return None;
        }

        let samples = if config.headonly {
            Vec::new()
        } else {
            match decode_samples(
                &bytes[body..body + need],
                ns,
                descriptor.sample_format,
                descriptor.byte_order,
            ) {
                Ok(s) => s,
                Err(e) => {
                    self.faulted = true;
                    return Some(Err(e));
                }
            }
        };

        self.offset = body + need;
        if header.sequence_in_line > 0 {
            self.prev_sequence = header.sequence_in_line;
        }
        self.trace_index += 1;
        Some(Ok(Trace { header, samples }))
    }

    /// Bounded forward scan for the next recognizable trace header. A
    /// candidate must parse, carry exactly the next expected sequence
    /// number (when one is known), and declare a sample block that fits in
    /// the remaining stream — a stricter gate than the normal walk so the
    /// scan cannot lock onto shifted garbage.
    fn resync(
        &self,
        bytes: &[u8],
        descriptor: &FormatDescriptor,
        default_ns: u16,
        config: &ReaderConfig,
    ) -> Option<usize> {
        let expected = if self.prev_sequence > 0 {
            Some(self.prev_sequence + 1)
        } else {
            None
        };
        let limit = (self.offset + config.resync_window_bytes).min(bytes.len());
        for candidate in (self.offset + 1)..limit {
            if bytes.len() - candidate < TRACE_HEADER_LEN {
                break;
            }
            let hd = match TraceHeader::parse(&bytes[candidate..], descriptor.byte_order) {
                Ok(h) => h,
                Err(_) => break,
            };
            if !header_plausible(&hd, self.prev_sequence, default_ns) {
                continue;
            }
            if let Some(seq) = expected {
                if hd.sequence_in_line != seq {
                    continue;
                }
            }
            let ns = hd.effective_samples(default_ns) as usize;
            let end = candidate + TRACE_HEADER_LEN + ns * descriptor.sample_format.width();
            if end <= bytes.len() {
                log::trace!("resync candidate accepted at offset {}", candidate);
                return Some(candidate);
            }
        }
        None
    }
}

fn open_segy(
    bytes: &[u8],
    config: &ReaderConfig,
) -> SegyResult<(TextHeader, BinaryHeader, FormatDescriptor)> {
    let file_header_len = TEXT_HEADER_LEN + BINARY_HEADER_LEN;
    if bytes.len() < file_header_len {
        return Err(SegyError::UnexpectedEof {
            expected: file_header_len,
            actual: bytes.len(),
        });
    }
    let text_encoding = match config.format_override {
        Some(ovr) => ovr.text_encoding,
        None => textual::guess_encoding(bytes),
    };
    let text_header = TextHeader::decode(bytes, text_encoding)?;
    let bin_bytes = &bytes[TEXT_HEADER_LEN..file_header_len];
    let binary_header = match config.format_override {
        Some(ovr) => {
            let mut hd = match BinaryHeader::parse_with_order(bin_bytes, ovr.byte_order) {
                Ok(hd) => hd,
                Err(SegyError::UnsupportedSampleFormat(code)) => {
                    log::warn!(
                        "sample format code {} not recognized, trusting override {}",
                        code,
                        ovr.sample_format
                    );
                    BinaryHeader::parse_with_format(bin_bytes, ovr.byte_order, ovr.sample_format)?
                }
                Err(e) => return Err(e),
            };
            if hd.sample_format != ovr.sample_format {
                log::warn!(
                    "header declares {}, override forces {}",
                    hd.sample_format,
                    ovr.sample_format
                );
                hd.sample_format = ovr.sample_format;
            }
            hd
        }
        None => BinaryHeader::parse(bin_bytes)?,
    };
    log::debug!(
        "binary header: {} {}, {} samples/trace, {} us interval, revision {:#06x}",
        binary_header.byte_order,
        binary_header.sample_format,
        binary_header.samples_per_trace,
        binary_header.sample_interval_us,
        binary_header.revision
    );
    let descriptor = FormatDescriptor {
        byte_order: binary_header.byte_order,
        sample_format: binary_header.sample_format,
        text_encoding,
    };
    Ok((text_header, binary_header, descriptor))
}

/// Lazy SEG-Y decoder: file headers are read on construction, traces on
/// iteration.
#[derive(Debug)]
pub struct SegyReader {
    bytes: Vec<u8>,
    config: ReaderConfig,
    text_header: TextHeader,
    binary_header: BinaryHeader,
    descriptor: FormatDescriptor,
    walker: TraceWalker,
    anomalies: Vec<Anomaly>,
}

impl SegyReader {
    /// Read the textual and binary file headers and set up the trace loop.
    ///
    /// Fails with `UnexpectedEof` on a stream too short for the file
    /// headers, or with `UnsupportedSampleFormat`/`UndeterminedEndianness`
    /// when the binary header cannot be trusted — in which case no trace
    /// can be either, so the whole file is refused. Use [`read_segy`] to
    /// keep the already-decoded textual header in that situation.
    pub fn from_bytes(bytes: Vec<u8>, config: ReaderConfig) -> SegyResult<Self> {
        let (text_header, binary_header, descriptor) = open_segy(&bytes, &config)?;
        Ok(Self {
            bytes,
            config,
            text_header,
            binary_header,
            descriptor,
            walker: TraceWalker::new(TEXT_HEADER_LEN + BINARY_HEADER_LEN),
            anomalies: Vec::new(),
        })
    }

    pub fn text_header(&self) -> &TextHeader {
        &self.text_header
    }

    pub fn binary_header(&self) -> &BinaryHeader {
        &self.binary_header
    }

    pub fn descriptor(&self) -> FormatDescriptor {
        self.descriptor
    }

    /// Anomalies recorded so far (grows as iteration progresses).
    pub fn anomalies(&self) -> &[Anomaly] {
        &self.anomalies
    }

    /// Decode every remaining trace. Never all-or-nothing: on corruption
    /// the result carries the traces decoded before the failure point and
    /// a non-empty anomaly list.
    pub fn read_all(mut self) -> DecodedFile {
        let mut traces = Vec::new();
        while let Some(item) = self.next() {
            match item {
                Ok(trace) => traces.push(trace),
                Err(_) => break,
            }
        }
        DecodedFile {
            text_header: Some(self.text_header),
            binary_header: Some(self.binary_header),
            descriptor: Some(self.descriptor),
            traces,
            anomalies: self.anomalies,
        }
    }
}

impl Iterator for SegyReader {
    type Item = SegyResult<Trace>;

    fn next(&mut self) -> Option<Self::Item> {
        self.walker.next_trace(
            &self.bytes,
            &self.descriptor,
            self.binary_header.samples_per_trace,
            &self.config,
            &mut self.anomalies,
        )
    }
}

/// Lazy Seismic Unix decoder. SU streams begin directly with trace
/// headers; the format descriptor is supplied by the caller (the fixture
/// convention is little-endian IEEE float) since the format embeds none.
pub struct SuReader {
    bytes: Vec<u8>,
    config: ReaderConfig,
    descriptor: FormatDescriptor,
    walker: TraceWalker,
    anomalies: Vec<Anomaly>,
}

impl SuReader {
    /// The conventional SU interpretation: little-endian IEEE float.
    pub fn default_descriptor() -> FormatDescriptor {
        FormatDescriptor {
            byte_order: ByteOrder::Little,
            sample_format: SampleFormat::IeeeFloat,
            text_encoding: TextEncoding::Ascii,
        }
    }

    pub fn from_bytes(
        bytes: Vec<u8>,
        descriptor: Option<FormatDescriptor>,
        config: ReaderConfig,
    ) -> Self {
        let descriptor = descriptor
            .or(config.format_override)
            .unwrap_or_else(Self::default_descriptor);
        Self {
            bytes,
            config,
            descriptor,
            walker: TraceWalker::new(0),
            anomalies: Vec::new(),
        }
    }

    pub fn descriptor(&self) -> FormatDescriptor {
        self.descriptor
    }

    pub fn anomalies(&self) -> &[Anomaly] {
        &self.anomalies
    }

    pub fn read_all(mut self) -> DecodedFile {
        let mut traces = Vec::new();
        while let Some(item) = self.next() {
            match item {
                Ok(trace) => traces.push(trace),
                Err(_) => break,
            }
        }
        DecodedFile {
            text_header: None,
            binary_header: None,
            descriptor: Some(self.descriptor),
            traces,
            anomalies: self.anomalies,
        }
    }
}

impl Iterator for SuReader {
    type Item = SegyResult<Trace>;

    fn next(&mut self) -> Option<Self::Item> {
        // No file-level header: every SU trace header must carry its own
        // sample count, hence a zero default.
        self.walker.next_trace(
            &self.bytes,
            &self.descriptor,
            0,
            &self.config,
            &mut self.anomalies,
        )
    }
}

/// Eagerly decode a SEG-Y stream, tolerating file-header faults: when the
/// binary header is unusable the result still carries the textual header
/// already read, with the fault recorded as an anomaly.
pub fn read_segy(bytes: Vec<u8>, config: ReaderConfig) -> DecodedFile {
    match open_segy(&bytes, &config) {
        Ok((text_header, binary_header, descriptor)) => {
            let reader = SegyReader {
                bytes,
                config,
                text_header,
                binary_header,
                descriptor,
                walker: TraceWalker::new(TEXT_HEADER_LEN + BINARY_HEADER_LEN),
                anomalies: Vec::new(),
            };
            reader.read_all()
        }
        Err(e) => {
            log::error!("cannot open stream: {}", e);
            // Salvage the textual header when the stream reaches that far.
            let (text_header, fault_offset) = if bytes.len() >= TEXT_HEADER_LEN {
                let encoding = textual::guess_encoding(&bytes);
                (TextHeader::decode(&bytes, encoding).ok(), TEXT_HEADER_LEN)
            } else {
                (None, 0)
            };
            DecodedFile {
                text_header,
                binary_header: None,
                descriptor: None,
                traces: Vec::new(),
                anomalies: Vec::from([Anomaly {
                    offset: fault_offset,
                    trace_index: 0,
                    kind: AnomalyKind::Unparseable,
                }]),
            }
        }
    }
}

/// Serialize a complete SEG-Y file: textual header, binary header, then
/// each trace in order. Byte order and sample format come from the binary
/// header.
pub fn write_segy(text: &TextHeader, binary: &BinaryHeader, traces: &[Trace]) -> Vec<u8> {
    let order = binary.byte_order;
    let format = binary.sample_format;
    let mut out = text.encode();
    out.extend_from_slice(&binary.to_bytes());
    for trace in traces {
        out.extend_from_slice(&trace.header.to_bytes(order));
        out.extend_from_slice(&encode_samples(&trace.samples, format, order));
    }
    out
}

/// Serialize traces as a Seismic Unix stream (no file-level headers).
pub fn write_su(traces: &[Trace], descriptor: &FormatDescriptor) -> Vec<u8> {
    let mut out = Vec::new();
    for trace in traces {
        out.extend_from_slice(&trace.header.to_bytes(descriptor.byte_order));
        out.extend_from_slice(&encode_samples(
            &trace.samples,
            descriptor.sample_format,
            descriptor.byte_order,
        ));
    }
    out
}
