use segyio::*;


fn init_logger() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Trace)
        .is_test(true)
        .try_init();
}

const SAMPLES: [f64; 10] = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0];

/// Three traces of ten big-endian IEEE floats each.
fn clean_file() -> Vec<u8> {
    let traces = [
        fixtures::trace(1, &SAMPLES),
        fixtures::trace(2, &SAMPLES),
        fixtures::trace(3, &[0.0; 10]),
    ];
    fixtures::segy_file(
        SampleFormat::IeeeFloat,
        ByteOrder::Big,
        TextEncoding::Ascii,
        &traces,
    )
}

/// Byte offset of the third trace block.
const BLOCK3: usize = TEXT_HEADER_LEN + BINARY_HEADER_LEN + 2 * (TRACE_HEADER_LEN + 10 * 4);

#[test]
fn clean_file_decodes_fully() {
    init_logger();
    let decoded = SegyReader::from_bytes(clean_file(), ReaderConfig::default())
        .unwrap()
        .read_all();
    assert!(decoded.is_clean());
    assert_eq!(decoded.traces.len(), 3);
    assert_eq!(decoded.traces[2].header.sequence_in_line, 3);
}

#[test]
fn garbage_inside_trace_header_abandons_remainder() {
    init_logger();
    let mut bytes = clean_file();
    // Two stray bytes inside the third trace header shift everything after
    // them; no intact trace boundary remains downstream.
    bytes.insert(BLOCK3 + 4, 0xde);
    bytes.insert(BLOCK3 + 5, 0xad);
    let decoded = SegyReader::from_bytes(bytes, ReaderConfig::default())
        .unwrap()
        .read_all();
    assert_eq!(decoded.traces.len(), 2);
    assert_eq!(decoded.traces[1].samples, SAMPLES);
    assert_eq!(
        decoded.anomalies,
        [Anomaly {
            offset: BLOCK3,
            trace_index: 2,
            kind: AnomalyKind::Unparseable,
        }]
    );
}

#[test]
fn stray_bytes_before_trace_are_skipped() {
    init_logger();
    let mut bytes = clean_file();
    // Seven junk bytes before the third trace header; the intact header
    // follows and the walker resynchronizes onto it.
    for _ in 0..7 {
        bytes.insert(BLOCK3, 0xff);
    }
    let decoded = SegyReader::from_bytes(bytes, ReaderConfig::default())
        .unwrap()
        .read_all();
    assert_eq!(decoded.traces.len(), 3);
    assert_eq!(decoded.traces[2].header.sequence_in_line, 3);
    assert_eq!(decoded.traces[2].samples, [0.0; 10]);
    assert_eq!(
        decoded.anomalies,
        [Anomaly {
            offset: BLOCK3,
            trace_index: 2,
            kind: AnomalyKind::Desync,
        }]
    );
}

#[test]
fn strict_mode_halts_on_first_corruption() {
    init_logger();
    let mut bytes = clean_file();
    bytes.insert(BLOCK3 + 4, 0xde);
    bytes.insert(BLOCK3 + 5, 0xad);
    let config = ReaderConfig {
        strict: true,
        ..ReaderConfig::default()
    };
    let mut reader = SegyReader::from_bytes(bytes, config).unwrap();
    assert!(reader.next().unwrap().is_ok());
    assert!(reader.next().unwrap().is_ok());
    assert_eq!(
        reader.next().unwrap(),
        Err(SegyError::Unparseable {
            offset: BLOCK3,
            trace_index: 2
        })
    );
    assert!(reader.next().is_none());
    assert_eq!(reader.anomalies().len(), 1);
    assert_eq!(reader.anomalies()[0].kind, AnomalyKind::Desync);
}

#[test]
fn truncated_trace_header_is_reported() {
    init_logger();
    let mut bytes = clean_file();
    bytes.truncate(BLOCK3 + 100);
    let decoded = SegyReader::from_bytes(bytes, ReaderConfig::default())
        .unwrap()
        .read_all();
    assert_eq!(decoded.traces.len(), 2);
    assert_eq!(
        decoded.anomalies,
        [Anomaly {
            offset: BLOCK3,
            trace_index: 2,
            kind: AnomalyKind::TruncatedTrace,
        }]
    );
}

#[test]
fn truncated_sample_block_is_reported() {
    init_logger();
    let mut bytes = clean_file();
    bytes.truncate(BLOCK3 + TRACE_HEADER_LEN + 20);
    let decoded = SegyReader::from_bytes(bytes, ReaderConfig::default())
        .unwrap()
        .read_all();
    assert_eq!(decoded.traces.len(), 2);
    assert_eq!(
        decoded.anomalies,
        [Anomaly {
            offset: BLOCK3 + TRACE_HEADER_LEN,
            trace_index: 2,
            kind: AnomalyKind::TruncatedSampleBlock,
        }]
    );
}

#[test]
fn strict_mode_truncated_sample_block_yields_error() {
    init_logger();
    let mut bytes = clean_file();
    bytes.truncate(BLOCK3 + TRACE_HEADER_LEN + 20);
    let config = ReaderConfig {
        strict: true,
        ..ReaderConfig::default()
    };
    let mut reader = SegyReader::from_bytes(bytes, config).unwrap();
    assert!(reader.next().unwrap().is_ok());
    assert!(reader.next().unwrap().is_ok());
    assert_eq!(
        reader.next().unwrap(),
        Err(SegyError::TruncatedSampleBlock {
            expected: 40,
            actual: 20
        })
    );
    assert!(reader.next().is_none());
}

#[test]
fn unusable_binary_header_still_yields_text_header() {
    init_logger();
    let text = TextHeader::from_text(fixtures::HEADER_TEXT, TextEncoding::Ascii);
    let mut bytes = text.encode();
    // A binary header whose format code reads the same unrecognized value
    // in both byte orders.
    let mut binary = vec![0u8; BINARY_HEADER_LEN];
    binary[24] = 0x04;
    binary[25] = 0x04;
    bytes.extend_from_slice(&binary);
    let decoded = read_segy(bytes, ReaderConfig::default());
    assert!(decoded.binary_header.is_none());
    assert!(decoded.traces.is_empty());
    let text_header = decoded.text_header.expect("textual header salvaged");
    assert!(text_header.text().starts_with("C 1 CLIENT ACME"));
    assert_eq!(
        decoded.anomalies,
        [Anomaly {
            offset: TEXT_HEADER_LEN,
            trace_index: 0,
            kind: AnomalyKind::Unparseable,
        }]
    );
}
