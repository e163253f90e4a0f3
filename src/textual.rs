//! Codec for the 3200-byte textual file header (40 lines of 80 columns),
//! stored either as EBCDIC (code page 037) or ASCII. All character-table
//! logic lives here; header parsers never branch on text encoding.

use serde::{Deserialize, Serialize};

use crate::error::{SegyError, SegyResult};
use crate::lib::{String, Vec};

/// Length of the textual file header in bytes.
pub const TEXT_HEADER_LEN: usize = 3200;

/// Width of one textual header line ("card image").
pub const TEXT_LINE_LEN: usize = 80;

/// Placeholder emitted for bytes with no printable mapping.
const PLACEHOLDER: u8 = b'.';

/// EBCDIC (cp037) to ASCII. Bytes without a printable ASCII equivalent
/// map to the placeholder.
#[rustfmt::skip]
const EBCDIC_TO_ASCII: [u8; 256] = [
    0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e,
    0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e,
    0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e,
    0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e,
    0x20, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x3c, 0x28, 0x2b, 0x7c,
    0x26, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x21, 0x24, 0x2a, 0x29, 0x3b, 0x2e,
    0x2d, 0x2f, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2c, 0x25, 0x5f, 0x3e, 0x3f,
    0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x60, 0x3a, 0x23, 0x40, 0x27, 0x3d, 0x22,
    0x2e, 0x61, 0x62, 0x63, 0x64, 0x65, 0x66, 0x67, 0x68, 0x69, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e,
    0x2e, 0x6a, 0x6b, 0x6c, 0x6d, 0x6e, 0x6f, 0x70, 0x71, 0x72, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e,
    0x2e, 0x7e, 0x73, 0x74, 0x75, 0x76, 0x77, 0x78, 0x79, 0x7a, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e,
    0x5e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x5b, 0x5d, 0x2e, 0x2e, 0x2e, 0x2e,
    0x7b, 0x41, 0x42, 0x43, 0x44, 0x45, 0x46, 0x47, 0x48, 0x49, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e,
    0x7d, 0x4a, 0x4b, 0x4c, 0x4d, 0x4e, 0x4f, 0x50, 0x51, 0x52, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e,
    0x5c, 0x2e, 0x53, 0x54, 0x55, 0x56, 0x57, 0x58, 0x59, 0x5a, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e,
    0x30, 0x31, 0x32, 0x33, 0x34, 0x35, 0x36, 0x37, 0x38, 0x39, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e, 0x2e,
];

/// ASCII 0x20..=0x7e to EBCDIC (cp037). Indexed by `byte - 0x20`.
#[rustfmt::skip]
const ASCII_TO_EBCDIC: [u8; 95] = [
    0x40, 0x5a, 0x7f, 0x7b, 0x5b, 0x6c, 0x50, 0x7d, 0x4d, 0x5d, 0x5c, 0x4e, 0x6b, 0x60, 0x4b, 0x61,
    0xf0, 0xf1, 0xf2, 0xf3, 0xf4, 0xf5, 0xf6, 0xf7, 0xf8, 0xf9, 0x7a, 0x5e, 0x4c, 0x7e, 0x6e, 0x6f,
    0x7c, 0xc1, 0xc2, 0xc3, 0xc4, 0xc5, 0xc6, 0xc7, 0xc8, 0xc9, 0xd1, 0xd2, 0xd3, 0xd4, 0xd5, 0xd6,
    0xd7, 0xd8, 0xd9, 0xe2, 0xe3, 0xe4, 0xe5, 0xe6, 0xe7, 0xe8, 0xe9, 0xba, 0xe0, 0xbb, 0xb0, 0x6d,
    0x79, 0x81, 0x82, 0x83, 0x84, 0x85, 0x86, 0x87, 0x88, 0x89, 0x91, 0x92, 0x93, 0x94, 0x95, 0x96,
    0x97, 0x98, 0x99, 0xa2, 0xa3, 0xa4, 0xa5, 0xa6, 0xa7, 0xa8, 0xa9, 0xc0, 0x4f, 0xd0, 0xa1,
];

/// Character encoding of the textual file header.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Ebcdic,
    Ascii,
}

impl core::fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TextEncoding::Ebcdic => write!(f, "EBCDIC"),
            TextEncoding::Ascii => write!(f, "ASCII"),
        }
    }
}

/// The decoded 3200-byte textual file header.
///
/// Immutable once decoded; `encode` reproduces the original bytes exactly
/// for input that contains only characters present in the code page.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct TextHeader {
    text: String,
    encoding: TextEncoding,
}

impl TextHeader {
    /// Decode a 3200-byte block. Fails with `InsufficientBytes` when fewer
    /// bytes are supplied; extra bytes are ignored.
    pub fn decode(bytes: &[u8], encoding: TextEncoding) -> SegyResult<Self> {
        if bytes.len() < TEXT_HEADER_LEN {
            return Err(SegyError::InsufficientBytes {
                expected: TEXT_HEADER_LEN,
                actual: bytes.len(),
            });
        }
        let text = bytes[..TEXT_HEADER_LEN]
            .iter()
            .map(|&b| match encoding {
                TextEncoding::Ebcdic => EBCDIC_TO_ASCII[b as usize] as char,
                TextEncoding::Ascii => {
                    if (0x20..=0x7e).contains(&b) {
                        b as char
                    } else {
                        PLACEHOLDER as char
                    }
                }
            })
            .collect();
        Ok(Self { text, encoding })
    }

    /// Build a header from arbitrary text, padded with spaces (or truncated)
    /// to the fixed 3200-character size. Characters outside the printable
    /// ASCII range become placeholders.
    pub fn from_text(text: &str, encoding: TextEncoding) -> Self {
        let mut t: String = text
            .chars()
            .take(TEXT_HEADER_LEN)
            .map(|c| if (' '..='~').contains(&c) { c } else { PLACEHOLDER as char })
            .collect();
        while t.len() < TEXT_HEADER_LEN {
            t.push(' ');
        }
        Self { text: t, encoding }
    }

    /// Re-encode to the on-disk 3200-byte representation.
    pub fn encode(&self) -> Vec<u8> {
        self.text
            .bytes()
            .map(|b| match self.encoding {
                TextEncoding::Ebcdic => ASCII_TO_EBCDIC[(b - 0x20) as usize],
                TextEncoding::Ascii => b,
            })
            .collect()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// The 40 fixed-width card-image lines.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.as_bytes().chunks(TEXT_LINE_LEN).map(|chunk| {
            // Always valid: decode only produces single-byte ASCII chars.
            core::str::from_utf8(chunk).unwrap_or("")
        })
    }
}

/// Guess whether a textual header block is EBCDIC or ASCII by counting
/// which code page maps more of its bytes to printable text.
pub fn guess_encoding(bytes: &[u8]) -> TextEncoding {
    let mut ascii = 0usize;
    let mut ebcdic = 0usize;
    for &b in bytes.iter().take(TEXT_HEADER_LEN) {
        if (0x20..=0x7e).contains(&b) {
            ascii += 1;
        }
        if EBCDIC_TO_ASCII[b as usize] != PLACEHOLDER || b == 0x40 {
            ebcdic += 1;
        }
    }
    if ebcdic >= ascii {
        TextEncoding::Ebcdic
    } else {
        TextEncoding::Ascii
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn ascii_block(line: &str) -> Vec<u8> {
        let mut block = [b' '; TEXT_HEADER_LEN].to_vec();
        block[..line.len()].copy_from_slice(line.as_bytes());
        block
    }

    #[test]
    fn ascii_round_trip() {
        let block = ascii_block("C 1 CLIENT ACME GEO  AREA NORTH SEA");
        let hd = TextHeader::decode(&block, TextEncoding::Ascii).unwrap();
        assert_eq!(hd.encode(), block);
    }

    #[test]
    fn ebcdic_round_trip() {
        let ascii = ascii_block("C 1 SURVEY 42 (TEST) +/- 0.5%");
        let ebcdic: Vec<u8> = ascii
            .iter()
            .map(|&b| ASCII_TO_EBCDIC[(b - 0x20) as usize])
            .collect();
        let hd = TextHeader::decode(&ebcdic, TextEncoding::Ebcdic).unwrap();
        assert!(hd.text().starts_with("C 1 SURVEY 42 (TEST) +/- 0.5%"));
        assert_eq!(hd.encode(), ebcdic);
    }

    #[test]
    fn unmapped_bytes_become_placeholders() {
        let mut block = ascii_block("");
        block[0] = 0x00;
        block[1] = 0xff;
        let hd = TextHeader::decode(&block, TextEncoding::Ebcdic).unwrap();
        assert!(hd.text().starts_with(".."));
    }

    #[test]
    fn short_block_is_rejected() {
        assert_eq!(
            TextHeader::decode(&[0u8; 100], TextEncoding::Ascii),
            Err(SegyError::InsufficientBytes {
                expected: TEXT_HEADER_LEN,
                actual: 100
            })
        );
    }

    #[test]
    fn lines_are_fixed_width() {
        let hd = TextHeader::from_text("C 1 FIRST LINE", TextEncoding::Ascii);
        let lines: Vec<&str> = hd.lines().collect();
        assert_eq!(lines.len(), 40);
        assert_eq!(lines[0].len(), TEXT_LINE_LEN);
        assert!(lines[0].starts_with("C 1 FIRST LINE"));
    }

    #[test]
    fn encoding_guess() {
        let ascii = ascii_block("C 1 CLIENT");
        assert_eq!(guess_encoding(&ascii), TextEncoding::Ascii);
        let ebcdic: Vec<u8> = ascii
            .iter()
            .map(|&b| ASCII_TO_EBCDIC[(b - 0x20) as usize])
            .collect();
        assert_eq!(guess_encoding(&ebcdic), TextEncoding::Ebcdic);
    }
}
