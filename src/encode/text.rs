//! String to byte conversion in a caller-chosen text encoding

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Text encodings supported when canonicalizing strings
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TextEncoding {
    /// UTF-8
    #[default]
    #[value(name = "utf8")]
    Utf8,
    /// UTF-16, little endian code units
    #[value(name = "utf16le")]
    Utf16Le,
    /// UTF-16, big endian code units
    #[value(name = "utf16be")]
    Utf16Be,
    /// UTF-32, little endian
    #[value(name = "utf32le")]
    Utf32Le,
    /// UTF-32, big endian
    #[value(name = "utf32be")]
    Utf32Be,
    /// 7-bit ASCII; anything else becomes `?`
    #[value(name = "ascii")]
    Ascii,
}

impl TextEncoding {
    /// Byte-order mark written before the payload when requested
    pub fn preamble(&self) -> &'static [u8] {
        match self {
            Self::Utf8 => &[0xEF, 0xBB, 0xBF],
            Self::Utf16Le => &[0xFF, 0xFE],
            Self::Utf16Be => &[0xFE, 0xFF],
            Self::Utf32Le => &[0xFF, 0xFE, 0x00, 0x00],
            Self::Utf32Be => &[0x00, 0x00, 0xFE, 0xFF],
            Self::Ascii => &[],
        }
    }
}

/// Encode `text`, optionally prefixed with the encoding's byte-order mark
pub fn encode_str(text: &str, encoding: TextEncoding, with_bom: bool) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() + 4);
    if with_bom {
        out.extend_from_slice(encoding.preamble());
    }

    match encoding {
        TextEncoding::Utf8 => out.extend_from_slice(text.as_bytes()),
        TextEncoding::Utf16Le => text
            .encode_utf16()
            .for_each(|unit| out.extend_from_slice(&unit.to_le_bytes())),
        TextEncoding::Utf16Be => text
            .encode_utf16()
            .for_each(|unit| out.extend_from_slice(&unit.to_be_bytes())),
        TextEncoding::Utf32Le => text
            .chars()
            .for_each(|c| out.extend_from_slice(&u32::from(c).to_le_bytes())),
        TextEncoding::Utf32Be => text
            .chars()
            .for_each(|c| out.extend_from_slice(&u32::from(c).to_be_bytes())),
        TextEncoding::Ascii => out.extend(
            text.chars()
                .map(|c| if c.is_ascii() { c as u8 } else { b'?' }),
        ),
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_without_bom() {
        assert_eq!(encode_str("hé", TextEncoding::Utf8, false), vec![b'h', 0xC3, 0xA9]);
        assert_eq!(
            encode_str("h", TextEncoding::Utf8, true),
            vec![0xEF, 0xBB, 0xBF, b'h']
        );
    }

    #[test]
    fn test_utf16_both_orders() {
        assert_eq!(encode_str("A", TextEncoding::Utf16Le, false), vec![0x41, 0]);
        assert_eq!(
            encode_str("A", TextEncoding::Utf16Be, true),
            vec![0xFE, 0xFF, 0, 0x41]
        );
        // surrogate pair for U+1F600
        assert_eq!(
            encode_str("\u{1F600}", TextEncoding::Utf16Be, false),
            vec![0xD8, 0x3D, 0xDE, 0x00]
        );
    }

    #[test]
    fn test_utf32_and_ascii() {
        assert_eq!(
            encode_str("A", TextEncoding::Utf32Le, false),
            vec![0x41, 0, 0, 0]
        );
        assert_eq!(encode_str("añ", TextEncoding::Ascii, true), b"a?".to_vec());
    }

    #[test]
    fn test_empty_string() {
        assert!(encode_str("", TextEncoding::Utf16Le, false).is_empty());
        assert_eq!(encode_str("", TextEncoding::Utf16Le, true), vec![0xFF, 0xFE]);
    }
}
