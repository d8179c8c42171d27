//! Primitive field codec
//!
//! Fixed-width integers whose byte order is a property of the whole volume,
//! and length-prefixed ("Pascal") strings.

use crate::error::Warning;
use serde::Serialize;
use std::fmt;

/// Byte order of every multi-byte field on a volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ByteOrder {
    /// "Female" disks, written for the Lisa
    BigEndian,
    /// "Male" disks, written for the Apple II
    LittleEndian,
}

impl ByteOrder {
    /// Legacy name used by Lisa Monitor documentation
    pub fn legacy_name(&self) -> &'static str {
        match self {
            ByteOrder::BigEndian => "female",
            ByteOrder::LittleEndian => "male",
        }
    }
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ByteOrder::BigEndian => write!(f, "big-endian ({})", self.legacy_name()),
            ByteOrder::LittleEndian => write!(f, "little-endian ({})", self.legacy_name()),
        }
    }
}

/// Decode a 16-bit field
///
/// # Panics
/// Panics if `bytes` is shorter than 2. Callers slice fixed-size records, so a
/// short slice is a programming error.
pub fn read_u16(bytes: &[u8], order: ByteOrder) -> u16 {
    let raw = [bytes[0], bytes[1]];
    match order {
        ByteOrder::BigEndian => u16::from_be_bytes(raw),
        ByteOrder::LittleEndian => u16::from_le_bytes(raw),
    }
}

/// Decode a 32-bit field
///
/// # Panics
/// Panics if `bytes` is shorter than 4.
pub fn read_u32(bytes: &[u8], order: ByteOrder) -> u32 {
    let raw = [bytes[0], bytes[1], bytes[2], bytes[3]];
    match order {
        ByteOrder::BigEndian => u32::from_be_bytes(raw),
        ByteOrder::LittleEndian => u32::from_le_bytes(raw),
    }
}

/// Placeholder for bytes that cannot be shown as text
pub const PLACEHOLDER: char = '?';

/// A decoded Pascal string together with its raw content bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PascalString {
    /// Decoded text
    pub text: String,

    /// Content bytes (without the length prefix)
    pub raw: Vec<u8>,

    /// True if the bytes were not clean UTF-8 text and a fallback was used
    pub lossy: bool,
}

impl PascalString {
    /// Warning describing a lossy decode, if any
    pub fn warning(&self) -> Option<Warning> {
        self.lossy.then(|| Warning::UndecodableTitle {
            raw: self.raw.clone(),
            decoded: self.text.clone(),
        })
    }
}

/// Decode a length-prefixed string occupying a fixed-size field
///
/// The first byte is the length; it is capped at the space left in the field.
/// Clean UTF-8 is taken as is. Anything else is decoded byte-wise (bytes at or
/// above 0x80 as Mac OS Roman) with control characters replaced by
/// [`PLACEHOLDER`], and the result is marked lossy.
pub fn read_pascal_string(field: &[u8]) -> PascalString {
    let Some((&len, rest)) = field.split_first() else {
        return PascalString {
            text: String::new(),
            raw: Vec::new(),
            lossy: false,
        };
    };
    let raw = &rest[..(len as usize).min(rest.len())];

    if let Ok(text) = std::str::from_utf8(raw) {
        if !text.chars().any(char::is_control) {
            return PascalString {
                text: text.to_string(),
                raw: raw.to_vec(),
                lossy: false,
            };
        }
    }

    let (decoded, _) = encoding_rs::MACINTOSH.decode_without_bom_handling(raw);
    let text = decoded
        .chars()
        .map(|c| if c.is_control() { PLACEHOLDER } else { c })
        .collect();

    PascalString {
        text,
        raw: raw.to_vec(),
        lossy: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_u16_both_orders() {
        let bytes = [0x12, 0x34];
        assert_eq!(read_u16(&bytes, ByteOrder::BigEndian), 0x1234);
        assert_eq!(read_u16(&bytes, ByteOrder::LittleEndian), 0x3412);
    }

    #[test]
    fn test_read_u32_both_orders() {
        let bytes = [0x00, 0x0D, 0x48, 0x00, 0xFF];
        assert_eq!(read_u32(&bytes, ByteOrder::BigEndian), 0x000D_4800);
        assert_eq!(read_u32(&bytes, ByteOrder::LittleEndian), 0x0048_0D00);
    }

    #[test]
    #[should_panic]
    fn test_read_u16_short_slice() {
        read_u16(&[0x01], ByteOrder::BigEndian);
    }

    #[test]
    fn test_pascal_string() {
        let field = b"\x07TESTVOL";
        let s = read_pascal_string(field);
        assert_eq!(s.text, "TESTVOL");
        assert!(!s.lossy);
        assert!(s.warning().is_none());
    }

    #[test]
    fn test_pascal_string_ignores_padding() {
        let field = b"\x03ABCxxxx";
        assert_eq!(read_pascal_string(field).text, "ABC");
    }

    #[test]
    fn test_pascal_string_length_capped_to_field() {
        let field = b"\xFFABCD";
        assert_eq!(read_pascal_string(field).text, "ABCD");
        assert_eq!(read_pascal_string(&[]).text, "");
    }

    #[test]
    fn test_pascal_string_substitutes_control_bytes() {
        let field = [4, b'A', 0x01, b'B', 0xA9];
        let s = read_pascal_string(&field);
        assert_eq!(s.text, "A?B\u{a9}");
        assert!(s.lossy);
        assert!(matches!(s.warning(), Some(Warning::UndecodableTitle { .. })));
    }

    #[test]
    fn test_pascal_string_high_bytes_are_mac_roman() {
        // 0x8E is e-acute and 0xA5 a bullet in Mac OS Roman
        let field = [6, b'R', 0x8E, b'S', b'U', b'M', 0xA5];
        let s = read_pascal_string(&field);
        assert_eq!(s.text, "R\u{e9}SUM\u{2022}");
        assert!(s.lossy);
        assert_eq!(s.raw, field[1..].to_vec());
    }
}
