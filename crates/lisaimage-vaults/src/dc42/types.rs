//! DiskCopy 4.2 type definitions
//!
//! The header is 0x54 bytes, all multi-byte fields big-endian:
//!
//! | offset | size | field |
//! |---|---|---|
//! | 0x00 | 64 | disk name (Pascal string) |
//! | 0x40 | 4 | data size |
//! | 0x44 | 4 | tag size |
//! | 0x48 | 4 | data checksum |
//! | 0x4C | 4 | tag checksum |
//! | 0x50 | 1 | disk encoding |
//! | 0x51 | 1 | format byte |
//! | 0x52 | 2 | private word, 0x0100 |

use lisaimage_core::{read_pascal_string, read_u16, read_u32, ByteOrder, Error, Result};
use std::fmt;

/// Disk encoding recorded in the header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskEncoding {
    GcrSingleSided,
    GcrDoubleSided,
    Mfm720K,
    Mfm1440K,
    Other(u8),
}

impl DiskEncoding {
    /// Parse encoding from the header byte
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => DiskEncoding::GcrSingleSided,
            1 => DiskEncoding::GcrDoubleSided,
            2 => DiskEncoding::Mfm720K,
            3 => DiskEncoding::Mfm1440K,
            other => DiskEncoding::Other(other),
        }
    }
}

impl fmt::Display for DiskEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiskEncoding::GcrSingleSided => write!(f, "GCR CLV ssdd (400K)"),
            DiskEncoding::GcrDoubleSided => write!(f, "GCR CLV dsdd (800K)"),
            DiskEncoding::Mfm720K => write!(f, "MFM CAV dsdd (720K)"),
            DiskEncoding::Mfm1440K => write!(f, "MFM CAV dshd (1440K)"),
            DiskEncoding::Other(value) => write!(f, "unknown (0x{:02X})", value),
        }
    }
}

/// DiskCopy 4.2 header
#[derive(Debug, Clone)]
pub struct Dc42Header {
    pub disk_name: String,
    pub data_size: u32,
    pub tag_size: u32,
    pub data_checksum: u32,
    pub tag_checksum: u32,
    pub encoding: DiskEncoding,
    pub format_byte: u8,
    pub private: u16,
}

impl Dc42Header {
    /// Size of the header in bytes; sector data starts right after it
    pub const SIZE: usize = 0x54;

    /// Offset of the big-endian data size field
    pub const DATA_SIZE_OFFSET: usize = 0x40;

    /// Expected value of the private word
    pub const PRIVATE_MAGIC: u16 = 0x0100;

    /// Parse the header from the start of a file
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::SIZE {
            return Err(Error::invalid_vault(format!(
                "File too small for a DiskCopy 4.2 header: {} bytes",
                bytes.len()
            )));
        }

        let be = ByteOrder::BigEndian;
        Ok(Self {
            disk_name: read_pascal_string(&bytes[0x00..0x40]).text,
            data_size: read_u32(&bytes[Self::DATA_SIZE_OFFSET..], be),
            tag_size: read_u32(&bytes[0x44..], be),
            data_checksum: read_u32(&bytes[0x48..], be),
            tag_checksum: read_u32(&bytes[0x4C..], be),
            encoding: DiskEncoding::from_u8(bytes[0x50]),
            format_byte: bytes[0x51],
            private: read_u16(&bytes[0x52..], be),
        })
    }

    /// True if the private word carries the expected magic
    pub fn has_magic(&self) -> bool {
        self.private == Self::PRIVATE_MAGIC
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes(name: &str, data_size: u32) -> Vec<u8> {
        let mut bytes = vec![0u8; Dc42Header::SIZE];
        bytes[0] = name.len() as u8;
        bytes[1..1 + name.len()].copy_from_slice(name.as_bytes());
        bytes[0x40..0x44].copy_from_slice(&data_size.to_be_bytes());
        bytes[0x44..0x48].copy_from_slice(&0x1234u32.to_be_bytes());
        bytes[0x50] = 1;
        bytes[0x51] = 0x22;
        bytes[0x52..0x54].copy_from_slice(&Dc42Header::PRIVATE_MAGIC.to_be_bytes());
        bytes
    }

    #[test]
    fn test_parse_header() {
        let header = Dc42Header::parse(&header_bytes("Lisa Monitor", 0x0006_4000)).unwrap();
        assert_eq!(header.disk_name, "Lisa Monitor");
        assert_eq!(header.data_size, 0x0006_4000);
        assert_eq!(header.tag_size, 0x1234);
        assert_eq!(header.encoding, DiskEncoding::GcrDoubleSided);
        assert_eq!(header.format_byte, 0x22);
        assert!(header.has_magic());
    }

    #[test]
    fn test_header_too_small() {
        assert!(Dc42Header::parse(&[0u8; 0x40]).is_err());
    }

    #[test]
    fn test_encoding_display() {
        assert_eq!(DiskEncoding::from_u8(7), DiskEncoding::Other(7));
        assert_eq!(DiskEncoding::Other(7).to_string(), "unknown (0x07)");
    }
}
