//! Lisa Monitor file system types and structures
//!
//! The directory starts at block 2 and is a table of 26-byte records. Record 0
//! is the volume header; the rest describe files.
//!
//! ```text
//! 00  01  02  03  04 05 06 07 08 09 10 11 12 13 14 15   16 17   18 19   20 21   22 23   24 25
//! FSTBLK  LSTBLK  FKIND |                       |       |       |       |       |       |
//! header:         TITLE (Pascal, 8) ..........  DEOVBLK DNUMFLS DLOADTM DLASTBT 00 00   00 00
//! files:          TITLE (Pascal, 16) .......................................... LSTBYTE DACCESS
//! ```

use chrono::{Datelike, NaiveDate};
use lisaimage_core::{read_u16, ByteOrder, BLOCK_SIZE};
use serde::Serialize;
use std::fmt;

/// Byte offset of the directory table in the volume
pub const DIRECTORY_OFFSET: usize = 2 * BLOCK_SIZE;

/// Size of one directory record
pub const ENTRY_SIZE: usize = 26;

/// Text files start with a two-block editor header that is not file content
pub const TEXT_HEADER_BLOCKS: u16 = 2;

/// Field ranges within a record
pub mod field {
    use std::ops::Range;

    pub const FIRST_BLOCK: Range<usize> = 0..2;
    pub const LAST_BLOCK: Range<usize> = 2..4;
    pub const KIND: Range<usize> = 4..6;

    pub const VOLUME_TITLE: Range<usize> = 6..14;
    pub const VOLUME_BLOCKS: Range<usize> = 14..16;
    pub const FILE_COUNT: Range<usize> = 16..18;
    pub const LOAD_TIME: Range<usize> = 18..20;
    pub const LAST_SET_DATE: Range<usize> = 20..22;

    pub const FILE_TITLE: Range<usize> = 6..22;
    pub const LAST_BYTE: Range<usize> = 22..24;
    pub const ACCESS_DATE: Range<usize> = 24..26;
}

/// File kind tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FileKind {
    Untyped,
    ExecDisk,
    Code,
    Text,
    Info,
    Data,
    Graphics,
    Photo,
    SecureDir,
    /// Synthetic kind for records whose first and last block are equal
    Separator,
    Unknown(u16),
}

impl FileKind {
    /// Parse a stored kind tag
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => FileKind::Untyped,
            1 => FileKind::ExecDisk,
            2 => FileKind::Code,
            3 => FileKind::Text,
            4 => FileKind::Info,
            5 => FileKind::Data,
            6 => FileKind::Graphics,
            7 => FileKind::Photo,
            8 => FileKind::SecureDir,
            other => FileKind::Unknown(other),
        }
    }

    /// Kinds that may tag the volume header
    pub fn is_directory_kind(&self) -> bool {
        matches!(self, FileKind::Untyped | FileKind::SecureDir)
    }

    /// Eight-character mnemonic; the synthetic separator kind is lowercase
    pub fn mnemonic(&self) -> &'static str {
        match self {
            FileKind::Untyped => "UNTYPFIL",
            FileKind::ExecDisk => "XDSKFILE",
            FileKind::Code => "CODEFILE",
            FileKind::Text => "TEXTFILE",
            FileKind::Info => "INFOFILE",
            FileKind::Data => "DATAFILE",
            FileKind::Graphics => "GRAFFILE",
            FileKind::Photo => "FOTOFILE",
            FileKind::SecureDir => "SECURDIR",
            FileKind::Separator => "separatr",
            FileKind::Unknown(_) => "UNKNFILE",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Decode a packed date
///
/// Bits 15-9 are years since 1900, bits 8-4 the day, bits 3-0 the month.
/// Day 0 is read as day 1. Returns `None` if the fields do not form a calendar
/// date.
pub fn decode_date(raw: u16) -> Option<NaiveDate> {
    let year = 1900 + (raw >> 9) as i32;
    let month = (raw & 0xF) as u32;
    let day = match ((raw >> 4) & 0x1F) as u32 {
        0 => 1,
        day => day,
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Pack a date; `None` for years outside 1900-2027
pub fn encode_date(date: NaiveDate) -> Option<u16> {
    let years = date.year() - 1900;
    if !(0..=0x7F).contains(&years) {
        return None;
    }
    Some(((years as u16) << 9) | ((date.day() as u16) << 4) | date.month() as u16)
}

/// Guess the volume's byte order from the header record
///
/// This is the provisional read: the header's last-block field is read
/// big-endian, and a zero low byte means the volume is little-endian. The
/// directory is short (it normally ends at block 6), so exactly one of the
/// two bytes is zero.
pub fn infer_byte_order(header_record: &[u8]) -> ByteOrder {
    let provisional = read_u16(&header_record[field::LAST_BLOCK], ByteOrder::BigEndian);
    if provisional & 0xFF == 0 {
        ByteOrder::LittleEndian
    } else {
        ByteOrder::BigEndian
    }
}

/// A directory record read with a committed byte order
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    bytes: &'a [u8],
    order: ByteOrder,
}

impl<'a> Record<'a> {
    /// Wrap a record; `bytes` must be at least [`ENTRY_SIZE`] long
    pub fn new(bytes: &'a [u8], order: ByteOrder) -> Self {
        Self { bytes, order }
    }

    /// Raw bytes of a field
    pub fn bytes(&self, range: std::ops::Range<usize>) -> &'a [u8] {
        &self.bytes[range]
    }

    /// 16-bit field in the committed byte order
    pub fn u16(&self, range: std::ops::Range<usize>) -> u16 {
        read_u16(&self.bytes[range], self.order)
    }

    pub fn first_block(&self) -> u16 {
        self.u16(field::FIRST_BLOCK)
    }

    pub fn last_block(&self) -> u16 {
        self.u16(field::LAST_BLOCK)
    }

    pub fn kind(&self) -> FileKind {
        FileKind::from_u16(self.u16(field::KIND))
    }
}

/// Volume header (directory record 0)
#[derive(Debug, Clone, Serialize)]
pub struct DirectoryHeader {
    /// Volume title
    pub title: String,
    /// First block of the directory
    pub first_block: u16,
    /// Block following the directory
    pub last_block: u16,
    /// Stored kind tag (untyped or secure directory)
    pub kind: FileKind,
    /// Declared number of blocks on the volume
    pub total_blocks: u16,
    /// Declared number of file records after the header
    pub file_count: u16,
    /// Load time word, unused by known images
    pub load_time: u16,
    /// Date the volume was last set
    pub last_modified: NaiveDate,
}

/// A file record with its payload
#[derive(Debug, Clone, Serialize)]
pub struct FileEntry {
    /// Record index in the directory table (header is 0)
    pub index: usize,
    /// Kind after separator reclassification
    pub kind: FileKind,
    /// Kind tag as stored on disk
    pub stored_kind: FileKind,
    pub title: String,
    pub first_block: u16,
    pub last_block: u16,
    /// Bytes used in the file's final block
    pub last_byte: u16,
    /// Last access date; `None` if the stored date was invalid
    pub accessed: Option<NaiveDate>,
    /// File content
    #[serde(skip)]
    pub data: Vec<u8>,
}

impl FileEntry {
    /// Records with equal first and last block only mark a sub-folder
    pub fn is_separator(&self) -> bool {
        self.kind == FileKind::Separator
    }

    /// Byte span of the payload in the volume, before clamping
    ///
    /// Text files skip their two-block editor header. The end may lie before
    /// the start for corrupt records.
    pub fn data_span(&self) -> (u64, u64) {
        data_span(self.kind, self.first_block, self.last_block, self.last_byte)
    }
}

/// Byte span `(start, end)` of a file's payload
pub fn data_span(kind: FileKind, first_block: u16, last_block: u16, last_byte: u16) -> (u64, u64) {
    let skip = if kind == FileKind::Text {
        TEXT_HEADER_BLOCKS
    } else {
        0
    };
    let block = BLOCK_SIZE as u64;
    let start = (first_block as u64 + skip as u64) * block;
    let end = (last_block as u64).saturating_sub(1) * block + last_byte as u64;
    (start, end)
}
