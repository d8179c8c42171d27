//! Lisa Monitor file system implementation
//!
//! Volumes come in two byte orders ("female" big-endian Lisa disks and "male"
//! little-endian Apple II disks) with no flag saying which. The order is
//! inferred once from the volume header and then used for every field.
//!
//! Structural problems in the header are fatal. Problems confined to a single
//! file record are recorded as warnings and the rest of the volume is still
//! decoded.

pub mod extract;
pub mod text;
pub mod types;

use chrono::NaiveDate;
use lisaimage_core::{
    read_pascal_string, ByteOrder, Error, OccupantInfo, Result, Territory, Warning, BLOCK_SIZE,
};
use text::TextOptions;
use types::{
    decode_date, field, infer_byte_order, DirectoryHeader, FileEntry, FileKind, Record,
    DIRECTORY_OFFSET, ENTRY_SIZE,
};

/// Where the directory walk stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Record 0 has not been read
    AwaitingDirectory,
    /// Header read; `remaining` file records follow
    InDirectory { order: ByteOrder, remaining: u16 },
    /// All declared records read
    Done,
}

/// Lisa Monitor file system territory
///
/// Holds the decoded header and every file record with its payload, in
/// directory table order.
#[derive(Debug)]
pub struct LisaTerritory {
    header: DirectoryHeader,
    byte_order: ByteOrder,
    entries: Vec<FileEntry>,
    warnings: Vec<Warning>,
    identifier: String,
}

/// Record `index` of the directory table, if the volume is long enough
fn record_at(data: &[u8], index: usize) -> Option<&[u8]> {
    let start = DIRECTORY_OFFSET + index * ENTRY_SIZE;
    data.get(start..start + ENTRY_SIZE)
}

fn note(warnings: &mut Vec<Warning>, warning: Warning) {
    tracing::warn!("{}", warning);
    warnings.push(warning);
}

impl LisaTerritory {
    /// Parse a Lisa Monitor volume from its sector data
    ///
    /// `data` must already be unwrapped from any container and in logical
    /// sector order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTerritory`] if the directory header is missing,
    /// misplaced, or carries an invalid date, or if the directory table runs
    /// past the end of the volume.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut state = ParseState::AwaitingDirectory;
        let mut header: Option<(DirectoryHeader, ByteOrder)> = None;
        let mut entries = Vec::new();
        let mut warnings = Vec::new();
        let mut index = 0;

        loop {
            match state {
                ParseState::AwaitingDirectory => {
                    let Some(bytes) = record_at(data, 0) else {
                        break;
                    };
                    let order = infer_byte_order(bytes);
                    let record = Record::new(bytes, order);
                    let parsed = Self::parse_header(record, data.len(), &mut warnings)?;
                    tracing::debug!("Byte order: {}", order);

                    state = match parsed.file_count {
                        0 => ParseState::Done,
                        remaining => ParseState::InDirectory { order, remaining },
                    };
                    header = Some((parsed, order));
                }
                ParseState::InDirectory { order, remaining } => {
                    index += 1;
                    let bytes = record_at(data, index).ok_or_else(|| {
                        Error::invalid_territory(format!(
                            "directory table truncated at record {} of {}",
                            index,
                            index - 1 + remaining as usize
                        ))
                    })?;

                    let record = Record::new(bytes, order);
                    if let Some(entry) = Self::parse_entry(index, record, data, &mut warnings) {
                        entries.push(entry);
                    }

                    state = match remaining - 1 {
                        0 => ParseState::Done,
                        remaining => ParseState::InDirectory { order, remaining },
                    };
                }
                ParseState::Done => break,
            }
        }

        let (header, byte_order) = header.ok_or_else(|| {
            Error::invalid_territory("unable to find directory: not a Lisa Monitor volume")
        })?;

        tracing::info!(
            "Volume '{}': {} records, {} blocks, {}",
            header.title,
            entries.len(),
            header.total_blocks,
            byte_order
        );

        Ok(Self {
            header,
            byte_order,
            entries,
            warnings,
            identifier: "Lisa Monitor file system".to_string(),
        })
    }

    /// Decode and validate record 0
    fn parse_header(
        record: Record<'_>,
        data_len: usize,
        warnings: &mut Vec<Warning>,
    ) -> Result<DirectoryHeader> {
        let kind = record.kind();
        if !kind.is_directory_kind() {
            return Err(Error::invalid_territory(format!(
                "directory not found at start of volume (record 0 has kind {})",
                kind
            )));
        }

        let title = read_pascal_string(record.bytes(field::VOLUME_TITLE));
        if let Some(warning) = title.warning() {
            note(warnings, warning);
        }

        let first_block = record.first_block();
        let last_block = record.last_block();
        let total_blocks = record.u16(field::VOLUME_BLOCKS);
        let file_count = record.u16(field::FILE_COUNT);
        let load_time = record.u16(field::LOAD_TIME);
        let raw_date = record.u16(field::LAST_SET_DATE);

        let declared = total_blocks as u64 * BLOCK_SIZE as u64;
        if declared != data_len as u64 {
            let actual = data_len as u64;
            note(warnings, Warning::LengthMismatch { declared, actual });
        }

        if first_block != 0 {
            return Err(Error::invalid_territory(format!(
                "header location mismatch: directory claims block {} (corrupt disk)",
                first_block
            )));
        }

        let last_modified = decode_date(raw_date).ok_or_else(|| {
            Error::invalid_territory(format!(
                "invalid time value 0x{:04X} in directory header (corrupt disk)",
                raw_date
            ))
        })?;

        let header = DirectoryHeader {
            title: title.text,
            first_block,
            last_block,
            kind,
            total_blocks,
            file_count,
            load_time,
            last_modified,
        };

        tracing::debug!(
            "Directory header: FSTBLK 0x{:04X} LSTBLK 0x{:04X} {:<8} '{}' \
             DEOVBLK 0x{:04X} DNUMFLS {} {}",
            header.first_block,
            header.last_block,
            header.kind,
            header.title,
            header.total_blocks,
            header.file_count,
            header.last_modified
        );

        Ok(header)
    }

    /// Decode a file record and slice its payload
    ///
    /// Returns `None` for records that must be skipped.
    fn parse_entry(
        index: usize,
        record: Record<'_>,
        data: &[u8],
        warnings: &mut Vec<Warning>,
    ) -> Option<FileEntry> {
        let stored_kind = record.kind();
        let first_block = record.first_block();
        let last_block = record.last_block();

        let title = read_pascal_string(record.bytes(field::FILE_TITLE));
        if let Some(warning) = title.warning() {
            note(warnings, warning);
        }
        let title = title.text;

        // A second header: starts at block 0 and spans the directory area
        if stored_kind.is_directory_kind() && first_block == 0 && last_block > first_block {
            note(
                warnings,
                Warning::ExtraDirectory {
                    index,
                    kind: stored_kind.to_string(),
                    title,
                },
            );
            return None;
        }

        let kind = if first_block == last_block {
            FileKind::Separator
        } else {
            stored_kind
        };
        let last_byte = record.u16(field::LAST_BYTE);
        let raw_date = record.u16(field::ACCESS_DATE);

        let accessed = decode_date(raw_date);
        if accessed.is_none() {
            let warning = Warning::BadEntryDate {
                title: title.clone(),
                raw: raw_date,
            };
            note(warnings, warning);
        }

        let mut entry = FileEntry {
            index,
            kind,
            stored_kind,
            title,
            first_block,
            last_block,
            last_byte,
            accessed,
            data: Vec::new(),
        };

        tracing::debug!(
            "0x{:04X}  0x{:04X}  {:>4}  {:<8}  {:<16}  0x{:04X}  {}",
            entry.first_block,
            entry.last_block,
            entry.last_block as i32 - entry.first_block as i32,
            entry.kind,
            entry.title,
            entry.last_byte,
            entry.accessed.map(|d| d.to_string()).unwrap_or_else(|| "invalid".to_string())
        );

        if !entry.is_separator() {
            if last_block < first_block {
                note(
                    warnings,
                    Warning::InvertedSpan {
                        title: entry.title.clone(),
                        first: first_block,
                        last: last_block,
                    },
                );
            } else {
                entry.data = Self::slice_payload(&entry, data, warnings);
            }
        }

        Some(entry)
    }

    /// Copy out a file's payload, clamped to the volume
    fn slice_payload(entry: &FileEntry, data: &[u8], warnings: &mut Vec<Warning>) -> Vec<u8> {
        let (start, end) = entry.data_span();
        let length = data.len() as u64;

        if end > length {
            note(
                warnings,
                Warning::SpanOutOfRange {
                    title: entry.title.clone(),
                    start,
                    end,
                    length,
                },
            );
        }

        let end = end.min(length);
        if start >= end {
            return Vec::new();
        }
        data[start as usize..end as usize].to_vec()
    }

    /// Get the volume header
    pub fn header(&self) -> &DirectoryHeader {
        &self.header
    }

    /// Byte order inferred from the header
    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// File records in directory table order
    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    /// Date the volume was last set
    pub fn last_modified(&self) -> NaiveDate {
        self.header.last_modified
    }

    /// Recoverable problems found so far
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Normalize the payload of every text file
    pub fn normalize_text(&mut self, options: &TextOptions) {
        for entry in self.entries.iter_mut().filter(|e| e.kind == FileKind::Text) {
            entry.data = text::normalize(&entry.data, options, &mut self.warnings);
        }
    }
}

impl Territory for LisaTerritory {
    fn identify(&self) -> &str {
        &self.identifier
    }

    fn banner(&self) -> Result<String> {
        Ok(self.header.title.clone())
    }

    fn domain_size(&self) -> u64 {
        self.header.total_blocks as u64 * BLOCK_SIZE as u64
    }

    fn block_size(&self) -> u64 {
        BLOCK_SIZE as u64
    }

    fn hierarchical(&self) -> bool {
        true // separators start sub-folders
    }

    fn list_occupants(&self) -> Result<Vec<OccupantInfo>> {
        Ok(self
            .entries
            .iter()
            .map(|entry| {
                let info = if entry.is_separator() {
                    OccupantInfo::directory(entry.title.clone(), entry.kind.mnemonic())
                } else {
                    let size = entry.data.len() as u64;
                    OccupantInfo::file(entry.title.clone(), entry.kind.mnemonic(), size)
                };
                info.with_blocks(entry.first_block, entry.last_block)
                    .with_accessed(entry.accessed)
            })
            .collect())
    }

    fn extract_file(&self, title: &str) -> Result<Vec<u8>> {
        self.entries
            .iter()
            .find(|e| !e.is_separator() && e.title == title)
            .map(|e| e.data.clone())
            .ok_or_else(|| Error::not_found(format!("No file titled '{}'", title)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::encode_date;

    const BLOCKS: u16 = 20;

    fn date(y: i32, m: u32, d: u32) -> u16 {
        encode_date(NaiveDate::from_ymd_opt(y, m, d).unwrap()).unwrap()
    }

    fn put_u16(volume: &mut [u8], at: usize, value: u16, order: ByteOrder) {
        let bytes = match order {
            ByteOrder::BigEndian => value.to_be_bytes(),
            ByteOrder::LittleEndian => value.to_le_bytes(),
        };
        volume[at..at + 2].copy_from_slice(&bytes);
    }

    fn put_title(volume: &mut [u8], at: usize, title: &str) {
        volume[at] = title.len() as u8;
        volume[at + 1..at + 1 + title.len()].copy_from_slice(title.as_bytes());
    }

    /// Volume with a header record declaring `files` entries
    fn volume(order: ByteOrder, files: u16) -> Vec<u8> {
        let mut v = vec![0u8; BLOCKS as usize * BLOCK_SIZE];
        let h = DIRECTORY_OFFSET;
        put_u16(&mut v, h, 0, order);
        put_u16(&mut v, h + 2, 6, order);
        put_u16(&mut v, h + 4, 0, order);
        put_title(&mut v, h + 6, "TESTVOL");
        put_u16(&mut v, h + 14, BLOCKS, order);
        put_u16(&mut v, h + 16, files, order);
        put_u16(&mut v, h + 20, date(1983, 1, 19), order);
        v
    }

    #[allow(clippy::too_many_arguments)]
    fn put_entry(
        v: &mut [u8],
        index: usize,
        order: ByteOrder,
        first: u16,
        last: u16,
        kind: u16,
        title: &str,
        last_byte: u16,
        access: u16,
    ) {
        let at = DIRECTORY_OFFSET + index * ENTRY_SIZE;
        put_u16(v, at, first, order);
        put_u16(v, at + 2, last, order);
        put_u16(v, at + 4, kind, order);
        put_title(v, at + 6, title);
        put_u16(v, at + 22, last_byte, order);
        put_u16(v, at + 24, access, order);
    }

    #[test]
    fn test_parse_big_endian_volume() {
        let order = ByteOrder::BigEndian;
        let mut v = volume(order, 2);
        put_entry(&mut v, 1, order, 6, 8, 5, "DATA", 0x100, date(1983, 2, 1));
        put_entry(&mut v, 2, order, 8, 8, 0, "TOOLS", 0, date(1983, 2, 2));
        v[6 * BLOCK_SIZE..7 * BLOCK_SIZE + 0x100].fill(0xAA);

        let territory = LisaTerritory::parse(&v).unwrap();
        assert_eq!(territory.byte_order(), ByteOrder::BigEndian);
        assert_eq!(territory.header().title, "TESTVOL");
        assert_eq!(territory.header().file_count, 2);
        assert_eq!(territory.last_modified(), NaiveDate::from_ymd_opt(1983, 1, 19).unwrap());
        assert!(territory.warnings().is_empty());

        let entries = territory.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, FileKind::Data);
        assert_eq!(entries[0].data.len(), BLOCK_SIZE + 0x100);
        assert!(entries[0].data.iter().all(|&b| b == 0xAA));
        assert!(entries[1].is_separator());
        assert_eq!(entries[1].stored_kind, FileKind::Untyped);
        assert!(entries[1].data.is_empty());
    }

    #[test]
    fn test_parse_little_endian_volume() {
        let order = ByteOrder::LittleEndian;
        let mut v = volume(order, 1);
        put_entry(&mut v, 1, order, 10, 13, 3, "NOTES.TEXT", 0x200, date(1984, 5, 6));
        v[12 * BLOCK_SIZE..12 * BLOCK_SIZE + 5].copy_from_slice(b"hello");

        let territory = LisaTerritory::parse(&v).unwrap();
        assert_eq!(territory.byte_order(), ByteOrder::LittleEndian);

        let entry = &territory.entries()[0];
        assert_eq!(entry.kind, FileKind::Text);
        assert_eq!(entry.title, "NOTES.TEXT");
        // Text payload skips the two header blocks
        assert_eq!(entry.data.len(), BLOCK_SIZE);
        assert_eq!(&entry.data[..5], b"hello");
        assert_eq!(entry.accessed, NaiveDate::from_ymd_opt(1984, 5, 6));
    }

    #[test]
    fn test_normalize_text_only_touches_text() {
        let order = ByteOrder::BigEndian;
        let mut v = volume(order, 2);
        put_entry(&mut v, 1, order, 10, 13, 3, "A.TEXT", 0x200, date(1984, 5, 6));
        put_entry(&mut v, 2, order, 13, 14, 5, "B.DATA", 0x200, date(1984, 5, 6));
        v[12 * BLOCK_SIZE..12 * BLOCK_SIZE + 2].copy_from_slice(b"AB");

        let mut territory = LisaTerritory::parse(&v).unwrap();
        territory.normalize_text(&TextOptions::default());

        assert_eq!(territory.entries()[0].data, b"AB");
        assert_eq!(territory.entries()[1].data.len(), BLOCK_SIZE);
    }

    #[test]
    fn test_directory_not_found() {
        let order = ByteOrder::BigEndian;
        let mut v = volume(order, 0);
        put_u16(&mut v, DIRECTORY_OFFSET + 4, 3, order);

        let err = LisaTerritory::parse(&v).unwrap_err();
        assert!(err.to_string().contains("directory not found"));
    }

    #[test]
    fn test_secure_directory_header_accepted() {
        let order = ByteOrder::BigEndian;
        let mut v = volume(order, 0);
        put_u16(&mut v, DIRECTORY_OFFSET + 4, 8, order);

        let territory = LisaTerritory::parse(&v).unwrap();
        assert_eq!(territory.header().kind, FileKind::SecureDir);
        assert!(territory.entries().is_empty());
    }

    #[test]
    fn test_header_location_mismatch() {
        let order = ByteOrder::BigEndian;
        let mut v = volume(order, 0);
        put_u16(&mut v, DIRECTORY_OFFSET, 1, order);

        let err = LisaTerritory::parse(&v).unwrap_err();
        assert!(err.to_string().contains("header location mismatch"));
    }

    #[test]
    fn test_invalid_header_date_is_fatal() {
        let order = ByteOrder::BigEndian;
        let mut v = volume(order, 0);
        put_u16(&mut v, DIRECTORY_OFFSET + 20, 83 << 9, order);

        let err = LisaTerritory::parse(&v).unwrap_err();
        assert!(err.is_corrupt_data());
        assert!(err.to_string().contains("invalid time value"));
    }

    #[test]
    fn test_invalid_entry_date_is_warning() {
        let order = ByteOrder::BigEndian;
        let mut v = volume(order, 1);
        put_entry(&mut v, 1, order, 6, 7, 5, "BADDATE", 0x200, 0);

        let territory = LisaTerritory::parse(&v).unwrap();
        assert_eq!(territory.entries()[0].accessed, None);
        assert_eq!(
            territory.warnings(),
            &[Warning::BadEntryDate {
                title: "BADDATE".to_string(),
                raw: 0
            }]
        );
    }

    #[test]
    fn test_length_mismatch_is_warning() {
        let order = ByteOrder::BigEndian;
        let mut v = volume(order, 1);
        put_entry(&mut v, 1, order, 6, 7, 5, "DATA", 0x10, date(1983, 3, 3));
        v.extend_from_slice(&[0u8; BLOCK_SIZE]);

        let territory = LisaTerritory::parse(&v).unwrap();
        assert_eq!(territory.entries().len(), 1);
        assert_eq!(territory.entries()[0].data.len(), 0x10);
        assert!(matches!(territory.warnings()[0], Warning::LengthMismatch { .. }));
    }

    #[test]
    fn test_extra_directory_record_skipped() {
        let order = ByteOrder::BigEndian;
        let mut v = volume(order, 2);
        put_entry(&mut v, 1, order, 0, 6, 8, "SHADOW", 0, date(1983, 3, 3));
        put_entry(&mut v, 2, order, 6, 7, 2, "PROG", 0x200, date(1983, 3, 3));

        let territory = LisaTerritory::parse(&v).unwrap();
        assert_eq!(territory.entries().len(), 1);
        assert_eq!(territory.entries()[0].title, "PROG");
        assert!(matches!(territory.warnings()[0], Warning::ExtraDirectory { index: 1, .. }));
    }

    #[test]
    fn test_span_out_of_range_is_clamped() {
        let order = ByteOrder::BigEndian;
        let mut v = volume(order, 1);
        put_entry(&mut v, 1, order, 18, 30, 5, "BIG", 0x200, date(1983, 3, 3));

        let territory = LisaTerritory::parse(&v).unwrap();
        assert_eq!(territory.entries()[0].data.len(), 2 * BLOCK_SIZE);
        assert!(matches!(territory.warnings()[0], Warning::SpanOutOfRange { .. }));
    }

    #[test]
    fn test_inverted_span_is_warning() {
        let order = ByteOrder::BigEndian;
        let mut v = volume(order, 1);
        put_entry(&mut v, 1, order, 9, 7, 5, "BACKWARDS", 0x200, date(1983, 3, 3));

        let territory = LisaTerritory::parse(&v).unwrap();
        assert!(territory.entries()[0].data.is_empty());
        assert!(matches!(territory.warnings()[0], Warning::InvertedSpan { first: 9, last: 7, .. }));
    }

    #[test]
    fn test_truncated_directory_is_fatal() {
        let order = ByteOrder::BigEndian;
        let mut v = volume(order, 100);
        v.truncate(DIRECTORY_OFFSET + 10 * ENTRY_SIZE);

        assert!(LisaTerritory::parse(&v).is_err());
    }

    #[test]
    fn test_too_short_for_directory() {
        let err = LisaTerritory::parse(&[0u8; 0x300]).unwrap_err();
        assert!(err.to_string().contains("not a Lisa Monitor volume"));
    }

    #[test]
    fn test_territory_trait() {
        let order = ByteOrder::BigEndian;
        let mut v = volume(order, 2);
        put_entry(&mut v, 1, order, 8, 8, 0, "SUB", 0, date(1983, 2, 2));
        put_entry(&mut v, 2, order, 6, 8, 2, "PROG", 0x80, date(1983, 2, 1));

        let territory = LisaTerritory::parse(&v).unwrap();
        assert_eq!(territory.identify(), "Lisa Monitor file system");
        assert_eq!(territory.banner().unwrap(), "TESTVOL");
        assert_eq!(territory.domain_size(), BLOCKS as u64 * 0x200);
        assert_eq!(territory.block_size(), 0x200);
        assert!(territory.hierarchical());

        let occupants = territory.list_occupants().unwrap();
        assert_eq!(occupants.len(), 2);
        assert!(occupants[0].is_directory);
        assert_eq!(occupants[1].kind, "CODEFILE");
        assert_eq!(occupants[1].size, BLOCK_SIZE as u64 + 0x80);

        assert!(territory.exists("PROG").unwrap());
        assert_eq!(territory.extract_file("PROG").unwrap().len(), BLOCK_SIZE + 0x80);
        assert!(territory.extract_file("SUB").is_err());
    }
}
