//! Core types for LisaImage

use crate::error::Warning;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

/// Size of one logical block (sector)
pub const BLOCK_SIZE: usize = 0x200;

/// Sector data of a disk image, freed from its container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    /// Sector data
    pub data: Vec<u8>,

    /// True if the data came out of a container header
    pub wrapped: bool,

    /// Data length declared by the container, or the file length for raw images
    pub data_length: u64,

    /// Problems found while unwrapping the container
    pub warnings: Vec<Warning>,
}

impl RawImage {
    /// Create a raw image from unwrapped sector data
    pub fn new(data: Vec<u8>, wrapped: bool, data_length: u64) -> Self {
        Self {
            data,
            wrapped,
            data_length,
            warnings: Vec::new(),
        }
    }

    /// Attach unwrapping warnings
    pub fn with_warnings(mut self, warnings: Vec<Warning>) -> Self {
        self.warnings = warnings;
        self
    }

    /// Number of whole blocks covered by the declared data length
    pub fn declared_blocks(&self) -> u64 {
        self.data_length / BLOCK_SIZE as u64
    }
}

/// One row of a volume listing
#[derive(Debug, Clone, Serialize)]
pub struct OccupantInfo {
    /// Name of the file or directory
    pub name: String,

    /// True for sub-folder separators
    pub is_directory: bool,

    /// Eight-character kind mnemonic
    pub kind: String,

    /// First block of the entry
    pub first_block: u16,

    /// Last block of the entry (exclusive)
    pub last_block: u16,

    /// Payload size in bytes (0 for directories)
    pub size: u64,

    /// Last access date
    pub accessed: Option<NaiveDate>,
}

impl OccupantInfo {
    /// Create a new file occupant
    pub fn file(name: String, kind: impl Into<String>, size: u64) -> Self {
        Self {
            name,
            is_directory: false,
            kind: kind.into(),
            first_block: 0,
            last_block: 0,
            size,
            accessed: None,
        }
    }

    /// Create a new directory occupant
    pub fn directory(name: String, kind: impl Into<String>) -> Self {
        Self {
            name,
            is_directory: true,
            kind: kind.into(),
            first_block: 0,
            last_block: 0,
            size: 0,
            accessed: None,
        }
    }

    /// Set the block span
    pub fn with_blocks(mut self, first_block: u16, last_block: u16) -> Self {
        self.first_block = first_block;
        self.last_block = last_block;
        self
    }

    /// Set accessed date
    pub fn with_accessed(mut self, accessed: Option<NaiveDate>) -> Self {
        self.accessed = accessed;
        self
    }

    /// Span length in blocks
    pub fn blocks(&self) -> i32 {
        self.last_block as i32 - self.first_block as i32
    }
}

impl fmt::Display for OccupantInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let date = self
            .accessed
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "----------".to_string());
        write!(
            f,
            "0x{:04X}  0x{:04X}  {:>4}  {:<8}  {:<16}  {:>10}  {}",
            self.first_block,
            self.last_block,
            self.blocks(),
            self.kind,
            self.name,
            if self.is_directory {
                "<DIR>".to_string()
            } else {
                format_size(self.size)
            },
            date
        )
    }
}

/// Format size in human-readable format
pub fn format_size(size: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = size as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", size as u64, UNITS[unit_idx])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}
