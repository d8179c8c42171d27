//! DiskCopy 4.2 vault implementation
//!
//! A DiskCopy 4.2 file is a fixed 0x54-byte header followed by the sector
//! data and then the tag data. Only the sector data is kept; tags are not used
//! by the Lisa Monitor file system.

pub mod types;

use lisaimage_core::{
    validate_allocation_size, RawImage, Result, Vault, Warning, MAX_IMAGE_SIZE,
};
use std::fs;
use std::path::Path;
use types::Dc42Header;

/// DiskCopy 4.2 vault - Apple disk image container
pub struct DiskCopy42Vault {
    header: Dc42Header,
    data: Vec<u8>,
    warnings: Vec<Warning>,
}

impl DiskCopy42Vault {
    /// Open a DiskCopy 4.2 vault from a file path
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is larger than
    /// [`MAX_IMAGE_SIZE`], or is too small to hold the header
    pub fn open(path: &Path) -> Result<Self> {
        let len = fs::metadata(path)?.len();
        validate_allocation_size(len, MAX_IMAGE_SIZE, "DiskCopy image")?;
        Self::from_bytes(fs::read(path)?)
    }

    /// Unwrap a DiskCopy 4.2 container held in memory
    ///
    /// The data block is the `data_size` bytes following the header. If the
    /// file ends early the block is clamped to what is present and a
    /// [`Warning::TruncatedContainer`] is recorded.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let header = Dc42Header::parse(&bytes)?;
        let mut warnings = Vec::new();

        tracing::debug!(
            "DiskCopy 4.2 header: name '{}', data {} bytes, tags {} bytes, encoding {}, \
             format 0x{:02X}",
            header.disk_name,
            header.data_size,
            header.tag_size,
            header.encoding,
            header.format_byte
        );
        if !header.has_magic() {
            tracing::debug!(
                "DiskCopy 4.2 private word is 0x{:04X}, expected 0x{:04X}",
                header.private,
                Dc42Header::PRIVATE_MAGIC
            );
        }

        let available = (bytes.len() - Dc42Header::SIZE) as u64;
        let declared = header.data_size as u64;
        if declared > available {
            let warning = Warning::TruncatedContainer {
                declared,
                available,
            };
            tracing::warn!("{}", warning);
            warnings.push(warning);
        }

        let end = Dc42Header::SIZE + declared.min(available) as usize;
        let data = bytes[Dc42Header::SIZE..end].to_vec();

        Ok(Self {
            header,
            data,
            warnings,
        })
    }

    /// Get the parsed header
    pub fn header(&self) -> &Dc42Header {
        &self.header
    }

    /// Recoverable problems found while unwrapping
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }
}

impl Vault for DiskCopy42Vault {
    fn identify(&self) -> &str {
        "DiskCopy 4.2"
    }

    fn length(&self) -> u64 {
        self.header.data_size as u64
    }

    fn wrapped(&self) -> bool {
        true
    }

    fn content(&self) -> &[u8] {
        &self.data
    }

    fn into_image(self: Box<Self>) -> RawImage {
        let length = self.length();
        RawImage::new(self.data, true, length).with_warnings(self.warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn dc42_file(data: &[u8], declared: u32) -> Vec<u8> {
        let mut bytes = vec![0u8; Dc42Header::SIZE];
        bytes[0] = 4;
        bytes[1..5].copy_from_slice(b"DISK");
        bytes[0x40..0x44].copy_from_slice(&declared.to_be_bytes());
        bytes[0x52..0x54].copy_from_slice(&[0x01, 0x00]);
        bytes.extend_from_slice(data);
        bytes
    }

    #[test]
    fn test_unwrap_data_block() {
        let data: Vec<u8> = (0u8..=255).cycle().take(0x400).collect();
        let mut file = dc42_file(&data, 0x400);
        // Trailing tag bytes are not part of the data block
        file.extend_from_slice(&[0xEE; 24]);

        let vault = DiskCopy42Vault::from_bytes(file).unwrap();
        assert_eq!(vault.identify(), "DiskCopy 4.2");
        assert_eq!(vault.length(), 0x400);
        assert!(vault.wrapped());
        assert_eq!(vault.content(), data.as_slice());
        assert!(vault.warnings().is_empty());
        assert_eq!(vault.header().disk_name, "DISK");
    }

    #[test]
    fn test_truncated_container_is_clamped() {
        let data = vec![0x55u8; 0x200];
        let vault = DiskCopy42Vault::from_bytes(dc42_file(&data, 0x400)).unwrap();

        assert_eq!(vault.content().len(), 0x200);
        assert_eq!(vault.length(), 0x400);
        assert_eq!(
            vault.warnings(),
            &[Warning::TruncatedContainer {
                declared: 0x400,
                available: 0x200
            }]
        );
    }

    #[test]
    fn test_too_small_for_header() {
        assert!(DiskCopy42Vault::from_bytes(vec![0u8; 10]).is_err());
    }

    #[test]
    fn test_into_image() {
        let vault: Box<DiskCopy42Vault> =
            Box::new(DiskCopy42Vault::from_bytes(dc42_file(&[1, 2, 3], 3)).unwrap());
        let image = vault.into_image();
        assert_eq!(image.data, vec![1, 2, 3]);
        assert!(image.wrapped);
        assert_eq!(image.data_length, 3);
        assert!(image.warnings.is_empty());
    }

    #[test]
    fn test_truncation_warning_reaches_image() {
        let file = dc42_file(&[0x55; 0x200], 0x400);
        let vault = Box::new(DiskCopy42Vault::from_bytes(file).unwrap());
        let image = vault.into_image();

        assert_eq!(image.data.len(), 0x200);
        assert_eq!(image.data_length, 0x400);
        assert_eq!(
            image.warnings,
            vec![Warning::TruncatedContainer {
                declared: 0x400,
                available: 0x200
            }]
        );
    }

    #[test]
    fn test_open_file() {
        let mut tmpfile = NamedTempFile::with_suffix(".dc42").unwrap();
        tmpfile.write_all(&dc42_file(&[9u8; 0x200], 0x200)).unwrap();
        tmpfile.flush().unwrap();

        let vault = DiskCopy42Vault::open(tmpfile.path()).unwrap();
        assert_eq!(vault.content(), &[9u8; 0x200][..]);
    }
}
