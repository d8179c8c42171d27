//! Raw vault - Direct sector image container
//!
//! This module implements the simplest vault type: a raw sector image with no
//! container metadata. Apple II ProDOS-order images (.po) are raw images.

use lisaimage_core::{validate_allocation_size, RawImage, Result, Vault, MAX_IMAGE_SIZE};
use std::fs;
use std::path::Path;

/// Raw vault - the whole file is sector data
///
/// # Example
///
/// ```rust,no_run
/// use lisaimage_vaults::RawVault;
/// use lisaimage_core::Vault;
/// use std::path::Path;
///
/// let vault = RawVault::open(Path::new("monitor.po")).unwrap();
/// println!("Vault type: {}", vault.identify());
/// println!("Size: {} bytes", vault.length());
/// ```
pub struct RawVault {
    data: Vec<u8>,
}

impl RawVault {
    /// Open a raw vault from a file path
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is larger than
    /// [`MAX_IMAGE_SIZE`]
    pub fn open(path: &Path) -> Result<Self> {
        let len = fs::metadata(path)?.len();
        validate_allocation_size(len, MAX_IMAGE_SIZE, "Raw image")?;
        Ok(Self::from_bytes(fs::read(path)?))
    }

    /// Create a raw vault from bytes already in memory
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data }
    }
}

impl Vault for RawVault {
    fn identify(&self) -> &str {
        "Raw sector image"
    }

    fn length(&self) -> u64 {
        self.data.len() as u64
    }

    fn wrapped(&self) -> bool {
        false
    }

    fn content(&self) -> &[u8] {
        &self.data
    }

    fn into_image(self: Box<Self>) -> RawImage {
        let length = self.length();
        RawImage::new(self.data, false, length)
    }
}
