//! Core traits for LisaImage

use crate::{error::Result, types::{OccupantInfo, RawImage}};

/// Trait for disk image vaults (containers)
///
/// Images are small enough to be held in memory whole; sector positions are
/// computed by random access into the content.
pub trait Vault: Send + Sync {
    /// Get a human-readable identifier for this vault type
    fn identify(&self) -> &str;

    /// Data length declared by the container (file length for raw images)
    fn length(&self) -> u64;

    /// True if the sector data was wrapped in a container header
    fn wrapped(&self) -> bool;

    /// Sector data
    fn content(&self) -> &[u8];

    /// Consume the vault, yielding its sector data
    fn into_image(self: Box<Self>) -> RawImage;
}

/// Trait for file systems (territories)
pub trait Territory: Send + Sync {
    /// Get a human-readable identifier for this territory type
    fn identify(&self) -> &str;

    /// Get the volume label (banner)
    fn banner(&self) -> Result<String>;

    /// Get total size of the territory in bytes, as declared by the volume
    fn domain_size(&self) -> u64;

    /// Get allocation unit (block) size in bytes
    fn block_size(&self) -> u64;

    /// Does this territory support subdirectories?
    fn hierarchical(&self) -> bool;

    /// List all occupants in table order
    fn list_occupants(&self) -> Result<Vec<OccupantInfo>>;

    /// Extract a file's payload by title
    fn extract_file(&self, title: &str) -> Result<Vec<u8>>;

    /// Check if a file or directory exists
    fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.list_occupants()?.iter().any(|o| o.name == name))
    }
}
