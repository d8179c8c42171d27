//! Vault factory for format detection
//!
//! Lisa Monitor images carry no magic that would tell a DiskCopy container
//! from raw sectors reliably, so the container is chosen by file name suffix.
//! The match is case-sensitive.

use crate::twiggy;
use crate::{DiskCopy42Vault, RawVault};
use lisaimage_core::{RawImage, Result, Vault};
use std::path::Path;

/// Detected vault type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultType {
    /// Raw sector image (.po, .img, anything unrecognized)
    Raw,
    /// DiskCopy 4.2 container (.dc42, .image)
    DiskCopy42,
}

impl VaultType {
    /// Get a human-readable name for this vault type
    pub fn name(&self) -> &'static str {
        match self {
            VaultType::Raw => "Raw Sector Image",
            VaultType::DiskCopy42 => "DiskCopy 4.2",
        }
    }
}

/// File name suffixes that mark a DiskCopy 4.2 container
pub const DISKCOPY_SUFFIXES: &[&str] = &[".dc42", ".image"];

/// Detect the vault type from a file name
pub fn detect_vault_type(file_name: &str) -> VaultType {
    if DISKCOPY_SUFFIXES.iter().any(|suffix| file_name.ends_with(suffix)) {
        VaultType::DiskCopy42
    } else {
        VaultType::Raw
    }
}

/// Detect the vault type from a path
pub fn detect_vault_type_for_path(path: &Path) -> VaultType {
    detect_vault_type(&path.to_string_lossy())
}

/// Open a vault, choosing the container by file name suffix
///
/// # Example
///
/// ```rust,no_run
/// use lisaimage_vaults::factory::open_vault;
/// use std::path::Path;
///
/// let vault = open_vault(Path::new("LisaMonitor.dc42")).unwrap();
/// println!("Vault type: {}", vault.identify());
/// ```
pub fn open_vault(path: &Path) -> Result<Box<dyn Vault>> {
    let vault_type = detect_vault_type_for_path(path);
    tracing::debug!("{}: opening as {}", path.display(), vault_type.name());
    match vault_type {
        VaultType::Raw => Ok(Box::new(RawVault::open(path)?)),
        VaultType::DiskCopy42 => Ok(Box::new(DiskCopy42Vault::open(path)?)),
    }
}

/// Unwrap a whole file held in memory
///
/// `file_name` is only used for suffix detection.
pub fn unwrap_container(file_name: &str, bytes: Vec<u8>) -> Result<RawImage> {
    let vault: Box<dyn Vault> = match detect_vault_type(file_name) {
        VaultType::Raw => Box::new(RawVault::from_bytes(bytes)),
        VaultType::DiskCopy42 => Box::new(DiskCopy42Vault::from_bytes(bytes)?),
    };
    tracing::debug!("{}: {} ({} data bytes)", file_name, vault.identify(), vault.length());
    Ok(vault.into_image())
}

/// Put a raw image's sectors in logical order
///
/// Double-sided Twiggy images get their second side's tracks reordered;
/// anything smaller is returned unchanged.
pub fn order_sectors(image: RawImage) -> RawImage {
    if !twiggy::needs_deinterleave(image.data_length) {
        return image;
    }

    tracing::info!(
        "{} blocks: treating as double-sided Twiggy, reordering second side",
        image.declared_blocks()
    );
    let data = twiggy::deinterleave(&image.data);
    RawImage { data, ..image }
}

/// Open an image file and return its sectors in logical order
pub fn load_image(path: &Path) -> Result<RawImage> {
    let vault = open_vault(path)?;
    tracing::debug!("{}: {} ({} data bytes)", path.display(), vault.identify(), vault.length());
    Ok(order_sectors(vault.into_image()))
}
