//! # LisaImage Vaults
//!
//! Container handling for Lisa Monitor disk images.
//!
//! This crate provides:
//! - **RawVault**: Plain sector images (.po and anything unrecognized)
//! - **DiskCopy42Vault**: Apple DiskCopy 4.2 containers (.dc42, .image)
//! - **twiggy**: Track order correction for double-sided Twiggy images
//!
//! ## Example
//!
//! ```rust,no_run
//! use lisaimage_vaults::load_image;
//! use std::path::Path;
//!
//! // Unwrap the container and put sectors in logical order
//! let image = load_image(Path::new("LisaMonitor.dc42")).unwrap();
//! println!("Data: {} bytes (wrapped: {})", image.data.len(), image.wrapped);
//! ```

pub mod dc42;
pub mod factory;
pub mod raw;
pub mod twiggy;

pub use dc42::DiskCopy42Vault;
pub use factory::{
    detect_vault_type, load_image, open_vault, order_sectors, unwrap_container, VaultType,
};
pub use raw::RawVault;
