//! # LisaImage Core
//!
//! Core traits, types, and error handling for LisaImage, an extractor for
//! Lisa Monitor (Apple Pascal derived) disk images.
//!
//! This crate provides the foundational abstractions:
//! - **Vaults**: Container formats (raw sector images, DiskCopy 4.2)
//! - **Territories**: File systems (the Lisa Monitor directory)
//! - **Codec**: Byte-order aware field decoding and Pascal strings
//!
//! ## Terminology
//!
//! - **Vault** = Container format
//! - **Territory** = File system
//! - **Female disk** = big-endian volume (Lisa)
//! - **Male disk** = little-endian volume (Apple II)
//! - **Twiggy** = double-sided high-capacity media whose second side needs
//!   its tracks reordered
//!
//! ## Example
//!
//! ```rust,no_run
//! use lisaimage_core::{Vault, Result};
//!
//! fn describe(vault: &dyn Vault) -> Result<()> {
//!     println!("Vault type: {}", vault.identify());
//!     println!("Data length: {} bytes", vault.length());
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod error;
pub mod security;
pub mod traits;
pub mod types;

// Re-export commonly used items
pub use codec::{read_pascal_string, read_u16, read_u32, ByteOrder, PascalString};
pub use error::{Error, Result, Warning};
pub use security::*;
pub use traits::{Territory, Vault};
pub use types::{format_size, OccupantInfo, RawImage, BLOCK_SIZE};
