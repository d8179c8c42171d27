//! # LisaImage Territories
//!
//! The Lisa Monitor file system: directory decoding, text normalization and
//! extraction to the host.
//!
//! ## Example
//!
//! ```rust,no_run
//! use lisaimage_core::Territory;
//! use lisaimage_territories::{extract_volume, LisaTerritory, TextOptions};
//! use lisaimage_vaults::load_image;
//! use std::path::Path;
//!
//! let image = load_image(Path::new("LisaMonitor.dc42")).unwrap();
//! let mut territory = LisaTerritory::parse(&image.data).unwrap();
//! println!("Volume: {}", territory.banner().unwrap());
//!
//! territory.normalize_text(&TextOptions::default());
//! extract_volume(&territory, Path::new("out")).unwrap();
//! ```

pub mod lisa;

pub use lisa::extract::{extract_volume, ExtractReport, Materializer};
pub use lisa::text::{LineEnding, TextOptions};
pub use lisa::types::{DirectoryHeader, FileEntry, FileKind};
pub use lisa::LisaTerritory;
