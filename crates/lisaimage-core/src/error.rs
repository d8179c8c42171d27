//! Fatal error and recoverable warning types
//!
//! Extraction distinguishes two outcomes. An [`Error`] aborts the whole run:
//! the volume structure cannot be trusted any further. A [`Warning`] marks an
//! isolated bad field; it is logged and the best-effort result continues.

use thiserror::Error;

/// Fatal errors for LisaImage operations
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error while reading the image or writing output
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid vault (container) format
    #[error("Invalid vault format: {0}")]
    InvalidVault(String),

    /// Corrupt or unrecognized territory (file system) structure
    #[error("Invalid territory: {0}")]
    InvalidTerritory(String),

    /// File or directory not found in territory
    #[error("Not found: {0}")]
    NotFound(String),

    /// Something that is not a directory already occupies an output path
    #[error("Output collision: {0}")]
    OutputCollision(String),
}

/// Result type alias for LisaImage operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an invalid vault error
    pub fn invalid_vault(msg: impl Into<String>) -> Self {
        Error::InvalidVault(msg.into())
    }

    /// Create an invalid territory error
    pub fn invalid_territory(msg: impl Into<String>) -> Self {
        Error::InvalidTerritory(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }

    /// Create an output collision error
    pub fn output_collision(msg: impl Into<String>) -> Self {
        Error::OutputCollision(msg.into())
    }

    /// True for errors caused by corrupt or unrecognized image data
    pub fn is_corrupt_data(&self) -> bool {
        matches!(self, Error::InvalidVault(_) | Error::InvalidTerritory(_))
    }
}

/// Recoverable conditions found while decoding a volume
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// Declared volume size disagrees with the data block length
    #[error(
        "image data length {actual} differs from header length {declared}; \
         track swap likely failed"
    )]
    LengthMismatch { declared: u64, actual: u64 },

    /// A file entry carries a packed date that is not a calendar date
    #[error("invalid access date 0x{raw:04X} on entry '{title}'")]
    BadEntryDate { title: String, raw: u16 },

    /// Indent marker whose count byte is below 32
    #[error("invalid indent count byte {count} at offset {offset}")]
    InvalidIndent { offset: usize, count: u8 },

    /// Title bytes that needed placeholder substitution
    #[error("title bytes {raw:02X?} are not clean text, decoded as '{decoded}'")]
    UndecodableTitle { raw: Vec<u8>, decoded: String },

    /// A directory-kind record after the volume header
    #[error("skipping extra directory record {index} ({kind}): {title}")]
    ExtraDirectory {
        index: usize,
        kind: String,
        title: String,
    },

    /// File data span lies partly or wholly outside the volume
    #[error("data span of '{title}' ({start:#X}..{end:#X}) exceeds volume length {length:#X}")]
    SpanOutOfRange {
        title: String,
        start: u64,
        end: u64,
        length: u64,
    },

    /// Non-separator entry whose last block precedes its first block
    #[error("entry '{title}' ends at block {last} before it starts at block {first}")]
    InvertedSpan {
        title: String,
        first: u16,
        last: u16,
    },

    /// Container declares more data than the file holds
    #[error("container declares {declared} data bytes but only {available} are present")]
    TruncatedContainer { declared: u64, available: u64 },

    /// Host timestamp could not be applied to an output path
    #[error("could not set timestamp on {path}: {reason}")]
    Timestamp { path: String, reason: String },
}
