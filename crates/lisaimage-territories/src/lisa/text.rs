//! Text file normalization
//!
//! Text files are stored in blocks padded with NULs, with leading spaces
//! compressed into a DLE marker, and with CR line breaks. Each transform here
//! is total over arbitrary bytes; [`normalize`] applies the enabled ones in
//! the fixed order null stripping, indent expansion, line-ending conversion.

use lisaimage_core::{Warning, BLOCK_SIZE};
use std::fmt;
use std::str::FromStr;

/// Data Link Escape, the indent marker
const DLE: u8 = 0x10;
const CR: u8 = b'\r';
const LF: u8 = b'\n';

/// Offset added to the indent count byte
const INDENT_BIAS: u8 = 32;

/// Target line-ending convention
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    /// LF
    Unix,
    /// CR LF
    Windows,
    /// CR, as stored on disk
    Mac,
}

impl LineEnding {
    fn bytes(&self) -> &'static [u8] {
        match self {
            LineEnding::Unix => b"\n",
            LineEnding::Windows => b"\r\n",
            LineEnding::Mac => b"\r",
        }
    }
}

impl fmt::Display for LineEnding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineEnding::Unix => write!(f, "unix"),
            LineEnding::Windows => write!(f, "windows"),
            LineEnding::Mac => write!(f, "mac"),
        }
    }
}

impl FromStr for LineEnding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unix" => Ok(LineEnding::Unix),
            "windows" => Ok(LineEnding::Windows),
            "mac" => Ok(LineEnding::Mac),
            other => Err(format!("unknown line ending '{}'", other)),
        }
    }
}

/// Which text transforms to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextOptions {
    /// Strip NUL padding from the end of each block
    pub strip_nulls: bool,
    /// Expand DLE indent markers into spaces
    pub expand_indents: bool,
    /// Convert line breaks; `None` keeps them as stored
    pub line_ending: Option<LineEnding>,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            strip_nulls: true,
            expand_indents: true,
            line_ending: None,
        }
    }
}

impl TextOptions {
    /// Options that leave text untouched
    pub fn raw() -> Self {
        Self {
            strip_nulls: false,
            expand_indents: false,
            line_ending: None,
        }
    }
}

/// Apply the enabled transforms in order
pub fn normalize(data: &[u8], options: &TextOptions, warnings: &mut Vec<Warning>) -> Vec<u8> {
    let mut text = data.to_vec();
    if options.strip_nulls {
        text = strip_nulls(&text);
    }
    if options.expand_indents {
        text = expand_indents(&text, warnings);
    }
    if let Some(ending) = options.line_ending {
        text = convert_line_endings(&text, ending);
    }
    text
}

/// Remove the NUL padding at the end of every block
///
/// A short final block is treated like any other block.
pub fn strip_nulls(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    for block in data.chunks(BLOCK_SIZE) {
        let used = block.iter().rposition(|&b| b != 0).map_or(0, |last| last + 1);
        out.extend_from_slice(&block[..used]);
    }
    out
}

/// Expand `DLE n` indent markers that start a line into `n - 32` spaces
///
/// A marker counts only when it directly follows a CR. Count bytes below 32
/// are reported as [`Warning::InvalidIndent`] and both bytes are kept.
pub fn expand_indents(data: &[u8], warnings: &mut Vec<Warning>) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;

    while i < data.len() {
        let byte = data[i];
        if byte == DLE && i > 0 && data[i - 1] == CR {
            if let Some(&count) = data.get(i + 1) {
                if count >= INDENT_BIAS {
                    out.resize(out.len() + (count - INDENT_BIAS) as usize, b' ');
                    i += 2;
                    continue;
                }
                let warning = Warning::InvalidIndent { offset: i, count };
                tracing::warn!("{}", warning);
                warnings.push(warning);
            }
        }
        out.push(byte);
        i += 1;
    }

    out
}

/// Rewrite every line break as `ending`
///
/// CR LF is one break; a lone CR or a lone LF is one break each.
pub fn convert_line_endings(data: &[u8], ending: LineEnding) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;

    while i < data.len() {
        match data[i] {
            CR if data.get(i + 1) == Some(&LF) => {
                out.extend_from_slice(ending.bytes());
                i += 2;
            }
            CR | LF => {
                out.extend_from_slice(ending.bytes());
                i += 1;
            }
            byte => {
                out.push(byte);
                i += 1;
            }
        }
    }

    out
}
