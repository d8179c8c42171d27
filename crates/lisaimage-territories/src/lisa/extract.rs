//! Output materializer
//!
//! Lays a decoded volume out on the host as
//! `<out>/<volume>/[<separator>/]<file>`. Separators switch the folder that
//! later files land in; they do not nest.

use super::types::{FileEntry, FileKind};
use super::LisaTerritory;
use chrono::{Local, NaiveDate, TimeZone};
use lisaimage_core::{host_file_name, Error, Result, Warning};
use std::fs::{self, File, FileTimes};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Folder that non-separator entries are written into
#[derive(Debug, Clone, PartialEq, Eq)]
enum Folder {
    /// The volume folder itself
    Root,
    /// A folder opened by a separator entry
    Sub(PathBuf),
}

/// Summary of a finished extraction
#[derive(Debug, Default)]
pub struct ExtractReport {
    /// Volume folder that was written
    pub volume_root: PathBuf,
    /// Separator folders created or reused
    pub directories: usize,
    /// Files written
    pub files: usize,
    /// Problems found while writing
    pub warnings: Vec<Warning>,
}

/// Writes entries in directory order, tracking the current folder
pub struct Materializer {
    volume_root: PathBuf,
    current: Folder,
    /// Directory timestamps, applied once all files are in place
    pending: Vec<(PathBuf, Option<NaiveDate>)>,
    report: ExtractReport,
}

/// Make sure `path` is a directory, creating it if missing
fn ensure_dir(path: &Path) -> Result<()> {
    if path.exists() && !path.is_dir() {
        return Err(Error::output_collision(format!(
            "file exists at location for directory {}",
            path.display()
        )));
    }
    fs::create_dir_all(path)?;
    Ok(())
}

/// Local midnight of `date`
fn local_midnight(date: NaiveDate) -> Option<SystemTime> {
    let naive = date.and_hms_opt(0, 0, 0)?;
    Local.from_local_datetime(&naive).earliest().map(SystemTime::from)
}

fn set_mtime(file: &File, date: NaiveDate) -> std::io::Result<()> {
    let time = local_midnight(date).ok_or_else(|| {
        let reason = format!("{} has no local midnight", date);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, reason)
    })?;
    file.set_times(FileTimes::new().set_modified(time).set_accessed(time))
}

impl Materializer {
    /// Prepare `out_dir` and the volume folder inside it
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutputCollision`] if either path exists and is not a
    /// directory.
    pub fn new(out_dir: &Path, volume_title: &str, last_modified: NaiveDate) -> Result<Self> {
        ensure_dir(out_dir)?;
        let volume_root = out_dir.join(host_file_name(volume_title));
        ensure_dir(&volume_root)?;

        Ok(Self {
            pending: vec![(volume_root.clone(), Some(last_modified))],
            current: Folder::Root,
            report: ExtractReport {
                volume_root: volume_root.clone(),
                ..ExtractReport::default()
            },
            volume_root,
        })
    }

    /// Write one entry
    pub fn place(&mut self, entry: &FileEntry) -> Result<()> {
        let name = host_file_name(&entry.title);

        if entry.kind == FileKind::Separator {
            let dir = self.volume_root.join(&name);
            ensure_dir(&dir)?;
            tracing::debug!("Folder {}", dir.display());
            self.current = Folder::Sub(PathBuf::from(name));
            self.pending.push((dir, entry.accessed));
            self.report.directories += 1;
            return Ok(());
        }

        let path = match &self.current {
            Folder::Root => self.volume_root.join(&name),
            Folder::Sub(sub) => self.volume_root.join(sub).join(&name),
        };

        let mut file = File::create(&path)?;
        file.write_all(&entry.data)?;
        tracing::debug!("Wrote {} ({} bytes)", path.display(), entry.data.len());

        if let Some(date) = entry.accessed {
            if let Err(e) = set_mtime(&file, date) {
                self.timestamp_warning(&path, e);
            }
        }
        self.report.files += 1;
        Ok(())
    }

    fn timestamp_warning(&mut self, path: &Path, error: std::io::Error) {
        let warning = Warning::Timestamp {
            path: path.display().to_string(),
            reason: error.to_string(),
        };
        tracing::warn!("{}", warning);
        self.report.warnings.push(warning);
    }

    /// Stamp directory times and return the report
    pub fn finish(mut self) -> ExtractReport {
        // Last write wins when a separator title repeats
        for (dir, date) in std::mem::take(&mut self.pending) {
            let Some(date) = date else { continue };
            if let Err(e) = File::open(&dir).and_then(|f| set_mtime(&f, date)) {
                self.timestamp_warning(&dir, e);
            }
        }
        self.report
    }
}

/// Extract every entry of `territory` under `out_dir`
///
/// # Errors
///
/// Returns [`Error::OutputCollision`] if an output folder is occupied by a
/// non-directory, or [`Error::Io`] if a write fails. Files already written
/// are left in place.
pub fn extract_volume(territory: &LisaTerritory, out_dir: &Path) -> Result<ExtractReport> {
    let header = territory.header();
    let mut materializer = Materializer::new(out_dir, &header.title, header.last_modified)?;

    for entry in territory.entries() {
        materializer.place(entry)?;
    }

    let report = materializer.finish();
    tracing::info!(
        "Extracted {} files and {} folders to {}",
        report.files,
        report.directories,
        report.volume_root.display()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(kind: FileKind, title: &str, data: &[u8], accessed: Option<NaiveDate>) -> FileEntry {
        FileEntry {
            index: 1,
            kind,
            stored_kind: kind,
            title: title.to_string(),
            first_block: 6,
            last_block: 7,
            last_byte: data.len() as u16,
            accessed,
            data: data.to_vec(),
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_separator_switches_folder() {
        let tmp = TempDir::new().unwrap();
        let mut m = Materializer::new(tmp.path(), "VOL", day(1983, 1, 19)).unwrap();

        m.place(&entry(FileKind::Data, "TOP", b"1", None)).unwrap();
        m.place(&entry(FileKind::Separator, "SUB", b"", None)).unwrap();
        m.place(&entry(FileKind::Data, "INNER", b"2", None)).unwrap();
        m.place(&entry(FileKind::Separator, "OTHER", b"", None)).unwrap();
        m.place(&entry(FileKind::Code, "LAST", b"3", None)).unwrap();
        let report = m.finish();

        let root = tmp.path().join("VOL");
        assert_eq!(report.volume_root, root);
        assert_eq!(report.files, 3);
        assert_eq!(report.directories, 2);
        assert_eq!(fs::read(root.join("TOP")).unwrap(), b"1");
        assert_eq!(fs::read(root.join("SUB/INNER")).unwrap(), b"2");
        // Separators are siblings, not nested
        assert_eq!(fs::read(root.join("OTHER/LAST")).unwrap(), b"3");
        assert!(!root.join("SUB/OTHER").exists());
    }

    #[test]
    fn test_slash_in_titles() {
        let tmp = TempDir::new().unwrap();
        let mut m = Materializer::new(tmp.path(), "A/B", day(1983, 1, 19)).unwrap();
        m.place(&entry(FileKind::Text, "X/Y", b"t", None)).unwrap();
        m.finish();

        assert!(tmp.path().join("A:B").join("X:Y").is_file());
    }

    #[test]
    fn test_creates_missing_out_dir() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("new").join("deeper");
        Materializer::new(&out, "VOL", day(1983, 1, 19)).unwrap();
        assert!(out.join("VOL").is_dir());
    }

    #[test]
    fn test_out_dir_collision() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("taken");
        fs::write(&out, b"not a folder").unwrap();

        let err = Materializer::new(&out, "VOL", day(1983, 1, 19)).err().unwrap();
        assert!(matches!(err, Error::OutputCollision(_)));
    }

    #[test]
    fn test_volume_dir_collision() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("VOL"), b"").unwrap();

        let err = Materializer::new(tmp.path(), "VOL", day(1983, 1, 19)).err().unwrap();
        assert!(matches!(err, Error::OutputCollision(_)));
    }

    #[test]
    fn test_rerun_reuses_dirs_and_overwrites() {
        let tmp = TempDir::new().unwrap();
        for content in [&b"first"[..], &b"second"[..]] {
            let mut m = Materializer::new(tmp.path(), "VOL", day(1983, 1, 19)).unwrap();
            m.place(&entry(FileKind::Separator, "SUB", b"", None)).unwrap();
            m.place(&entry(FileKind::Data, "F", content, None)).unwrap();
            m.finish();
        }
        assert_eq!(fs::read(tmp.path().join("VOL/SUB/F")).unwrap(), b"second");
    }

    #[test]
    fn test_timestamps_applied() {
        let tmp = TempDir::new().unwrap();
        let mut m = Materializer::new(tmp.path(), "VOL", day(1983, 1, 19)).unwrap();
        m.place(&entry(FileKind::Separator, "SUB", b"", Some(day(1984, 2, 3)))).unwrap();
        m.place(&entry(FileKind::Data, "F", b"x", Some(day(1983, 7, 14)))).unwrap();
        let report = m.finish();
        assert!(report.warnings.is_empty());

        let mtime = |p: &Path| fs::metadata(p).unwrap().modified().unwrap();
        let root = tmp.path().join("VOL");
        assert_eq!(mtime(&root.join("SUB/F")), local_midnight(day(1983, 7, 14)).unwrap());
        assert_eq!(mtime(&root.join("SUB")), local_midnight(day(1984, 2, 3)).unwrap());
        assert_eq!(mtime(&root), local_midnight(day(1983, 1, 19)).unwrap());
    }

    #[test]
    fn test_missing_date_leaves_mtime() {
        let tmp = TempDir::new().unwrap();
        let mut m = Materializer::new(tmp.path(), "VOL", day(1983, 1, 19)).unwrap();
        m.place(&entry(FileKind::Data, "F", b"x", None)).unwrap();
        m.finish();

        let modified = fs::metadata(tmp.path().join("VOL/F")).unwrap().modified().unwrap();
        assert!(modified > local_midnight(day(2000, 1, 1)).unwrap());
    }
}
