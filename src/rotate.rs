//! Size-bounded rotating file writer.
//!
//! Rollover semantics: when a write would push the file past `max_size`,
//! existing backups shift up (`app.log.1` -> `app.log.2`, ...), the live
//! file becomes `app.log.1`, the backup beyond `backup_count` is discarded,
//! and writing continues into a fresh file. `backup_count == 0` truncates in
//! place; `max_size == 0` disables rotation entirely.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub struct RotatingWriter {
    path: PathBuf,
    max_size: u64,
    backup_count: u32,
    file: File,
    size: u64,
}

impl RotatingWriter {
    /// Open `path` for appending, picking up the current size of any
    /// existing file so rotation accounting survives restarts.
    pub fn open(path: impl Into<PathBuf>, max_size: u64, backup_count: u32) -> io::Result<Self> {
        let path = path.into();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let size = file.metadata()?.len();
        Ok(RotatingWriter { path, max_size, backup_count, file, size })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one UTF-8 line, rotating first if the line would overflow
    /// `max_size`.
    pub fn write_line(&mut self, line: &str) -> io::Result<()> {
        let incoming = line.len() as u64 + 1;
        if self.max_size > 0 && self.size + incoming > self.max_size {
            self.rotate()?;
        }
        self.file.write_all(line.as_bytes())?;
        self.file.write_all(b"\n")?;
        self.file.flush()?;
        self.size += incoming;
        Ok(())
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        if self.backup_count > 0 {
            let oldest = self.backup_path(self.backup_count);
            if oldest.exists() {
                std::fs::remove_file(&oldest)?;
            }
            for i in (1..self.backup_count).rev() {
                let src = self.backup_path(i);
                if src.exists() {
                    std::fs::rename(&src, self.backup_path(i + 1))?;
                }
            }
            std::fs::rename(&self.path, self.backup_path(1))?;
        }
        self.file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        self.size = 0;
        Ok(())
    }

    fn backup_path(&self, index: u32) -> PathBuf {
        PathBuf::from(format!("{}.{}", self.path.display(), index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(path: &Path) -> String {
        std::fs::read_to_string(path).unwrap_or_default()
    }

    #[test]
    fn rotates_when_line_would_overflow() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let mut writer = RotatingWriter::open(&path, 20, 2).unwrap();
        writer.write_line("first entry....").unwrap(); // 16 bytes
        writer.write_line("second entry...").unwrap(); // would overflow
        assert_eq!(read(&path), "second entry...\n");
        assert_eq!(read(&dir.path().join("app.log.1")), "first entry....\n");
    }

    #[test]
    fn oldest_backup_beyond_count_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let mut writer = RotatingWriter::open(&path, 8, 2).unwrap();
        for line in ["aaaaaa", "bbbbbb", "cccccc", "dddddd"] {
            writer.write_line(line).unwrap();
        }
        assert_eq!(read(&path), "dddddd\n");
        assert_eq!(read(&dir.path().join("app.log.1")), "cccccc\n");
        assert_eq!(read(&dir.path().join("app.log.2")), "bbbbbb\n");
        assert!(!dir.path().join("app.log.3").exists());
    }

    #[test]
    fn zero_backup_count_truncates_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let mut writer = RotatingWriter::open(&path, 8, 0).unwrap();
        writer.write_line("aaaaaa").unwrap();
        writer.write_line("bbbbbb").unwrap();
        assert_eq!(read(&path), "bbbbbb\n");
        assert!(!dir.path().join("app.log.1").exists());
    }

    #[test]
    fn zero_max_size_never_rotates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let mut writer = RotatingWriter::open(&path, 0, 3).unwrap();
        for _ in 0..50 {
            writer.write_line("a long enough line to matter").unwrap();
        }
        assert!(!dir.path().join("app.log.1").exists());
        assert_eq!(read(&path).lines().count(), 50);
    }

    #[test]
    fn existing_file_size_counts_toward_rotation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        std::fs::write(&path, "previous run....\n").unwrap();
        let mut writer = RotatingWriter::open(&path, 20, 1).unwrap();
        writer.write_line("fresh").unwrap();
        assert_eq!(read(&path), "fresh\n");
        assert_eq!(read(&dir.path().join("app.log.1")), "previous run....\n");
    }
}
