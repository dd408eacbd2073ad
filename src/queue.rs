// File queue: the staging (`upload/`) and completed (`done/`) directories,
// and the deterministic order in which staged files are uploaded.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Where a staged file currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Pending,
    Done,
    /// Attempted this run but left in the staging directory.
    Failed,
}

/// A staged file. The name is also the remote upload filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub name: String,
    pub location: Location,
}

impl FileRecord {
    pub fn pending(name: impl Into<String>) -> Self {
        FileRecord {
            name: name.into(),
            location: Location::Pending,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileQueue {
    upload_dir: PathBuf,
    done_dir: PathBuf,
}

impl FileQueue {
    pub fn new(upload_dir: impl Into<PathBuf>, done_dir: impl Into<PathBuf>) -> Self {
        FileQueue {
            upload_dir: upload_dir.into(),
            done_dir: done_dir.into(),
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn done_dir(&self) -> &Path {
        &self.done_dir
    }

    /// Create both directories if they are missing, telling the operator
    /// about each one created. Safe to call repeatedly.
    pub fn prepare(&self, out: &mut impl Write) -> io::Result<()> {
        if !self.upload_dir.exists() {
            writeln!(out, "Creating directory for uploads...")?;
            fs::create_dir_all(&self.upload_dir)?;
        }
        if !self.done_dir.exists() {
            writeln!(out, "Creating directory for completed uploads...")?;
            fs::create_dir_all(&self.done_dir)?;
        }
        Ok(())
    }

    /// Regular files in the staging directory, sorted by lowercased name.
    /// Names that are not valid UTF-8 are skipped since they cannot be sent
    /// as an upload filename.
    pub fn list_pending(&self) -> io::Result<Vec<FileRecord>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.upload_dir)? {
            let entry = entry?;
            if !entry.path().is_file() {
                continue;
            }
            if let Ok(name) = entry.file_name().into_string() {
                names.push(name);
            }
        }
        sort_case_insensitive(&mut names);
        Ok(names.into_iter().map(FileRecord::pending).collect())
    }

    pub fn pending_path(&self, record: &FileRecord) -> PathBuf {
        self.upload_dir.join(&record.name)
    }

    /// Move an uploaded file into the completed directory.
    pub fn complete(&self, record: &mut FileRecord) -> io::Result<()> {
        fs::rename(self.pending_path(record), self.done_dir.join(&record.name))?;
        record.location = Location::Done;
        Ok(())
    }
}

// Stable sort: names equal after lowercasing keep directory order.
fn sort_case_insensitive(names: &mut [String]) {
    names.sort_by_cached_key(|n| n.to_lowercase());
}
