use std::fs;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::FetchError;
use crate::nav::model::{Entry, FileStat};
use crate::source::FileReader;

/// Reads the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl LocalFs {
    fn entry(path: &Path) -> std::io::Result<Entry> {
        // Follow symlinks so a link to a directory can be entered; a broken
        // link still shows up as a file.
        let metadata = fs::metadata(path).or_else(|_| fs::symlink_metadata(path))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());
        Ok(Entry {
            name,
            path: path.to_path_buf(),
            is_dir: metadata.is_dir(),
            size: metadata.len(),
            modified: metadata.modified().ok(),
        })
    }
}

impl FileReader for LocalFs {
    /// Directories first, then case-insensitive by name. Unreadable
    /// entries are skipped.
    fn read_dir(&self, path: &Path) -> Result<Vec<Entry>, FetchError> {
        let entries = fs::read_dir(path).map_err(|e| FetchError::read(path, e))?;
        let mut children: Vec<Entry> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| Self::entry(&entry.path()).ok())
            .collect();
        children.sort_by(|a, b| {
            b.is_dir
                .cmp(&a.is_dir)
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });
        Ok(children)
    }

    fn stat(&self, path: &Path) -> Result<FileStat, FetchError> {
        let metadata = fs::metadata(path).map_err(|e| FetchError::read(path, e))?;
        Ok(FileStat {
            size: metadata.len(),
            modified: metadata.modified().ok(),
            is_dir: metadata.is_dir(),
        })
    }

    fn read_range(&self, path: &Path, start: u64, len: u64) -> Result<Vec<u8>, FetchError> {
        let mut file = fs::File::open(path).map_err(|e| FetchError::read(path, e))?;
        file.seek(SeekFrom::Start(start))
            .map_err(|e| FetchError::read(path, e))?;
        let mut buf = Vec::with_capacity(len as usize);
        file.take(len)
            .read_to_end(&mut buf)
            .map_err(|e| FetchError::read(path, e))?;
        Ok(buf)
    }
}
