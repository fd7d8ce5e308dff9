//! Collaborators the navigator talks to, and their host implementations.
//!
//! Every call is blocking; the worker runs them off the event loop.

pub mod local_fs;
pub mod simulator;
pub mod sqlite;
pub mod worker;

use std::path::Path;
use std::sync::Arc;

use log::warn;

use crate::error::FetchError;
use crate::nav::model::{AppSummary, DeviceSummary, Entry, FileStat, OpenedFile, Row, TableSchema};

/// Enumerates devices and the apps installed on them.
pub trait DeviceSource: Send + Sync {
    fn list_devices(&self) -> Result<Vec<DeviceSummary>, FetchError>;

    fn list_apps(&self, device: &DeviceSummary) -> Result<Vec<AppSummary>, FetchError>;

    fn boot(&self, device: &DeviceSummary) -> Result<(), FetchError>;

    /// Apps of every device. A device whose apps cannot be read is skipped.
    fn list_all_apps(&self) -> Result<Vec<AppSummary>, FetchError> {
        let mut apps = Vec::new();
        for device in self.list_devices()? {
            match self.list_apps(&device) {
                Ok(found) => apps.extend(found),
                Err(err) => warn!("skipping apps of {}: {err}", device.udid),
            }
        }
        apps.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.device_name.cmp(&b.device_name))
        });
        Ok(apps)
    }
}

/// Reads directories and byte ranges of files.
pub trait FileReader: Send + Sync {
    fn read_dir(&self, path: &Path) -> Result<Vec<Entry>, FetchError>;

    fn stat(&self, path: &Path) -> Result<FileStat, FetchError>;

    /// Up to `len` bytes starting at `start`. Short at end of file.
    fn read_range(&self, path: &Path, start: u64, len: u64) -> Result<Vec<u8>, FetchError>;

    /// Stat, then read the whole file if it is small, else its first
    /// `head_len` bytes. Never reads more than that.
    fn open(
        &self,
        path: &Path,
        head_len: u64,
        small_file_threshold: u64,
    ) -> Result<OpenedFile, FetchError> {
        let stat = self.stat(path)?;
        if stat.is_dir {
            return Err(FetchError::read(path, "is a directory"));
        }
        let len = if stat.size <= small_file_threshold {
            stat.size
        } else {
            head_len.min(stat.size)
        };
        let head = self.read_range(path, 0, len)?;
        Ok(OpenedFile { stat, head })
    }
}

/// Reads tables out of a structured database file.
pub trait DatabaseReader: Send + Sync {
    fn list_tables(&self, path: &Path) -> Result<Vec<TableSchema>, FetchError>;

    fn fetch_rows(
        &self,
        path: &Path,
        table: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Row>, FetchError>;
}

/// The set of collaborators the worker dispatches to.
#[derive(Clone)]
pub struct Sources {
    pub devices: Arc<dyn DeviceSource>,
    pub files: Arc<dyn FileReader>,
    pub database: Arc<dyn DatabaseReader>,
}

impl Sources {
    /// Host implementations rooted at a simulator device set.
    pub fn host(device_root: &Path) -> Self {
        Self {
            devices: Arc::new(simulator::SimulatorSet::new(device_root)),
            files: Arc::new(local_fs::LocalFs),
            database: Arc::new(sqlite::SqliteReader),
        }
    }
}
