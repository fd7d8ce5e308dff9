//! Typed records the navigator receives from its collaborators.
//!
//! None of these are parsed here; the device source, filesystem reader and
//! database reader build them and the navigator only stores, filters and
//! lays them out.

use std::fmt;
use std::path::PathBuf;
use std::time::SystemTime;

/// Boot state of a simulator device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    Booted,
    Shutdown,
    Other,
}

impl DeviceState {
    /// Map the numeric state stored in a device's `device.plist`.
    pub fn from_code(code: i64) -> Self {
        match code {
            3 => DeviceState::Booted,
            1 => DeviceState::Shutdown,
            _ => DeviceState::Other,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DeviceState::Booted => "Booted",
            DeviceState::Shutdown => "Shutdown",
            DeviceState::Other => "Unknown",
        }
    }
}

/// One simulator device.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSummary {
    pub udid: String,
    pub name: String,
    /// Human readable runtime, e.g. `iOS 17.2`.
    pub runtime: String,
    pub state: DeviceState,
    /// Root of the device directory inside the device set.
    pub path: PathBuf,
}

impl DeviceSummary {
    pub fn is_booted(&self) -> bool {
        self.state == DeviceState::Booted
    }
}

/// One installed application.
#[derive(Debug, Clone, PartialEq)]
pub struct AppSummary {
    pub bundle_id: String,
    pub name: String,
    pub version: String,
    pub device_name: String,
    pub device_udid: String,
    pub bundle_path: PathBuf,
    /// Sandbox data container, when one has been created.
    pub data_path: Option<PathBuf>,
}

impl AppSummary {
    /// The directory a file browser opens for this app.
    pub fn browse_root(&self) -> PathBuf {
        self.data_path
            .clone()
            .unwrap_or_else(|| self.bundle_path.clone())
    }
}

/// A directory entry as returned by the filesystem reader.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
    pub size: u64,
    pub modified: Option<SystemTime>,
}

impl Entry {
    pub fn is_hidden(&self) -> bool {
        self.name.starts_with('.')
    }
}

/// Cheap metadata for a single path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FileStat {
    pub size: u64,
    pub modified: Option<SystemTime>,
    pub is_dir: bool,
}

/// One column of a database table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub decl_type: String,
}

/// A table inside a structured database file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
    pub row_count: usize,
}

/// A single typed database value.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Null => write!(f, "NULL"),
            Field::Integer(v) => write!(f, "{v}"),
            Field::Real(v) => write!(f, "{v}"),
            Field::Text(s) => write!(f, "{s}"),
            Field::Blob(b) => write!(f, "<blob {} bytes>", b.len()),
        }
    }
}

pub type Row = Vec<Field>;

/// What a file open returns: cheap metadata plus the leading bytes.
///
/// `head` is the whole file when it is below the small-file threshold and
/// the first chunk otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenedFile {
    pub stat: FileStat,
    pub head: Vec<u8>,
}

/// RGB pixels of a decoded raster image, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<[u8; 3]>,
}

impl PixelGrid {
    pub fn get(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get((y * self.width + x) as usize).copied()
    }
}

/// Output of a whole-payload renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Image(PixelGrid),
    /// Archive listings and normalized property lists.
    Lines(Vec<String>),
}
