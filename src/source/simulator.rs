//! Reads a CoreSimulator device set straight from disk.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, warn};
use plist::{Dictionary, Value};

use crate::error::FetchError;
use crate::nav::model::{AppSummary, DeviceState, DeviceSummary};
use crate::source::DeviceSource;

const RUNTIME_PREFIX: &str = "com.apple.CoreSimulator.SimRuntime.";
const CONTAINER_METADATA: &str = ".com.apple.mobile_container_manager.metadata.plist";

/// A device set directory, one `<UDID>/device.plist` per device.
#[derive(Debug, Clone)]
pub struct SimulatorSet {
    root: PathBuf,
}

impl SimulatorSet {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    fn read_device(dir: &Path) -> Option<DeviceSummary> {
        let plist = read_dictionary(&dir.join("device.plist"))?;
        let udid = string(&plist, "UDID").unwrap_or_else(|| dir_name(dir));
        let name = string(&plist, "name")?;
        let runtime = string(&plist, "runtime")
            .map(|r| humanize_runtime(&r))
            .unwrap_or_default();
        let state = plist
            .get("state")
            .and_then(Value::as_signed_integer)
            .map(DeviceState::from_code)
            .unwrap_or(DeviceState::Other);
        Some(DeviceSummary {
            udid,
            name,
            runtime,
            state,
            path: dir.to_path_buf(),
        })
    }

    /// Bundle identifier → data container directory.
    fn data_containers(device: &DeviceSummary) -> HashMap<String, PathBuf> {
        let dir = device.path.join("data/Containers/Data/Application");
        subdirectories(&dir)
            .into_iter()
            .filter_map(|container| {
                let meta = read_dictionary(&container.join(CONTAINER_METADATA))?;
                let id = string(&meta, "MCMMetadataIdentifier")?;
                Some((id, container))
            })
            .collect()
    }

    fn read_app(
        container: &Path,
        device: &DeviceSummary,
        data: &HashMap<String, PathBuf>,
    ) -> Option<AppSummary> {
        let bundle = subdirectories(container)
            .into_iter()
            .find(|p| p.extension().is_some_and(|e| e == "app"))?;
        let info = read_dictionary(&bundle.join("Info.plist"))?;
        let bundle_id = string(&info, "CFBundleIdentifier")?;
        let name = string(&info, "CFBundleDisplayName")
            .or_else(|| string(&info, "CFBundleName"))
            .unwrap_or_else(|| {
                bundle
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| bundle_id.clone())
            });
        let version = string(&info, "CFBundleShortVersionString")
            .or_else(|| string(&info, "CFBundleVersion"))
            .unwrap_or_default();
        Some(AppSummary {
            data_path: data.get(&bundle_id).cloned(),
            bundle_id,
            name,
            version,
            device_name: device.name.clone(),
            device_udid: device.udid.clone(),
            bundle_path: bundle,
        })
    }
}

impl DeviceSource for SimulatorSet {
    fn list_devices(&self) -> Result<Vec<DeviceSummary>, FetchError> {
        let entries = fs::read_dir(&self.root).map_err(|e| FetchError::read(&self.root, e))?;
        let mut devices: Vec<DeviceSummary> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .filter_map(|path| Self::read_device(&path))
            .collect();
        devices.sort_by(|a, b| {
            b.is_booted()
                .cmp(&a.is_booted())
                .then_with(|| a.runtime.cmp(&b.runtime))
                .then_with(|| a.name.cmp(&b.name))
        });
        debug!("found {} devices under {}", devices.len(), self.root.display());
        Ok(devices)
    }

    fn list_apps(&self, device: &DeviceSummary) -> Result<Vec<AppSummary>, FetchError> {
        if !device.path.is_dir() {
            return Err(FetchError::read(&device.path, "device directory missing"));
        }
        let data = Self::data_containers(device);
        // A device that never booted has no containers yet.
        let bundles = device.path.join("data/Containers/Bundle/Application");
        let mut apps: Vec<AppSummary> = subdirectories(&bundles)
            .iter()
            .filter_map(|container| Self::read_app(container, device, &data))
            .collect();
        apps.sort_by_key(|a| a.name.to_lowercase());
        Ok(apps)
    }

    fn boot(&self, device: &DeviceSummary) -> Result<(), FetchError> {
        let output = Command::new("xcrun")
            .arg("simctl")
            .arg("--set")
            .arg(&self.root)
            .args(["boot", &device.udid])
            .output()
            .map_err(|e| FetchError::Fetch(format!("cannot run xcrun: {e}")))?;
        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!("simctl boot {} failed: {stderr}", device.udid);
            Err(FetchError::Fetch(stderr))
        }
    }
}

fn read_dictionary(path: &Path) -> Option<Dictionary> {
    match Value::from_file(path) {
        Ok(Value::Dictionary(dict)) => Some(dict),
        Ok(_) => None,
        Err(err) => {
            if path.exists() {
                warn!("unreadable plist {}: {err}", path.display());
            }
            None
        }
    }
}

fn string(dict: &Dictionary, key: &str) -> Option<String> {
    dict.get(key).and_then(Value::as_string).map(str::to_string)
}

fn subdirectories(dir: &Path) -> Vec<PathBuf> {
    fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| path.is_dir())
                .collect()
        })
        .unwrap_or_default()
}

fn dir_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// `com.apple.CoreSimulator.SimRuntime.iOS-17-2` → `iOS 17.2`.
pub fn humanize_runtime(identifier: &str) -> String {
    let short = identifier.strip_prefix(RUNTIME_PREFIX).unwrap_or(identifier);
    match short.split_once('-') {
        Some((os, version)) => format!("{os} {}", version.replace('-', ".")),
        None => short.to_string(),
    }
}
