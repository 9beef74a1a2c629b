//! Output directory layout and the per-run manifest.

use crate::camera::CameraSettings;
use crate::error::{Result, TimelapseError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Directory holding the images and manifest of one run.
///
/// Layout: `<root>/<name>/<name>_0001.<ext>` ... plus `<name>_info.txt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunDirectory {
    name: String,
    path: PathBuf,
    extension: String,
}

impl RunDirectory {
    /// Create `<root>/<name>`, reusing it if it already exists.
    pub fn prepare(root: &Path, name: &str, extension: &str) -> Result<Self> {
        let path = root.join(name);
        if path.is_dir() {
            info!("Reusing existing run directory {}", path.display());
        }
        fs::create_dir_all(&path).map_err(|e| TimelapseError::storage_error(&path, e))?;
        debug!("Run directory ready at {}", path.display());

        Ok(Self {
            name: name.to_string(),
            path,
            extension: extension.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name of the image with 1-based `number`.
    pub fn image_file_name(&self, number: u32) -> String {
        format!("{}_{:04}.{}", self.name, number, self.extension)
    }

    pub fn image_path(&self, number: u32) -> PathBuf {
        self.path.join(self.image_file_name(number))
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.path.join(format!("{}_info.txt", self.name))
    }

    /// Write the manifest as TOML, replacing any previous one.
    pub fn write_manifest(&self, manifest: &RunManifest) -> Result<PathBuf> {
        let body = toml::to_string(manifest)
            .map_err(|e| TimelapseError::system_error(format!("manifest encoding failed: {}", e)))?;
        let path = self.manifest_path();
        fs::write(&path, body).map_err(|e| TimelapseError::storage_error(&path, e))?;
        Ok(path)
    }
}

/// Configuration and camera settings recorded when a run starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub name: String,
    pub total_images: u32,
    pub interval_secs: f64,
    pub planned_duration_secs: f64,
    pub start_time: DateTime<Utc>,
    pub device: String,
    pub camera: CameraSettings,
}

impl RunManifest {
    /// Read a manifest back from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let body = fs::read_to_string(path)?;
        toml::from_str(&body)
            .map_err(|e| TimelapseError::config_error(format!("invalid manifest: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(name: &str) -> RunManifest {
        RunManifest {
            name: name.to_string(),
            total_images: 600,
            interval_secs: 15.0,
            planned_duration_secs: 8985.0,
            start_time: Utc::now(),
            device: "test camera".to_string(),
            camera: CameraSettings::default().with_iso(100),
        }
    }

    #[test]
    fn test_image_numbering() {
        let root = tempfile::tempdir().unwrap();
        let dir = RunDirectory::prepare(root.path(), "20240614_0905", "jpg").unwrap();

        assert_eq!(dir.image_file_name(1), "20240614_0905_0001.jpg");
        assert_eq!(dir.image_file_name(600), "20240614_0905_0600.jpg");
        assert_eq!(
            dir.image_path(12),
            root.path().join("20240614_0905").join("20240614_0905_0012.jpg")
        );
        assert!(dir.path().is_dir());
    }

    #[test]
    fn test_existing_directory_is_reused() {
        let root = tempfile::tempdir().unwrap();
        let existing = root.path().join("run");
        fs::create_dir(&existing).unwrap();
        fs::write(existing.join("keep.txt"), "data").unwrap();

        let dir = RunDirectory::prepare(root.path(), "run", "jpg").unwrap();
        assert_eq!(dir.path(), existing.as_path());
        assert!(existing.join("keep.txt").exists());
    }

    #[test]
    fn test_unwritable_root_is_storage_error() {
        let root = tempfile::NamedTempFile::new().unwrap();
        let err = RunDirectory::prepare(root.path(), "run", "jpg").unwrap_err();
        assert!(matches!(err, TimelapseError::Storage { .. }));
    }

    #[test]
    fn test_manifest_written_as_toml() {
        let root = tempfile::tempdir().unwrap();
        let dir = RunDirectory::prepare(root.path(), "run", "jpg").unwrap();
        let written = manifest("run");

        let path = dir.write_manifest(&written).unwrap();
        assert_eq!(path, dir.manifest_path());

        let body = fs::read_to_string(&path).unwrap();
        assert!(body.contains("total_images = 600"));
        assert!(body.contains("[camera]"));

        let loaded = RunManifest::load(&path).unwrap();
        assert_eq!(loaded.total_images, 600);
        assert_eq!(loaded.camera.iso, 100);
    }
}
