//! On-disk layout of a booth root folder
//!
//! ```text
//! <root>/
//!   photos/<session folder>/<captured photos>
//!   output/<composed images>
//!   qr_codes/qr_<hash>.png
//! ```
//!
//! Paths stored in session records are relative to the root and always use
//! forward slashes, so they double as URL paths for the gallery frontend.

use crate::Result;
use std::path::{Path, PathBuf};

pub const PHOTOS_DIR: &str = "photos";
pub const OUTPUT_DIR: &str = "output";
pub const QR_CODES_DIR: &str = "qr_codes";

/// Resolved directory layout under one root folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    pub root: PathBuf,
    pub photos_dir: PathBuf,
    pub output_dir: PathBuf,
    pub qr_dir: PathBuf,
}

impl StorageLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            photos_dir: root.join(PHOTOS_DIR),
            output_dir: root.join(OUTPUT_DIR),
            qr_dir: root.join(QR_CODES_DIR),
            root,
        }
    }

    /// Create root, photos, output and qr_codes directories if missing
    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.root, &self.photos_dir, &self.output_dir, &self.qr_dir] {
            if !dir.exists() {
                std::fs::create_dir_all(dir)?;
                tracing::info!(path = %dir.display(), "Created directory");
            }
        }
        Ok(())
    }

    /// Root-relative, forward-slash form of a path under the root
    ///
    /// Returns None for paths outside the root or with non UTF-8 components.
    pub fn relative(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts: Option<Vec<&str>> = relative.iter().map(|part| part.to_str()).collect();
        let parts = parts?;
        if parts.is_empty() {
            return None;
        }
        Some(parts.join("/"))
    }

    /// Absolute path for a stored root-relative path
    pub fn resolve(&self, relative: &str) -> PathBuf {
        relative
            .split('/')
            .filter(|part| !part.is_empty())
            .fold(self.root.clone(), |path, part| path.join(part))
    }

    /// Where the QR image for a session hash is written
    pub fn qr_file(&self, hash: &str) -> PathBuf {
        self.qr_dir.join(format!("qr_{}.png", hash))
    }

    /// Scratch file a QR job writes before it is published to [`Self::qr_file`]
    pub fn qr_staging_file(&self, hash: &str, generation: u64) -> PathBuf {
        self.qr_dir.join(format!("qr_{}.{}.tmp", hash, generation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_directories() {
        let layout = StorageLayout::new("/srv/booth");
        assert_eq!(layout.photos_dir, PathBuf::from("/srv/booth/photos"));
        assert_eq!(layout.output_dir, PathBuf::from("/srv/booth/output"));
        assert_eq!(layout.qr_dir, PathBuf::from("/srv/booth/qr_codes"));
    }

    #[test]
    fn test_relative_uses_forward_slashes() {
        let layout = StorageLayout::new("/srv/booth");
        let photo = layout.photos_dir.join("20240101_120000").join("photo1.jpg");
        assert_eq!(
            layout.relative(&photo).as_deref(),
            Some("photos/20240101_120000/photo1.jpg")
        );
        assert_eq!(layout.relative(Path::new("/elsewhere/x.png")), None);
        assert_eq!(layout.relative(Path::new("/srv/booth")), None);
    }

    #[test]
    fn test_resolve_round_trips_relative() {
        let layout = StorageLayout::new("/srv/booth");
        let qr = layout.qr_file("abcdef012345");
        let relative = layout.relative(&qr).unwrap();
        assert_eq!(relative, "qr_codes/qr_abcdef012345.png");
        assert_eq!(layout.resolve(&relative), qr);
    }

    #[test]
    fn test_ensure_directories_creates_tree() {
        let temp = tempfile::tempdir().unwrap();
        let layout = StorageLayout::new(temp.path().join("booth"));
        layout.ensure_directories().unwrap();
        assert!(layout.photos_dir.is_dir());
        assert!(layout.output_dir.is_dir());
        assert!(layout.qr_dir.is_dir());

        // Second call is a no-op
        layout.ensure_directories().unwrap();
    }
}
