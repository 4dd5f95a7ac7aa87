//! Image set index.
//!
//! Enumerates the ordered image set and maps each image to the identifier of
//! its record. The listing is recomputed on every call so images dropped into
//! the directory while a session is running are picked up without a restart.

use std::fs;
use std::path::{Path, PathBuf};

use log::warn;
use walkdir::WalkDir;

use crate::error::LabelError;

/// Extension of the per-image record files.
pub const RECORD_EXTENSION: &str = "xml";

/// Returns the record identifier for an image: the image file name with its
/// extension replaced by the record extension.
pub fn record_id_for(image_id: &str) -> String {
    Path::new(image_id)
        .with_extension(RECORD_EXTENSION)
        .to_string_lossy()
        .into_owned()
}

/// The ordered set of images in one directory.
#[derive(Clone, Debug)]
pub struct ImageIndex {
    dir: PathBuf,
    extension: String,
}

impl ImageIndex {
    /// Creates an index over `dir`, admitting files whose extension is exactly
    /// `extension` (case-sensitive, without the leading dot).
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Lists image identifiers sorted lexicographically by file name.
    ///
    /// An absent directory yields an empty list. The scan is flat: images in
    /// nested directories are skipped with a warning.
    pub fn list(&self) -> Result<Vec<String>, LabelError> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut images = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(LabelError::Io)? {
            let entry = entry.map_err(LabelError::Io)?;
            let path = entry.path();
            if !path.is_file() || !self.admits(&path) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                images.push(name.to_string());
            }
        }
        images.sort();

        let nested = WalkDir::new(&self.dir)
            .min_depth(2)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file() && self.admits(entry.path()))
            .count();
        if nested > 0 {
            warn!(
                "image index scans {} flat (non-recursive); skipping {} nested image(s)",
                self.dir.display(),
                nested
            );
        }

        Ok(images)
    }

    /// Full path of an image in this set.
    pub fn image_path(&self, image_id: &str) -> PathBuf {
        self.dir.join(image_id)
    }

    fn admits(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext == self.extension)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_id_replaces_extension() {
        assert_eq!(record_id_for("car_001.png"), "car_001.xml");
        assert_eq!(record_id_for("plate.v2.png"), "plate.v2.xml");
        assert_eq!(record_id_for("no_extension"), "no_extension.xml");
    }

    #[test]
    fn list_sorts_and_filters_by_extension() {
        let temp = tempfile::tempdir().expect("create temp dir");
        for name in ["c.png", "a.png", "b.png", "notes.txt", "upper.PNG"] {
            fs::write(temp.path().join(name), b"x").expect("write file");
        }
        fs::create_dir_all(temp.path().join("nested")).expect("create nested dir");
        fs::write(temp.path().join("nested/d.png"), b"x").expect("write nested");

        let index = ImageIndex::new(temp.path(), "png");
        assert_eq!(
            index.list().expect("list images"),
            vec!["a.png", "b.png", "c.png"]
        );
    }

    #[test]
    fn list_of_missing_directory_is_empty() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let index = ImageIndex::new(temp.path().join("absent"), "png");
        assert!(index.list().expect("list images").is_empty());
    }

    #[test]
    fn list_picks_up_new_images_between_calls() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let index = ImageIndex::new(temp.path(), "png");
        fs::write(temp.path().join("b.png"), b"x").expect("write b");
        assert_eq!(index.list().expect("first list"), vec!["b.png"]);

        fs::write(temp.path().join("a.png"), b"x").expect("write a");
        assert_eq!(index.list().expect("second list"), vec!["a.png", "b.png"]);
    }
}
