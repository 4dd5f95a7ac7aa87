//! Workspace configuration.
//!
//! The defaults mirror the directory layout the labeling workflow has always
//! used: images under `static/images`, one record per image under
//! `xml_files`, and the per-user ledger in `annotations.csv`.

use std::path::{Path, PathBuf};

pub const DEFAULT_IMAGES_DIR: &str = "static/images";
pub const DEFAULT_RECORDS_DIR: &str = "xml_files";
pub const DEFAULT_LEDGER_PATH: &str = "annotations.csv";
pub const DEFAULT_IMAGE_EXTENSION: &str = "png";

/// Paths and traversal options for one labeling workspace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Directory holding the images to label. Never written to.
    pub images_dir: PathBuf,
    /// Directory holding one record per image.
    pub records_dir: PathBuf,
    /// The per-user annotation count table.
    pub ledger_path: PathBuf,
    /// Raster extension (without the dot) that makes a file part of the image set.
    pub image_extension: String,
    /// Create a fresh record for any image that lacks one when a session opens.
    pub create_missing_records: bool,
    /// Start a new session at the first unresolved image instead of index 0.
    pub resume: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            images_dir: PathBuf::from(DEFAULT_IMAGES_DIR),
            records_dir: PathBuf::from(DEFAULT_RECORDS_DIR),
            ledger_path: PathBuf::from(DEFAULT_LEDGER_PATH),
            image_extension: DEFAULT_IMAGE_EXTENSION.to_string(),
            create_missing_records: false,
            resume: false,
        }
    }
}

impl Config {
    /// Builds a config with every path placed under `root`, using the default
    /// relative layout.
    pub fn rooted_at(root: &Path) -> Self {
        Self {
            images_dir: root.join(DEFAULT_IMAGES_DIR),
            records_dir: root.join(DEFAULT_RECORDS_DIR),
            ledger_path: root.join(DEFAULT_LEDGER_PATH),
            ..Self::default()
        }
    }

    pub fn with_create_missing_records(mut self, enabled: bool) -> Self {
        self.create_missing_records = enabled;
        self
    }

    pub fn with_resume(mut self, enabled: bool) -> Self {
        self.resume = enabled;
        self
    }
}
