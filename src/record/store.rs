//! Filesystem-backed record store: one XML document per image.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::Serialize;

use super::model::ImageRecord;
use super::xml::{parse_record_str, to_record_xml_string};
use crate::error::LabelError;
use crate::index::{record_id_for, ImageIndex, RECORD_EXTENSION};

/// Annotated and total record counts across the store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AnnotationCounts {
    pub annotated: usize,
    pub total: usize,
}

/// Reads and rewrites the per-image records under one directory.
#[derive(Clone, Debug)]
pub struct RecordStore {
    dir: PathBuf,
}

impl RecordStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path of the record with the given identifier.
    pub fn path_of(&self, record_id: &str) -> PathBuf {
        self.dir.join(record_id)
    }

    /// Full path of the record describing `image_id`.
    pub fn record_path_for(&self, image_id: &str) -> PathBuf {
        self.path_of(&record_id_for(image_id))
    }

    /// Loads a record.
    ///
    /// # Errors
    /// `NotFound` if the record file is absent, `Corrupt` if it is not
    /// well-formed UTF-8 XML or carries a non-integer box coordinate.
    pub fn load(&self, record_id: &str) -> Result<ImageRecord, LabelError> {
        let path = self.path_of(record_id);
        let xml = match fs::read_to_string(&path) {
            Ok(xml) => xml,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(LabelError::NotFound { path });
            }
            Err(err) if err.kind() == ErrorKind::InvalidData => {
                return Err(LabelError::Corrupt {
                    path,
                    message: format!("record is not valid UTF-8: {err}"),
                });
            }
            Err(err) => return Err(LabelError::Io(err)),
        };
        parse_record_str(&xml, &path)
    }

    pub fn load_for_image(&self, image_id: &str) -> Result<ImageRecord, LabelError> {
        self.load(&record_id_for(image_id))
    }

    /// Rewrites a record in full.
    ///
    /// The document is written to a sibling temp file and renamed over the
    /// record, so a failed write leaves the previous version in place.
    pub fn save(&self, record_id: &str, record: &ImageRecord) -> Result<(), LabelError> {
        let path = self.path_of(record_id);
        let tmp_path = path.with_extension(format!("{RECORD_EXTENSION}.tmp"));
        let store_write = |source| LabelError::StoreWrite {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(store_write)?;
        fs::write(&tmp_path, to_record_xml_string(record)).map_err(store_write)?;
        fs::rename(&tmp_path, &path).map_err(store_write)?;

        debug!("rewrote record {}", path.display());
        Ok(())
    }

    /// True iff the record loads and has at least one `<plate_text>`, empty or not.
    pub fn is_annotated(&self, record_id: &str) -> Result<bool, LabelError> {
        Ok(self.load(record_id)?.is_annotated())
    }

    /// True iff the record's `<flagged>` text is exactly `true`.
    pub fn is_flagged(&self, record_id: &str) -> Result<bool, LabelError> {
        Ok(self.load(record_id)?.is_flagged())
    }

    /// Annotated or flagged, from a single load.
    pub fn is_resolved(&self, record_id: &str) -> Result<bool, LabelError> {
        Ok(self.load(record_id)?.is_resolved())
    }

    /// Appends a `<plate_text>` to the first object and rewrites the record.
    ///
    /// Returns false without rewriting when the record has no object entry.
    pub fn attach_plate_text(&self, record_id: &str, text: &str) -> Result<bool, LabelError> {
        let mut record = self.load(record_id)?;
        if !record.attach_plate_text(text) {
            warn!(
                "record {} has no <object> entry; plate text not attached",
                self.path_of(record_id).display()
            );
            return Ok(false);
        }
        self.save(record_id, &record)?;
        Ok(true)
    }

    /// Sets `<flagged>true</flagged>` and rewrites the record.
    pub fn set_flagged(&self, record_id: &str) -> Result<(), LabelError> {
        let mut record = self.load(record_id)?;
        record.set_flagged();
        self.save(record_id, &record)
    }

    /// Record identifiers present in the store, sorted by file name.
    pub fn record_ids(&self) -> Result<Vec<String>, LabelError> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(LabelError::Io)? {
            let entry = entry.map_err(LabelError::Io)?;
            let path = entry.path();
            let is_record = path.extension().and_then(|ext| ext.to_str()) == Some(RECORD_EXTENSION);
            if !path.is_file() || !is_record {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                ids.push(name.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Classifies every record in the store with the same rule as
    /// [`RecordStore::is_annotated`].
    ///
    /// The total counts records, not images: an image without a record is not
    /// included and a record without an image is.
    pub fn count_annotated(&self) -> Result<AnnotationCounts, LabelError> {
        let mut counts = AnnotationCounts::default();
        for record_id in self.record_ids()? {
            counts.total += 1;
            if self.is_annotated(&record_id)? {
                counts.annotated += 1;
            }
        }
        Ok(counts)
    }

    /// Writes a fresh, object-less record for every image in `index` that
    /// lacks one. Returns how many records were created.
    pub fn create_missing(&self, index: &ImageIndex) -> Result<usize, LabelError> {
        let folder = index
            .dir()
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut created = 0;
        for image_id in index.list()? {
            let record_id = record_id_for(&image_id);
            if self.path_of(&record_id).exists() {
                continue;
            }

            let size = match imagesize::size(index.image_path(&image_id)) {
                Ok(dims) => Some((dims.width as u32, dims.height as u32)),
                Err(err) => {
                    warn!("could not read dimensions of {image_id}: {err}");
                    None
                }
            };

            let record = ImageRecord::new(&folder, &image_id, size);
            self.save(&record_id, &record)?;
            created += 1;
        }

        if created > 0 {
            info!("created {created} missing record(s) in {}", self.dir.display());
        }
        Ok(created)
    }
}
