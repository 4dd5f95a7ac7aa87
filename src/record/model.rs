//! Per-image annotation record.
//!
//! A record is the VOC-style document the detector emitted for one image:
//! zero or more `<object>` entries carrying a `<bndbox>`, plus whatever the
//! operator adds (`<plate_text>` on the first object, a top-level
//! `<flagged>`). Only those pieces are modeled. Every other element is kept
//! as a verbatim fragment at its source position so that rewriting a
//! record never loses detector metadata.

use super::bbox::BoundingBox;

/// Literal value of the `<flagged>` element that marks an image as unusable.
pub const FLAGGED_TRUE: &str = "true";

/// The parts of a modeled element that the model itself does not carry:
/// the start tag's attribute text and any extra child elements, both kept as
/// source text.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Unmodeled {
    pub(crate) attributes: String,
    pub(crate) children: Vec<String>,
}

/// Position of a child element inside a record or object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Slot {
    /// An unmodeled element, kept as its source text.
    Raw(String),
    /// Where the next entry of [`ImageRecord::objects`] is written.
    Object,
    /// Where [`ImageRecord::flagged`] is written.
    Flagged,
    /// Where [`RecordObject::bbox`] is written.
    BndBox,
    /// Where the next entry of [`RecordObject::plate_texts`] is written.
    PlateText,
}

/// One `<object>` entry of a record.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordObject {
    /// The `<name>` label, as read. Informational only.
    pub name: Option<String>,
    pub bbox: Option<BoundingBox>,
    /// Every `<plate_text>` child in document order. Empty strings are kept:
    /// presence, not content, is what marks an image as annotated.
    pub plate_texts: Vec<String>,
    pub(crate) attributes: String,
    pub(crate) bndbox_extra: Unmodeled,
    pub(crate) layout: Vec<Slot>,
}

impl RecordObject {
    pub fn new(name: impl Into<String>, bbox: BoundingBox) -> Self {
        let name = name.into();
        Self {
            layout: vec![
                Slot::Raw(format!("<name>{}</name>", super::xml::escape(&name))),
                Slot::BndBox,
            ],
            name: Some(name),
            bbox: Some(bbox),
            plate_texts: Vec::new(),
            attributes: String::new(),
            bndbox_extra: Unmodeled::default(),
        }
    }
}

/// The annotation record for one image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageRecord {
    /// Tag name of the document element, usually `annotation`.
    pub(crate) root: String,
    pub(crate) root_attributes: String,
    /// The `<filename>` text, as read.
    pub filename: Option<String>,
    pub objects: Vec<RecordObject>,
    /// Raw text of the top-level `<flagged>` element, `None` when absent.
    pub flagged: Option<String>,
    pub(crate) flagged_extra: Unmodeled,
    /// Set when a `<plate_text>` exists somewhere other than directly under an
    /// `<object>`; such elements are preserved raw but still count.
    pub(crate) stray_plate_text: bool,
    pub(crate) layout: Vec<Slot>,
}

impl Default for ImageRecord {
    fn default() -> Self {
        Self {
            root: "annotation".to_string(),
            root_attributes: String::new(),
            filename: None,
            objects: Vec::new(),
            flagged: None,
            flagged_extra: Unmodeled::default(),
            stray_plate_text: false,
            layout: Vec::new(),
        }
    }
}

impl ImageRecord {
    /// A fresh record for an image with no detections yet.
    pub fn new(folder: &str, filename: &str, size: Option<(u32, u32)>) -> Self {
        use super::xml::escape;

        let mut layout = vec![
            Slot::Raw(format!("<folder>{}</folder>", escape(folder))),
            Slot::Raw(format!("<filename>{}</filename>", escape(filename))),
        ];
        if let Some((width, height)) = size {
            layout.push(Slot::Raw(format!(
                "<size><width>{width}</width><height>{height}</height></size>"
            )));
        }

        Self {
            filename: Some(filename.to_string()),
            layout,
            ..Self::default()
        }
    }

    /// Appends an object entry after any existing ones.
    pub fn push_object(&mut self, object: RecordObject) {
        self.objects.push(object);
    }

    /// True iff at least one `<plate_text>` element is present, whatever its
    /// text (an empty plate text still counts).
    pub fn is_annotated(&self) -> bool {
        self.stray_plate_text
            || self
                .objects
                .iter()
                .any(|object| !object.plate_texts.is_empty())
    }

    /// True iff `<flagged>` is present with the exact text `true`.
    ///
    /// `True`, `1` or `yes` do not count.
    pub fn is_flagged(&self) -> bool {
        self.flagged.as_deref() == Some(FLAGGED_TRUE)
    }

    /// Annotated or flagged: excluded from the forward skip-scan.
    pub fn is_resolved(&self) -> bool {
        self.is_annotated() || self.is_flagged()
    }

    /// Appends a new `<plate_text>` to the first object entry.
    ///
    /// Repeated calls stack up several plate texts on that object. Returns
    /// false, leaving the record untouched, when there is no object entry.
    pub fn attach_plate_text(&mut self, text: &str) -> bool {
        match self.objects.first_mut() {
            Some(object) => {
                object.plate_texts.push(text.to_string());
                true
            }
            None => false,
        }
    }

    /// Sets `<flagged>` to `true`, creating it if absent.
    pub fn set_flagged(&mut self) {
        self.flagged = Some(FLAGGED_TRUE.to_string());
    }

    pub fn boxes(&self) -> impl Iterator<Item = &BoundingBox> {
        self.objects.iter().filter_map(|object| object.bbox.as_ref())
    }

    pub fn plate_texts(&self) -> impl Iterator<Item = &str> {
        self.objects
            .iter()
            .flat_map(|object| object.plate_texts.iter().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_object() -> ImageRecord {
        let mut record = ImageRecord::new("images", "a.png", Some((640, 480)));
        record.push_object(RecordObject::new(
            "plate",
            BoundingBox::from_xyxy(1, 2, 30, 40),
        ));
        record
    }

    #[test]
    fn fresh_record_is_unresolved() {
        let record = record_with_object();
        assert!(!record.is_annotated());
        assert!(!record.is_flagged());
        assert!(!record.is_resolved());
    }

    #[test]
    fn empty_plate_text_counts_as_annotated() {
        let mut record = record_with_object();
        assert!(record.attach_plate_text(""));
        assert!(record.is_annotated());
    }

    #[test]
    fn repeated_attach_stacks_plate_texts_on_first_object() {
        let mut record = record_with_object();
        record.push_object(RecordObject::new(
            "plate",
            BoundingBox::from_xyxy(50, 50, 90, 70),
        ));
        record.attach_plate_text("AB12");
        record.attach_plate_text("AB13");
        assert_eq!(record.objects[0].plate_texts, vec!["AB12", "AB13"]);
        assert!(record.objects[1].plate_texts.is_empty());
    }

    #[test]
    fn attach_without_objects_is_noop() {
        let mut record = ImageRecord::new("images", "a.png", None);
        assert!(!record.attach_plate_text("XYZ"));
        assert!(!record.is_annotated());
    }

    #[test]
    fn flagged_requires_exact_literal() {
        let mut record = record_with_object();
        for value in ["True", "TRUE", "1", "yes", " true", ""] {
            record.flagged = Some(value.to_string());
            assert!(!record.is_flagged(), "{value:?} must not count as flagged");
        }
        record.set_flagged();
        assert!(record.is_flagged());
        record.set_flagged();
        assert_eq!(record.flagged.as_deref(), Some("true"));
    }
}
