//! VOC-style XML codec for annotation records.
//!
//! Parsing is lax in the same places the labeling workflow has always been
//! lax: the document element may have any name, plate text content is never
//! inspected, and unknown elements are carried through untouched. The start
//! tags of modeled elements keep their attributes, and extra children of
//! `<bndbox>` and `<flagged>` are kept alongside the modeled values. The only
//! hard requirements are well-formed XML and integer `<bndbox>` coordinates.

use std::fmt;
use std::path::{Path, PathBuf};

use log::warn;
use roxmltree::Node;

use super::bbox::BoundingBox;
use super::model::{ImageRecord, RecordObject, Slot, Unmodeled};
use crate::error::LabelError;

const PLATE_TEXT_TAG: &str = "plate_text";
const FLAGGED_TAG: &str = "flagged";
const BNDBOX_TAG: &str = "bndbox";
const BNDBOX_FIELDS: [&str; 4] = ["xmin", "ymin", "xmax", "ymax"];

/// Parse a record from a UTF-8 string.
///
/// `path` is only used to label errors.
pub fn parse_record_str(xml: &str, path: &Path) -> Result<ImageRecord, LabelError> {
    let document = roxmltree::Document::parse(xml).map_err(|source| LabelError::Corrupt {
        path: path.to_path_buf(),
        message: source.to_string(),
    })?;

    let root = document.root_element();
    let (root_name, root_attributes) = start_tag(root, xml);
    let mut record = ImageRecord {
        root: root_name.to_string(),
        root_attributes: root_attributes.to_string(),
        ..ImageRecord::default()
    };

    for child in root.children().filter(Node::is_element) {
        match child.tag_name().name() {
            "object" => {
                let (object, stray) = parse_object(child, xml, path)?;
                record.stray_plate_text |= stray;
                record.objects.push(object);
                record.layout.push(Slot::Object);
            }
            FLAGGED_TAG if record.flagged.is_none() => {
                record.flagged = Some(child.text().unwrap_or_default().to_string());
                record.flagged_extra = unmodeled_parts(child, xml, &[]);
                record.stray_plate_text |= contains_plate_text(child);
                record.layout.push(Slot::Flagged);
            }
            name => {
                if name == "filename" && record.filename.is_none() {
                    record.filename = child.text().map(|text| text.trim().to_string());
                }
                record.stray_plate_text |= contains_plate_text(child);
                record.layout.push(Slot::Raw(xml[child.range()].to_string()));
            }
        }
    }

    Ok(record)
}

/// Parse a record from a UTF-8 string with no file behind it.
///
/// This helper is primarily useful for testing/fuzzing parse behavior in-memory.
pub fn from_record_xml_str(xml: &str) -> Result<ImageRecord, LabelError> {
    parse_record_str(xml, Path::new("<memory>"))
}

/// Parse a record from bytes.
///
/// The input must be valid UTF-8.
pub fn from_record_xml_slice(bytes: &[u8]) -> Result<ImageRecord, LabelError> {
    let xml = std::str::from_utf8(bytes).map_err(|source| LabelError::Corrupt {
        path: PathBuf::from("<memory>"),
        message: format!("input is not valid UTF-8: {source}"),
    })?;
    from_record_xml_str(xml)
}

/// Serialize a record to its XML document text.
pub fn to_record_xml_string(record: &ImageRecord) -> String {
    RecordXml(record).to_string()
}

/// Returns (object, has a plate text nested somewhere other than directly
/// under the object).
fn parse_object(
    node: Node<'_, '_>,
    xml: &str,
    path: &Path,
) -> Result<(RecordObject, bool), LabelError> {
    let mut object = RecordObject {
        attributes: start_tag(node, xml).1.to_string(),
        ..RecordObject::default()
    };
    let mut stray = false;

    for child in node.children().filter(Node::is_element) {
        match child.tag_name().name() {
            BNDBOX_TAG if object.bbox.is_none() => {
                object.bbox = Some(parse_bndbox(child, path)?);
                object.bndbox_extra = unmodeled_parts(child, xml, &BNDBOX_FIELDS);
                stray |= contains_plate_text(child);
                object.layout.push(Slot::BndBox);
            }
            PLATE_TEXT_TAG => {
                object
                    .plate_texts
                    .push(child.text().unwrap_or_default().to_string());
                object.layout.push(Slot::PlateText);
            }
            name => {
                if name == "name" && object.name.is_none() {
                    object.name = child.text().map(|text| text.trim().to_string());
                }
                stray |= contains_plate_text(child);
                object.layout.push(Slot::Raw(xml[child.range()].to_string()));
            }
        }
    }

    Ok((object, stray))
}

fn parse_bndbox(node: Node<'_, '_>, path: &Path) -> Result<BoundingBox, LabelError> {
    let [xmin, ymin, xmax, ymax] = BNDBOX_FIELDS;
    let bbox = BoundingBox::from_xyxy(
        parse_required_i64(node, xmin, path)?,
        parse_required_i64(node, ymin, path)?,
        parse_required_i64(node, xmax, path)?,
        parse_required_i64(node, ymax, path)?,
    );
    if !bbox.is_ordered() {
        warn!(
            "{}: <bndbox> {bbox} does not satisfy xmin < xmax and ymin < ymax",
            path.display()
        );
    }
    Ok(bbox)
}

fn parse_required_i64(node: Node<'_, '_>, tag: &str, path: &Path) -> Result<i64, LabelError> {
    let raw = node
        .children()
        .find(|child| child.is_element() && child.tag_name().name() == tag)
        .and_then(|child| child.text())
        .map(str::trim)
        .ok_or_else(|| LabelError::Corrupt {
            path: path.to_path_buf(),
            message: format!("missing <{tag}> in <bndbox>"),
        })?;

    raw.parse::<i64>().map_err(|_| LabelError::Corrupt {
        path: path.to_path_buf(),
        message: format!("invalid <{tag}> value '{raw}' in <bndbox>; expected integer"),
    })
}

/// Splits a start tag into its qualified name and raw attribute text,
/// e.g. `object` and `id="7"` for `<object id="7">`.
fn start_tag<'a>(node: Node<'_, '_>, xml: &'a str) -> (&'a str, &'a str) {
    let raw = &xml[node.range()];
    let name_end = raw[1..]
        .find(|c: char| c.is_whitespace() || c == '/' || c == '>')
        .map_or(raw.len(), |pos| pos + 1);

    let mut quote = None;
    let mut tag_end = raw.len();
    for (pos, c) in raw[name_end..].char_indices() {
        match (quote, c) {
            (None, '"' | '\'') => quote = Some(c),
            (Some(open), c) if c == open => quote = None,
            (None, '>') => {
                tag_end = name_end + pos;
                break;
            }
            _ => {}
        }
    }

    let attributes = raw[name_end..tag_end].trim().trim_end_matches('/').trim_end();
    (&raw[1..name_end], attributes)
}

/// Attributes of `node` plus its element children, skipping the first
/// occurrence of each name in `modeled`.
fn unmodeled_parts(node: Node<'_, '_>, xml: &str, modeled: &[&str]) -> Unmodeled {
    let mut seen = Vec::new();
    let children = node
        .children()
        .filter(Node::is_element)
        .filter(|child| {
            let name = child.tag_name().name();
            if modeled.contains(&name) && !seen.contains(&name) {
                seen.push(name);
                return false;
            }
            true
        })
        .map(|child| xml[child.range()].to_string())
        .collect();

    Unmodeled {
        attributes: start_tag(node, xml).1.to_string(),
        children,
    }
}

fn contains_plate_text(node: Node<'_, '_>) -> bool {
    node.descendants()
        .any(|child| child.is_element() && child.tag_name().name() == PLATE_TEXT_TAG)
}

pub(crate) fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Fuzz-only entrypoint: a record that parses must rewrite to a document
/// that parses back with the same classification and root attributes.
#[cfg(feature = "fuzzing")]
pub fn fuzz_rewrite_record(bytes: &[u8]) -> Result<(), LabelError> {
    let record = from_record_xml_slice(bytes)?;
    let reparsed = from_record_xml_str(&to_record_xml_string(&record))?;
    assert_eq!(record.is_annotated(), reparsed.is_annotated());
    assert_eq!(record.is_flagged(), reparsed.is_flagged());
    assert_eq!(record.root_attributes, reparsed.root_attributes);
    Ok(())
}

/// `<name attributes>`, without the space when there are no attributes.
struct StartTag<'a>(&'a str, &'a str);

impl fmt::Display for StartTag<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.1 {
            "" => write!(f, "<{}>", self.0),
            attributes => write!(f, "<{} {attributes}>", self.0),
        }
    }
}

struct RecordXml<'a>(&'a ImageRecord);

impl fmt::Display for RecordXml<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let record = self.0;
        let mut objects = record.objects.iter();
        let mut flagged_written = false;

        writeln!(f, "<?xml version=\"1.0\" encoding=\"utf-8\"?>")?;
        writeln!(f, "{}", StartTag(&record.root, &record.root_attributes))?;

        for slot in &record.layout {
            match slot {
                Slot::Raw(raw) => writeln!(f, "  {raw}")?,
                Slot::Object => {
                    if let Some(object) = objects.next() {
                        write_object(f, object)?;
                    }
                }
                Slot::Flagged => {
                    write_flagged(f, record)?;
                    flagged_written = true;
                }
                Slot::BndBox | Slot::PlateText => {}
            }
        }
        for object in objects {
            write_object(f, object)?;
        }
        if !flagged_written {
            write_flagged(f, record)?;
        }

        writeln!(f, "</{}>", record.root)
    }
}

fn write_object(f: &mut fmt::Formatter<'_>, object: &RecordObject) -> fmt::Result {
    let mut plate_texts = object.plate_texts.iter();
    let mut bbox_written = false;

    writeln!(f, "  {}", StartTag("object", &object.attributes))?;
    for slot in &object.layout {
        match slot {
            Slot::Raw(raw) => writeln!(f, "    {raw}")?,
            Slot::BndBox => {
                write_bndbox(f, object)?;
                bbox_written = true;
            }
            Slot::PlateText => {
                if let Some(text) = plate_texts.next() {
                    write_plate_text(f, text)?;
                }
            }
            Slot::Object | Slot::Flagged => {}
        }
    }
    if !bbox_written {
        write_bndbox(f, object)?;
    }
    for text in plate_texts {
        write_plate_text(f, text)?;
    }
    writeln!(f, "  </object>")
}

fn write_bndbox(f: &mut fmt::Formatter<'_>, object: &RecordObject) -> fmt::Result {
    let Some(bbox) = object.bbox.as_ref() else {
        return Ok(());
    };
    let extra = &object.bndbox_extra;
    writeln!(f, "    {}", StartTag(BNDBOX_TAG, &extra.attributes))?;
    writeln!(f, "      <xmin>{}</xmin>", bbox.xmin)?;
    writeln!(f, "      <ymin>{}</ymin>", bbox.ymin)?;
    writeln!(f, "      <xmax>{}</xmax>", bbox.xmax)?;
    writeln!(f, "      <ymax>{}</ymax>", bbox.ymax)?;
    for child in &extra.children {
        writeln!(f, "      {child}")?;
    }
    writeln!(f, "    </{BNDBOX_TAG}>")
}

fn write_plate_text(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    if text.is_empty() {
        writeln!(f, "    <{PLATE_TEXT_TAG} />")
    } else {
        writeln!(f, "    <{PLATE_TEXT_TAG}>{}</{PLATE_TEXT_TAG}>", escape(text))
    }
}

fn write_flagged(f: &mut fmt::Formatter<'_>, record: &ImageRecord) -> fmt::Result {
    let Some(value) = record.flagged.as_deref() else {
        return Ok(());
    };
    let extra = &record.flagged_extra;
    write!(f, "  {}{}", StartTag(FLAGGED_TAG, &extra.attributes), escape(value))?;
    for child in &extra.children {
        write!(f, "{child}")?;
    }
    writeln!(f, "</{FLAGGED_TAG}>")
}
