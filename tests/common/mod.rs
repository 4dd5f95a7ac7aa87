#![allow(dead_code)]

use std::fs;
use std::path::Path;

use platelabel::Config;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

/// Bytes of a PNG signature plus IHDR chunk: enough for header-only readers.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(33);
    bytes.extend_from_slice(&[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a]);
    bytes.extend_from_slice(&13u32.to_be_bytes());
    bytes.extend_from_slice(b"IHDR");
    bytes.extend_from_slice(&width.to_be_bytes());
    bytes.extend_from_slice(&height.to_be_bytes());
    bytes.extend_from_slice(&[8, 2, 0, 0, 0]);
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes
}

pub fn write_png(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, png_bytes(width, height)).expect("write png file");
}

/// A detector-style record with one plate box, plus optional operator state.
pub fn record_xml(filename: &str, plate_text: Option<&str>, flagged: Option<&str>) -> String {
    let mut xml = format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<annotation>
  <folder>images</folder>
  <filename>{filename}</filename>
  <size>
    <width>640</width>
    <height>480</height>
    <depth>3</depth>
  </size>
  <object>
    <name>license_plate</name>
    <pose>Unspecified</pose>
    <bndbox>
      <xmin>120</xmin>
      <ymin>300</ymin>
      <xmax>260</xmax>
      <ymax>340</ymax>
    </bndbox>
"#
    );
    if let Some(text) = plate_text {
        xml.push_str(&format!("    <plate_text>{text}</plate_text>\n"));
    }
    xml.push_str("  </object>\n");
    if let Some(value) = flagged {
        xml.push_str(&format!("  <flagged>{value}</flagged>\n"));
    }
    xml.push_str("</annotation>\n");
    xml
}

/// Status of one image when a workspace is laid out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Seed {
    Pending,
    Annotated,
    Flagged,
}

/// Lays out images and records under `root` in the default layout. Image
/// names are `img_000.png`, `img_001.png`, ... so list order matches `seeds`.
pub fn seed_workspace(root: &Path, seeds: &[Seed]) -> Config {
    let config = Config::rooted_at(root);
    fs::create_dir_all(&config.records_dir).expect("create records dir");

    for (i, seed) in seeds.iter().enumerate() {
        let image = format!("img_{i:03}.png");
        write_png(&config.images_dir.join(&image), 640, 480);

        let xml = match seed {
            Seed::Pending => record_xml(&image, None, None),
            Seed::Annotated => record_xml(&image, Some("SEEDED"), None),
            Seed::Flagged => record_xml(&image, None, Some("true")),
        };
        fs::write(config.records_dir.join(format!("img_{i:03}.xml")), xml)
            .expect("write record");
    }
    config
}

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(32);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 256;
    config
}
