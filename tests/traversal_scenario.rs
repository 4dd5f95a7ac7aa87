//! End-to-end walks through a small image set.

use std::fs;

use platelabel::record::RecordStore;
use platelabel::{Action, Config, LabelError, Session, View};

mod common;

fn three_image_workspace() -> (tempfile::TempDir, Config) {
    let temp = tempfile::tempdir().expect("create temp dir");
    let config = Config::rooted_at(temp.path());
    fs::create_dir_all(&config.records_dir).expect("create records dir");
    for name in ["a", "b", "c"] {
        common::write_png(&config.images_dir.join(format!("{name}.png")), 640, 480);
        fs::write(
            config.records_dir.join(format!("{name}.xml")),
            common::record_xml(&format!("{name}.png"), None, None),
        )
        .expect("write record");
    }
    (temp, config)
}

#[test]
fn submit_flag_back_resubmit_until_exhausted() {
    let (_temp, config) = three_image_workspace();
    let mut session = Session::open(&config).expect("open session");
    session.login("alice").expect("login");
    let records = RecordStore::new(&config.records_dir);

    assert_eq!(session.submit("ABC123").expect("submit a"), 1);
    assert_eq!(session.ledger().count("alice").expect("count"), 1);
    let a = records.load("a.xml").expect("load a");
    assert_eq!(a.plate_texts().collect::<Vec<_>>(), vec!["ABC123"]);

    assert_eq!(session.flag().expect("flag b"), 2);
    assert!(records.is_flagged("b.xml").expect("classify b"));
    assert!(!records.is_annotated("b.xml").expect("classify b"));
    assert_eq!(session.ledger().count("alice").expect("count"), 2);

    assert_eq!(session.back(), 1);
    let view = session.display().expect("display b");
    let frame = view.frame().expect("b is shown although flagged");
    assert_eq!(frame.image_name, "b.png");
    assert!(frame.record.is_flagged());

    assert_eq!(session.submit("").expect("resubmit b"), 2);
    assert!(records.is_annotated("b.xml").expect("classify b"));
    assert_eq!(
        records.load("b.xml").expect("load b").objects[0].plate_texts,
        vec![String::new()]
    );
    assert_eq!(session.ledger().count("alice").expect("count"), 3);

    assert_eq!(session.submit("XYZ").expect("submit c"), 3);
    assert_eq!(session.display().expect("display"), View::OutOfImages);

    let counts = records.count_annotated().expect("count annotated");
    assert_eq!((counts.annotated, counts.total), (3, 3));
}

#[test]
fn apply_maps_actions_to_transitions() {
    let (_temp, config) = three_image_workspace();
    let mut session = Session::open(&config).expect("open session");
    session.login("bob").expect("login");

    let view = session.apply(Action::Load).expect("load");
    assert_eq!(view.frame().expect("frame").image_name, "a.png");

    let view = session
        .apply(Action::Submit("KA01".to_string()))
        .expect("submit");
    let frame = view.frame().expect("frame");
    assert_eq!(frame.image_name, "b.png");
    assert_eq!(frame.progress.annotated, 1);
    assert_eq!(frame.progress.total, 3);
    assert_eq!(frame.progress.ledger[0].user_name, "bob");

    let view = session.apply(Action::Flag).expect("flag");
    assert_eq!(view.frame().expect("frame").index, 2);

    let view = session.apply(Action::Back).expect("back");
    assert_eq!(view.frame().expect("frame").index, 1);
    let view = session.apply(Action::Back).expect("back");
    assert_eq!(view.frame().expect("frame").index, 0);
    let view = session.apply(Action::Back).expect("back on empty history");
    assert_eq!(view.frame().expect("frame").index, 0);
}

#[test]
fn forward_scan_skips_records_resolved_elsewhere() {
    let (_temp, config) = three_image_workspace();
    let mut session = Session::open(&config).expect("open session");
    session.login("alice").expect("login");

    // Another tool resolves b between actions; the next commit must skip it.
    RecordStore::new(&config.records_dir)
        .set_flagged("b.xml")
        .expect("flag b externally");
    assert_eq!(session.submit("A").expect("submit"), 2);
}

#[test]
fn images_added_mid_session_are_picked_up() {
    let (_temp, config) = three_image_workspace();
    let mut session = Session::open(&config).expect("open session");
    session.login("alice").expect("login");
    session.submit("A").expect("submit a");
    session.submit("B").expect("submit b");
    session.submit("C").expect("submit c");
    assert!(session.display().expect("display").is_out_of_images());

    common::write_png(&config.images_dir.join("d.png"), 320, 240);
    fs::write(
        config.records_dir.join("d.xml"),
        common::record_xml("d.png", None, None),
    )
    .expect("write d record");

    let view = session.display().expect("display d");
    assert_eq!(view.frame().expect("frame").image_name, "d.png");
}

#[test]
fn corrupt_current_record_fails_display_only() {
    let (_temp, config) = three_image_workspace();
    fs::write(config.records_dir.join("a.xml"), "<annotation><object>").expect("corrupt a");

    let session = Session::open(&config).expect("open session");
    assert!(matches!(
        session.display(),
        Err(LabelError::Corrupt { .. })
    ));
    assert_eq!(session.current_index(), 0);
}

#[test]
fn empty_image_set_is_immediately_out_of_images() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let config = Config::rooted_at(temp.path());
    let mut session = Session::open(&config).expect("open session");
    session.login("alice").expect("login");

    assert!(session.display().expect("display").is_out_of_images());
    assert!(matches!(
        session.submit("X"),
        Err(LabelError::ImageIndexOutOfRange { index: 0, len: 0 })
    ));
}
