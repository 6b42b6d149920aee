use annotaug_annotations::{AnnotationError, AnnotationStore, Record};
use annotaug_core::{BoundingBox, Keypoint};

#[test]
fn load_reports_missing_file_as_io() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = AnnotationStore::load(dir.path().join("absent.xml")).expect_err("missing");
    assert!(matches!(err, AnnotationError::Io(_)));
}

#[test]
fn broken_markup_is_an_xml_error() {
    let err = AnnotationStore::parse_str("<dataset><images><image file=").expect_err("broken");
    assert!(matches!(err, AnnotationError::Xml(_)), "{err:?}");
}

#[test]
fn fractional_values_are_rounded_on_save() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("out.xml");
    let mut store = AnnotationStore::new();
    store.append(Record::new(
        "r.jpg",
        BoundingBox::new(1.4, 2.6, 11.2, 20.5),
        [
            Keypoint::new(3.5, 4.49),
            Keypoint::new(5.0, 6.0),
            Keypoint::new(7.0, 8.0),
            Keypoint::new(9.0, 10.0),
        ],
    ));
    store.save(&path).expect("save");

    let back = AnnotationStore::load(&path).expect("load");
    assert_eq!(back.len(), 1);
    assert_eq!(back[0].bbox, BoundingBox::from_top_left_size(3.0, 1.0, 10.0, 18.0));
    assert_eq!(back[0].keypoints[0], Keypoint::new(4.0, 4.0));
}
