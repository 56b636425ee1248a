use std::fs;

use assert_matches::assert_matches;

use whistl_datasets::catalog::{list_data_dirs, split_by_label, study_name};
use whistl_datasets::error::DatasetError;

mod common;

#[test]
fn split_places_each_dir_exactly_once() {
    let root = tempfile::tempdir().unwrap();
    let septic = common::write_study(
        root.path(),
        "GSE1",
        &["g1"],
        &[("s1", &[1.0]), ("s2", &[2.0])],
    );
    let healthy = common::write_study(root.path(), "SRP2", &["g1"], &[("s3", &[1.0])]);
    let unlabeled = common::write_study(root.path(), "E-MEXP-3", &["g1"], &[("s4", &[1.0])]);
    let sample_labels = common::sample_labels(&[
        ("s1", "healthy"),
        ("s2", "sepsis"),
        ("s3", "healthy"),
    ]);

    let dirs = vec![septic.clone(), healthy.clone(), unlabeled.clone()];
    let (without, with) = split_by_label(&dirs, "sepsis", &sample_labels).unwrap();
    assert_eq!(with, vec![septic]);
    assert_eq!(without, vec![healthy, unlabeled]);
}

#[test]
fn split_fails_on_missing_study_file() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("GSE9");
    fs::create_dir(&dir).unwrap();

    let err = split_by_label(&[dir], "sepsis", &common::sample_labels(&[])).unwrap_err();
    assert_matches!(err, DatasetError::Io { .. });
}

#[test]
fn listing_finds_study_dirs_only() {
    let root = tempfile::tempdir().unwrap();
    common::write_study(root.path(), "GSE1", &["g1"], &[("s1", &[1.0])]);
    common::write_study(root.path(), "SRP2", &["g1"], &[("s2", &[1.0])]);
    fs::create_dir(root.path().join("scratch")).unwrap();
    fs::write(root.path().join("SRP3"), "not a directory").unwrap();

    let mut names = list_data_dirs(root.path())
        .unwrap()
        .iter()
        .map(|dir| study_name(dir))
        .collect::<Vec<_>>();
    names.sort();
    assert_eq!(names, ["GSE1", "SRP2"]);
}

#[test]
fn listing_missing_root_is_io_error() {
    let root = tempfile::tempdir().unwrap();
    let err = list_data_dirs(&root.path().join("absent")).unwrap_err();
    assert_matches!(err, DatasetError::Io { .. });
}
