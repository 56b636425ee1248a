use std::fs;
use std::path::Path;
use std::sync::Arc;

use assert_matches::assert_matches;

use whistl_datasets::compendium::{CompendiumCache, CompendiumDataset, encode_labels};
use whistl_datasets::dataset::Dataset;
use whistl_datasets::error::DatasetError;
use whistl_datasets::labels::LabelEncoder;

mod common;

const METADATA: &str = r#"{
    "experiments": {
        "GSE1": {"sample_accession_codes": ["GSM1", "GSM2", "GSM3"]},
        "GSE2": {"sample_accession_codes": ["GSM4"]},
        "SRP3": {"title": "withdrawn"}
    }
}"#;

fn write_fixture(root: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let compendium = root.join("compendium.tsv");
    fs::write(
        &compendium,
        "\tGSM3\tGSM9\tGSM1\tGSM4\tGSM2\n\
         ENSG01\t3\t9\t1\t4\t2\n\
         ENSG02\t30\t90\t10\t40\t20\n",
    )
    .unwrap();
    let metadata = root.join("metadata.json");
    fs::write(&metadata, METADATA).unwrap();
    (compendium, metadata)
}

#[test]
fn load_reads_each_path_once() {
    let root = tempfile::tempdir().unwrap();
    let (compendium, _) = write_fixture(root.path());
    let cache = CompendiumCache::new();

    let first = cache.load(&compendium).unwrap();
    fs::remove_file(&compendium).unwrap();
    let second = cache.load(&compendium).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(cache.reads(), 1);
    assert_eq!(cache.len(), 1);

    cache.clear();
    assert!(cache.is_empty());
    assert_matches!(cache.load(&compendium), Err(DatasetError::Io { .. }));
}

#[test]
fn dataset_subsets_by_study_then_class() {
    let root = tempfile::tempdir().unwrap();
    let (compendium, metadata) = write_fixture(root.path());
    let sample_labels = common::sample_labels(&[
        ("GSM1", "sepsis"),
        ("GSM2", "tb"),
        ("GSM3", "healthy"),
        ("GSM4", "sepsis"),
        ("GSM9", "sepsis"),
    ]);
    let encoder = LabelEncoder::fit(&["healthy", "sepsis", "tb"]);
    let cache = CompendiumCache::new();

    let dataset = CompendiumDataset::new(
        &["GSE1"],
        &["sepsis", "healthy"],
        &sample_labels,
        &metadata,
        &compendium,
        &encoder,
        &cache,
    )
    .unwrap();

    assert_eq!(dataset.len(), 2);
    assert_eq!(dataset.feature_count(), 2);
    let ids = dataset.iter().map(|sample| sample.id.to_string()).collect::<Vec<_>>();
    assert_eq!(ids, ["GSM3", "GSM1"]);
    assert_eq!(dataset.data().labels(), [0, 1]);
    assert_eq!(dataset.get(1).unwrap().features.to_vec(), vec![1.0, 10.0]);
    assert_matches!(dataset.get(2), Err(DatasetError::IndexOutOfRange { .. }));

    CompendiumDataset::new(
        &["GSE2"],
        &["sepsis"],
        &sample_labels,
        &metadata,
        &compendium,
        &encoder,
        &cache,
    )
    .unwrap();
    assert_eq!(cache.reads(), 1);
}

#[test]
fn encode_labels_uses_fitted_encoder() {
    let root = tempfile::tempdir().unwrap();
    let (compendium, _) = write_fixture(root.path());
    let cache = CompendiumCache::new();
    let matrix = cache.load(&compendium).unwrap();
    let sample_labels = common::sample_labels(&[
        ("GSM1", "sepsis"),
        ("GSM2", "tb"),
        ("GSM3", "healthy"),
        ("GSM4", "sepsis"),
        ("GSM9", "unseen"),
    ]);
    let encoder = LabelEncoder::fit(&["healthy", "sepsis", "tb"]);

    let err = encode_labels(&matrix, &sample_labels, &encoder).unwrap_err();
    assert_matches!(err, DatasetError::UnknownLabel(label) if label == "unseen");
}

#[test]
fn malformed_metadata_is_a_parse_error() {
    let root = tempfile::tempdir().unwrap();
    let (compendium, metadata) = write_fixture(root.path());
    fs::write(&metadata, r#"{"samples": {}}"#).unwrap();

    let err = CompendiumDataset::new(
        &["GSE1"],
        &["sepsis"],
        &common::sample_labels(&[]),
        &metadata,
        &compendium,
        &LabelEncoder::fit(&["sepsis"]),
        &CompendiumCache::new(),
    )
    .unwrap_err();
    assert_matches!(err, DatasetError::MetadataParse { .. });
}

#[test]
fn shared_sample_goes_to_study_listed_last() {
    let root = tempfile::tempdir().unwrap();
    let (compendium, metadata) = write_fixture(root.path());
    fs::write(
        &metadata,
        r#"{"experiments": {
            "GSE9": {"sample_accession_codes": ["GSM1", "GSM4"]},
            "GSE10": {"sample_accession_codes": ["GSM4"]}
        }}"#,
    )
    .unwrap();
    let sample_labels = common::sample_labels(&[("GSM1", "sepsis"), ("GSM4", "sepsis")]);
    let encoder = LabelEncoder::fit(&["healthy", "sepsis"]);
    let cache = CompendiumCache::new();

    let dataset = CompendiumDataset::new(
        &["GSE10"],
        &["sepsis"],
        &sample_labels,
        &metadata,
        &compendium,
        &encoder,
        &cache,
    )
    .unwrap();

    let ids = dataset.iter().map(|sample| sample.id.to_string()).collect::<Vec<_>>();
    assert_eq!(ids, ["GSM4"]);
}
