#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use whistl_datasets::labels::SampleLabels;

/// Writes `<root>/<study>/<study>.tsv` with a `Gene` column and one column
/// per sample.
pub fn write_study(root: &Path, study: &str, genes: &[&str], samples: &[(&str, &[f64])]) -> PathBuf {
    let dir = root.join(study);
    fs::create_dir_all(&dir).unwrap();
    let mut content = String::from("Gene");
    for (sample, _) in samples {
        content.push('\t');
        content.push_str(sample);
    }
    content.push('\n');
    for (row, gene) in genes.iter().enumerate() {
        content.push_str(gene);
        for (_, values) in samples {
            content.push('\t');
            content.push_str(&values[row].to_string());
        }
        content.push('\n');
    }
    fs::write(dir.join(format!("{study}.tsv")), content).unwrap();
    dir
}

pub fn sample_labels(pairs: &[(&str, &str)]) -> SampleLabels {
    pairs
        .iter()
        .map(|(sample, label)| (sample.to_string(), label.to_string()))
        .collect()
}
