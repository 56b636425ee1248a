//! Discovery of per-study data directories.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::domain::AccessionKind;
use crate::error::{DatasetError, Result};
use crate::labels::SampleLabels;
use crate::table;

/// Study accession a data directory is named after.
pub fn study_name(dir: &Path) -> String {
    dir.components()
        .next_back()
        .map(|part| part.as_os_str().to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// `<dir>/<study>.tsv`, the value file every study directory carries.
pub fn study_file(dir: &Path) -> PathBuf {
    dir.join(format!("{}.tsv", study_name(dir)))
}

/// Immediate subdirectories of `root` named after an SRA, GEO or
/// ArrayExpress accession, in listing order.
pub fn list_data_dirs(root: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(root).map_err(|err| DatasetError::io(root, err))?;
    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| DatasetError::io(root, err))?;
        let path = entry.path();
        let name = entry.file_name();
        let Some(kind) = AccessionKind::detect(&name.to_string_lossy()) else {
            continue;
        };
        if path.is_dir() {
            debug!(dir = %path.display(), %kind, "found study directory");
            dirs.push(path);
        }
    }
    Ok(dirs)
}

/// Splits `dirs` into those without and those with at least one sample
/// labelled `target_label`. Only header lines are read.
pub fn split_by_label(
    dirs: &[PathBuf],
    target_label: &str,
    sample_labels: &SampleLabels,
) -> Result<(Vec<PathBuf>, Vec<PathBuf>)> {
    let mut without_label = Vec::new();
    let mut with_label = Vec::new();
    for dir in dirs {
        let samples = table::read_sample_header(&study_file(dir))?;
        let has_label = samples.iter().any(|sample| {
            sample_labels
                .get(sample)
                .is_some_and(|label| label == target_label)
        });
        if has_label {
            with_label.push(dir.clone());
        } else {
            without_label.push(dir.clone());
        }
    }
    debug!(
        label = target_label,
        with = with_label.len(),
        without = without_label.len(),
        "split study directories"
    );
    Ok((without_label, with_label))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn study_file_uses_base_name() {
        let file = study_file(Path::new("/data/refinebio/GSE10474/"));
        assert_eq!(file, Path::new("/data/refinebio/GSE10474/GSE10474.tsv"));
    }

    #[test]
    fn listing_skips_files_and_unrelated_dirs() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("GSE1")).unwrap();
        fs::create_dir(root.path().join("SRP2")).unwrap();
        fs::create_dir(root.path().join("E-MEXP-3")).unwrap();
        fs::create_dir(root.path().join("notes")).unwrap();
        fs::write(root.path().join("GSE4.tsv"), "Gene\n").unwrap();

        let mut names = list_data_dirs(root.path())
            .unwrap()
            .iter()
            .map(|dir| study_name(dir))
            .collect::<Vec<_>>();
        names.sort();
        assert_eq!(names, ["E-MEXP-3", "GSE1", "SRP2"]);
    }
}
