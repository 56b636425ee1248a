//! Phenotype labels: per-sample lookups, integer encodings and label-based
//! sample filtering.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{Code, Label, SampleId};
use crate::error::{DatasetError, Result};
use crate::matrix::ExpressionMatrix;

/// Phenotype label of each known sample. Samples may be absent.
pub type SampleLabels = HashMap<SampleId, Label>;

/// Maps phenotype labels to integer codes.
pub trait LabelCoder {
    fn encode(&self, label: &str) -> Result<Code>;

    fn transform<S: AsRef<str>>(&self, labels: &[S]) -> Result<Vec<Code>>
    where
        Self: Sized,
    {
        labels
            .iter()
            .map(|label| self.encode(label.as_ref()))
            .collect()
    }
}

/// Label codes fixed for one dataset-construction call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LabelEncoding {
    codes: BTreeMap<Label, Code>,
}

impl LabelEncoding {
    /// Enumerates `classes` in input order; a repeated label keeps the code
    /// of its first occurrence.
    pub fn generate<S: AsRef<str>>(classes: &[S]) -> Self {
        let mut codes = BTreeMap::new();
        for class in classes {
            let next = codes.len() as Code;
            codes.entry(class.as_ref().to_string()).or_insert(next);
        }
        Self { codes }
    }

    pub fn from_codes<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, Code)>,
        S: Into<Label>,
    {
        Self {
            codes: pairs
                .into_iter()
                .map(|(label, code)| (label.into(), code))
                .collect(),
        }
    }

    pub fn code(&self, label: &str) -> Option<Code> {
        self.codes.get(label).copied()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.codes.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Code)> {
        self.codes.iter().map(|(label, code)| (label.as_str(), *code))
    }

    /// Label of each code, in the order given.
    pub fn decode(&self, codes: &[Code]) -> Result<Vec<Label>> {
        let by_code = self
            .iter()
            .map(|(label, code)| (code, label))
            .collect::<HashMap<_, _>>();
        codes
            .iter()
            .map(|code| {
                by_code
                    .get(code)
                    .map(|label| label.to_string())
                    .ok_or(DatasetError::UnknownCode(*code))
            })
            .collect()
    }
}

impl LabelCoder for LabelEncoding {
    fn encode(&self, label: &str) -> Result<Code> {
        self.code(label)
            .ok_or_else(|| DatasetError::UnknownLabel(label.to_string()))
    }
}

/// Fitted encoder: classes are the sorted distinct labels, a label's code is
/// its rank among them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<Label>,
}

impl LabelEncoder {
    pub fn fit<S: AsRef<str>>(labels: &[S]) -> Self {
        let classes = labels
            .iter()
            .map(|label| label.as_ref().to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        Self { classes }
    }

    pub fn classes(&self) -> &[Label] {
        &self.classes
    }

    pub fn inverse_transform(&self, codes: &[Code]) -> Result<Vec<Label>> {
        codes
            .iter()
            .map(|&code| {
                self.classes
                    .get(code as usize)
                    .cloned()
                    .ok_or(DatasetError::UnknownCode(code))
            })
            .collect()
    }

    /// The same mapping as an explicit [`LabelEncoding`].
    pub fn encoding(&self) -> LabelEncoding {
        LabelEncoding::from_codes(
            self.classes
                .iter()
                .enumerate()
                .map(|(code, label)| (label.clone(), code as Code)),
        )
    }
}

impl LabelCoder for LabelEncoder {
    fn encode(&self, label: &str) -> Result<Code> {
        self.classes
            .binary_search_by(|class| class.as_str().cmp(label))
            .map(|idx| idx as Code)
            .map_err(|_| DatasetError::UnknownLabel(label.to_string()))
    }
}

/// Code of each column's label, in column order.
pub fn get_labels<C: LabelCoder>(
    matrix: &ExpressionMatrix,
    sample_labels: &SampleLabels,
    coder: &C,
) -> Result<Vec<Code>> {
    matrix
        .sample_ids()
        .iter()
        .map(|sample| {
            let label = sample_labels
                .get(sample)
                .ok_or_else(|| DatasetError::MissingLabel(sample.clone()))?;
            coder.encode(label)
        })
        .collect()
}

/// Keeps the columns whose label is one of `labels_to_keep`. Unlabeled
/// samples are dropped. Returns `None` when no column survives.
pub fn keep_samples_with_labels<S: AsRef<str>>(
    matrix: &ExpressionMatrix,
    sample_labels: &SampleLabels,
    labels_to_keep: &[S],
) -> Option<ExpressionMatrix> {
    let kept = matrix.retain_samples(|sample| {
        sample_labels.get(sample).is_some_and(|label| {
            labels_to_keep
                .iter()
                .any(|keep| keep.as_ref() == label.as_str())
        })
    });
    (kept.n_samples() > 0).then_some(kept)
}

/// Drops the columns labelled `label_to_remove`. Unlabeled samples stay.
pub fn remove_samples_with_label(
    matrix: &ExpressionMatrix,
    sample_labels: &SampleLabels,
    label_to_remove: &str,
) -> ExpressionMatrix {
    matrix.retain_samples(|sample| {
        sample_labels
            .get(sample)
            .is_none_or(|label| label != label_to_remove)
    })
}

/// Loads a JSON object mapping sample accessions to phenotype labels.
pub fn load_sample_labels(path: &Path) -> Result<SampleLabels> {
    let content = fs::read_to_string(path).map_err(|err| DatasetError::io(path, err))?;
    serde_json::from_str(&content).map_err(|err| DatasetError::LabelsParse {
        path: path.to_path_buf(),
        message: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> SampleLabels {
        pairs
            .iter()
            .map(|(sample, label)| (sample.to_string(), label.to_string()))
            .collect()
    }

    #[test]
    fn generate_keeps_first_code_of_duplicates() {
        let encoding = LabelEncoding::generate(&["sepsis", "healthy", "sepsis"]);
        assert_eq!(encoding.iter().count(), 2);
        assert_eq!(encoding.code("sepsis"), Some(0));
        assert_eq!(encoding.code("healthy"), Some(1));
        assert_eq!(
            encoding.decode(&[1, 0]).unwrap(),
            vec!["healthy".to_string(), "sepsis".to_string()]
        );
        assert!(matches!(
            encoding.decode(&[2]),
            Err(DatasetError::UnknownCode(2))
        ));
    }

    #[test]
    fn encoder_sorts_classes() {
        let encoder = LabelEncoder::fit(&["tb", "healthy", "sepsis", "tb"]);
        assert_eq!(encoder.classes(), ["healthy", "sepsis", "tb"]);
        assert_eq!(encoder.transform(&["tb", "healthy"]).unwrap(), vec![2, 0]);
        assert_eq!(
            encoder.inverse_transform(&[1]).unwrap(),
            vec!["sepsis".to_string()]
        );
    }

    #[test]
    fn encoder_rejects_unseen_values() {
        let encoder = LabelEncoder::fit(&["healthy"]);
        assert!(matches!(
            encoder.encode("sepsis"),
            Err(DatasetError::UnknownLabel(_))
        ));
        assert!(matches!(
            encoder.inverse_transform(&[3]),
            Err(DatasetError::UnknownCode(3))
        ));
    }

    #[test]
    fn encoder_and_encoding_agree() {
        let encoder = LabelEncoder::fit(&["b", "a"]);
        let encoding = encoder.encoding();
        assert_eq!(encoding.code("a"), Some(0));
        assert_eq!(encoding.code("b"), Some(1));
    }

    #[test]
    fn get_labels_requires_a_label() {
        let matrix = ExpressionMatrix::from_columns(vec!["g"], vec![("s1", vec![0.0])]).unwrap();
        let encoding = LabelEncoding::generate(&["healthy"]);
        let err = get_labels(&matrix, &labels(&[]), &encoding).unwrap_err();
        assert!(matches!(err, DatasetError::MissingLabel(sample) if sample == "s1"));
    }

    #[test]
    fn keep_returns_none_when_nothing_matches() {
        let matrix = ExpressionMatrix::from_columns(vec!["g"], vec![("s1", vec![0.0])]).unwrap();
        let sample_labels = labels(&[("s1", "tb")]);
        assert!(keep_samples_with_labels(&matrix, &sample_labels, &["sepsis"]).is_none());
        assert!(keep_samples_with_labels(&matrix, &sample_labels, &["tb"]).is_some());
    }

    #[test]
    fn remove_keeps_unlabeled_samples() {
        let matrix = ExpressionMatrix::from_columns(
            vec!["g"],
            vec![("s1", vec![0.0]), ("s2", vec![1.0])],
        )
        .unwrap();
        let kept = remove_samples_with_label(&matrix, &labels(&[("s1", "bad")]), "bad");
        assert_eq!(kept.sample_ids(), ["s2"]);
    }
}
