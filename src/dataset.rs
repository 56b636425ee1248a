//! Assembled training sets and positional access to their samples.

use std::path::PathBuf;

use ndarray::ArrayView1;
use tracing::info;

use crate::domain::{Code, GeneId, HEALTHY_LABEL};
use crate::error::{DatasetError, Result};
use crate::labels::{LabelEncoding, SampleLabels};
use crate::matrix::ExpressionMatrix;
use crate::study::extract_study;

/// One sample as handed to a training loop.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample<'a> {
    pub features: ArrayView1<'a, f64>,
    pub label: Code,
    pub id: &'a str,
}

pub trait Dataset {
    fn len(&self) -> usize;

    fn get(&self, idx: usize) -> Result<Sample<'_>>;

    /// Number of genes per sample, i.e. the row count of the underlying
    /// matrix. Not the sample count.
    fn feature_count(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An expression matrix with one label per column.
#[derive(Debug, Clone)]
pub struct LabeledMatrix {
    matrix: ExpressionMatrix,
    labels: Vec<Code>,
}

impl LabeledMatrix {
    /// Panics if the label count differs from the column count.
    pub fn new(matrix: ExpressionMatrix, labels: Vec<Code>) -> Self {
        assert_eq!(
            labels.len(),
            matrix.n_samples(),
            "label count must match sample count"
        );
        Self { matrix, labels }
    }

    pub fn matrix(&self) -> &ExpressionMatrix {
        &self.matrix
    }

    pub fn labels(&self) -> &[Code] {
        &self.labels
    }

    pub fn iter(&self) -> impl Iterator<Item = Sample<'_>> {
        (0..self.labels.len()).filter_map(|idx| self.get(idx).ok())
    }
}

impl Dataset for LabeledMatrix {
    fn len(&self) -> usize {
        self.labels.len()
    }

    fn get(&self, idx: usize) -> Result<Sample<'_>> {
        let len = self.len();
        let (Some(features), Some(&label)) = (self.matrix.column(idx), self.labels.get(idx)) else {
            return Err(DatasetError::IndexOutOfRange { index: idx, len });
        };
        Ok(Sample {
            features,
            label,
            id: &self.matrix.sample_ids()[idx],
        })
    }

    fn feature_count(&self) -> usize {
        self.matrix.n_genes()
    }
}

/// Result of folding several study directories into one table.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub matrix: ExpressionMatrix,
    pub labels: Vec<Code>,
    pub encoding: LabelEncoding,
}

/// Extracts every study in `dirs` with one encoding built from
/// `classes ++ ["healthy"]` and concatenates the results in directory order.
/// When no study survives the result is an empty matrix over `genes_to_use`
/// rather than an error.
pub fn assemble<S: AsRef<str>>(
    dirs: &[PathBuf],
    classes: &[S],
    sample_labels: &SampleLabels,
    genes_to_use: &[GeneId],
) -> Result<Assembly> {
    let mut with_healthy = classes
        .iter()
        .map(|class| class.as_ref())
        .collect::<Vec<_>>();
    with_healthy.push(HEALTHY_LABEL);
    let encoding = LabelEncoding::generate(&with_healthy);

    let mut tables = Vec::new();
    let mut labels = Vec::new();
    for dir in dirs {
        let Some(extract) = extract_study(dir, sample_labels, &encoding, genes_to_use)? else {
            continue;
        };
        tables.push(extract.matrix);
        labels.extend(extract.labels);
    }
    let studies = tables.len();

    let matrix = ExpressionMatrix::concat_samples(&tables)?
        .unwrap_or_else(|| ExpressionMatrix::empty(genes_to_use.to_vec()));
    assert_eq!(
        labels.len(),
        matrix.n_samples(),
        "assembled label count must match sample count"
    );
    info!(
        studies,
        samples = matrix.n_samples(),
        genes = matrix.n_genes(),
        "assembled dataset"
    );
    Ok(Assembly {
        matrix,
        labels,
        encoding,
    })
}

/// A dataset of one or more refine.bio study directories.
#[derive(Debug, Clone)]
pub struct RefineBioDataset {
    data: LabeledMatrix,
    encoding: LabelEncoding,
}

impl RefineBioDataset {
    pub fn new<S: AsRef<str>>(
        dirs: &[PathBuf],
        classes: &[S],
        sample_labels: &SampleLabels,
        genes_to_use: &[GeneId],
    ) -> Result<Self> {
        let assembly = assemble(dirs, classes, sample_labels, genes_to_use)?;
        Ok(Self {
            data: LabeledMatrix::new(assembly.matrix, assembly.labels),
            encoding: assembly.encoding,
        })
    }

    pub fn encoding(&self) -> &LabelEncoding {
        &self.encoding
    }

    pub fn data(&self) -> &LabeledMatrix {
        &self.data
    }

    pub fn iter(&self) -> impl Iterator<Item = Sample<'_>> {
        self.data.iter()
    }
}

impl Dataset for RefineBioDataset {
    fn len(&self) -> usize {
        self.data.len()
    }

    fn get(&self, idx: usize) -> Result<Sample<'_>> {
        self.data.get(idx)
    }

    fn feature_count(&self) -> usize {
        self.data.feature_count()
    }
}
