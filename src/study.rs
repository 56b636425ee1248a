use std::path::Path;

use tracing::debug;

use crate::catalog::{study_file, study_name};
use crate::domain::{Code, GeneId};
use crate::error::Result;
use crate::labels::{self, LabelEncoding, SampleLabels};
use crate::matrix::ExpressionMatrix;
use crate::table::{self, GENE_COLUMN};

/// One study's contribution to a dataset. Column `i` of `matrix` carries
/// `labels[i]`.
#[derive(Debug, Clone)]
pub struct StudyExtract {
    pub matrix: ExpressionMatrix,
    pub labels: Vec<Code>,
}

/// Loads the study in `dir`, keeps samples whose label is encoded, and aligns
/// rows to `genes_to_keep`. `Ok(None)` means the study has no usable samples.
pub fn extract_study(
    dir: &Path,
    sample_labels: &SampleLabels,
    encoding: &LabelEncoding,
    genes_to_keep: &[GeneId],
) -> Result<Option<StudyExtract>> {
    let study = study_name(dir);
    let full = table::read_value_file(&study_file(dir), Some(GENE_COLUMN))?;

    let Some(labelled) = labels::keep_samples_with_labels(&full, sample_labels, &encoding.labels())
    else {
        debug!(%study, "no samples with an encoded label");
        return Ok(None);
    };
    let codes = labels::get_labels(&labelled, sample_labels, encoding)?;
    let matrix = labelled.select_genes(genes_to_keep, &study)?;

    debug!(
        %study,
        kept = matrix.n_samples(),
        dropped = full.n_samples() - matrix.n_samples(),
        "extracted study"
    );
    Ok(Some(StudyExtract {
        matrix,
        labels: codes,
    }))
}
