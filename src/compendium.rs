//! Datasets carved out of a single pre-merged compendium matrix.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info};

use crate::dataset::{Dataset, LabeledMatrix, Sample};
use crate::domain::{Code, SampleId, StudyId};
use crate::error::Result;
use crate::labels::{self, LabelCoder, SampleLabels};
use crate::matrix::ExpressionMatrix;
use crate::metadata;
use crate::table;

/// Loaded compendia keyed by the path they were requested with. Entries live
/// until [`CompendiumCache::clear`]; changes to the file on disk are not
/// noticed.
#[derive(Debug, Default)]
pub struct CompendiumCache {
    entries: Mutex<HashMap<PathBuf, Arc<ExpressionMatrix>>>,
    reads: AtomicUsize,
}

impl CompendiumCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the compendium at `path`, reading it on first request only.
    pub fn load(&self, path: &Path) -> Result<Arc<ExpressionMatrix>> {
        // Held across the read so concurrent first loads share one read.
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(matrix) = entries.get(path) {
            debug!(path = %path.display(), "compendium cache hit");
            return Ok(Arc::clone(matrix));
        }

        let matrix = Arc::new(table::read_value_file(path, None)?);
        self.reads.fetch_add(1, Ordering::Relaxed);
        info!(
            path = %path.display(),
            genes = matrix.n_genes(),
            samples = matrix.n_samples(),
            "loaded compendium"
        );
        entries.insert(path.to_path_buf(), Arc::clone(&matrix));
        Ok(matrix)
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of files read from disk so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }
}

/// Keeps the columns of samples belonging to one of `studies`. Samples the
/// metadata does not mention are dropped.
pub fn subset_by_study<S: AsRef<str>>(
    matrix: &ExpressionMatrix,
    studies: &[S],
    sample_to_study: &HashMap<SampleId, StudyId>,
) -> ExpressionMatrix {
    let wanted = studies.iter().map(AsRef::as_ref).collect::<HashSet<&str>>();
    matrix.retain_samples(|sample| {
        sample_to_study
            .get(sample)
            .is_some_and(|study| wanted.contains(study.as_str()))
    })
}

/// Keeps the columns of samples labelled with one of `classes`, in the
/// matrix's original column order.
pub fn subset_by_class<S: AsRef<str>>(
    matrix: &ExpressionMatrix,
    classes: &[S],
    sample_labels: &SampleLabels,
) -> ExpressionMatrix {
    let wanted = classes.iter().map(AsRef::as_ref).collect::<HashSet<&str>>();
    matrix.retain_samples(|sample| {
        sample_labels
            .get(sample)
            .is_some_and(|label| wanted.contains(label.as_str()))
    })
}

/// One code per column, in column order.
pub fn encode_labels<C: LabelCoder>(
    matrix: &ExpressionMatrix,
    sample_labels: &SampleLabels,
    encoder: &C,
) -> Result<Vec<Code>> {
    labels::get_labels(matrix, sample_labels, encoder)
}

/// A dataset of one or more studies pulled from a refine.bio compendium.
#[derive(Debug, Clone)]
pub struct CompendiumDataset {
    data: LabeledMatrix,
}

impl CompendiumDataset {
    pub fn new<S: AsRef<str>, T: AsRef<str>, C: LabelCoder>(
        studies: &[S],
        classes: &[T],
        sample_labels: &SampleLabels,
        metadata_path: &Path,
        compendium_path: &Path,
        encoder: &C,
        cache: &CompendiumCache,
    ) -> Result<Self> {
        let document = metadata::parse(metadata_path)?;
        let sample_to_study = document.sample_to_study();

        let all = cache.load(compendium_path)?;
        let by_study = subset_by_study(&all, studies, &sample_to_study);
        let data = subset_by_class(&by_study, classes, sample_labels);
        let codes = encode_labels(&data, sample_labels, encoder)?;
        info!(
            studies = studies.len(),
            samples = data.n_samples(),
            "built compendium dataset"
        );
        Ok(Self {
            data: LabeledMatrix::new(data, codes),
        })
    }

    pub fn data(&self) -> &LabeledMatrix {
        &self.data
    }

    pub fn iter(&self) -> impl Iterator<Item = Sample<'_>> {
        self.data.iter()
    }
}

impl Dataset for CompendiumDataset {
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
