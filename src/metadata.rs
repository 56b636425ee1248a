use std::collections::HashMap;
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::debug;

use crate::domain::{SampleId, StudyId};
use crate::error::{DatasetError, Result};

/// Compendium metadata as exported by refine.bio. Experiments keep the order
/// they appear in the file.
#[derive(Debug, Clone, Deserialize)]
pub struct MetadataDocument {
    pub experiments: IndexMap<StudyId, ExperimentRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExperimentRecord {
    #[serde(default)]
    pub sample_accession_codes: Option<Vec<SampleId>>,
}

pub fn parse(path: &Path) -> Result<MetadataDocument> {
    let content = fs::read_to_string(path).map_err(|err| DatasetError::io(path, err))?;
    let document: MetadataDocument =
        serde_json::from_str(&content).map_err(|err| DatasetError::MetadataParse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
    debug!(
        path = %path.display(),
        experiments = document.experiments.len(),
        "parsed metadata"
    );
    Ok(document)
}

impl MetadataDocument {
    /// Experiments that list their samples, in document order.
    fn listed(&self) -> impl Iterator<Item = (&StudyId, &Vec<SampleId>)> {
        self.experiments.iter().filter_map(|(study, record)| {
            record
                .sample_accession_codes
                .as_ref()
                .map(|samples| (study, samples))
        })
    }

    /// Owning study of every listed sample. A sample listed under several
    /// experiments belongs to the last one in the document.
    pub fn sample_to_study(&self) -> HashMap<SampleId, StudyId> {
        let mut mapping = HashMap::new();
        for (study, samples) in self.listed() {
            for sample in samples {
                mapping.insert(sample.clone(), study.clone());
            }
        }
        mapping
    }

    pub fn study_to_samples(&self) -> IndexMap<StudyId, Vec<SampleId>> {
        self.listed()
            .map(|(study, samples)| (study.clone(), samples.clone()))
            .collect()
    }
}
