use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use camino::{Utf8Path, Utf8PathBuf};
use csv::WriterBuilder;
use serde::Serialize;

use crate::catalog::{self, study_name};
use crate::compendium::{CompendiumCache, CompendiumDataset};
use crate::config::ResolvedConfig;
use crate::dataset::{Dataset, LabeledMatrix, RefineBioDataset};
use crate::domain::{AccessionKind, Code, HEALTHY_LABEL, Label};
use crate::error::DatasetError;
use crate::genes::intersect_genes;
use crate::labels::{self, LabelEncoder, LabelEncoding, SampleLabels};
use crate::metadata;
use crate::table;

#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub exclude_holdout: bool,
    pub output: Option<Utf8PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DirListing {
    pub root: String,
    pub holdout_label: Option<String>,
    pub dirs: Vec<DirEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DirEntry {
    pub study: String,
    pub kind: Option<AccessionKind>,
    pub path: String,
    pub has_holdout_label: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneSummary {
    pub studies: usize,
    pub genes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gene_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildSummary {
    pub source: String,
    pub studies: usize,
    pub samples: usize,
    pub genes: usize,
    pub encoding: LabelEncoding,
    pub label_counts: BTreeMap<Code, usize>,
    pub class_counts: BTreeMap<Label, usize>,
    pub built_at: String,
    pub matrix_path: Option<String>,
    pub labels_path: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

fn emit(sink: &dyn ProgressSink, message: impl Into<String>, started: Option<Instant>) {
    sink.event(ProgressEvent {
        message: message.into(),
        elapsed: started.map(|start| start.elapsed()),
    });
}

pub struct App {
    config: ResolvedConfig,
    cache: CompendiumCache,
}

impl App {
    pub fn new(config: ResolvedConfig) -> Self {
        Self {
            config,
            cache: CompendiumCache::new(),
        }
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    pub fn cache(&self) -> &CompendiumCache {
        &self.cache
    }

    pub fn list_dirs(&self, sink: &dyn ProgressSink) -> Result<DirListing, DatasetError> {
        let root = self.config.data_root()?;
        emit(sink, format!("phase=Scan; listing {root}"), None);
        let dirs = catalog::list_data_dirs(root.as_std_path())?;

        let with_label = match &self.config.holdout_label {
            Some(label) => {
                let sample_labels = self.sample_labels(sink)?;
                let (_, with_label) = catalog::split_by_label(&dirs, label, &sample_labels)?;
                Some(with_label)
            }
            None => None,
        };

        let dirs = dirs
            .iter()
            .map(|dir| {
                let study = study_name(dir);
                DirEntry {
                    kind: AccessionKind::detect(&study),
                    study,
                    path: dir.display().to_string(),
                    has_holdout_label: with_label.as_ref().map(|with| with.contains(dir)),
                }
            })
            .collect();

        Ok(DirListing {
            root: root.to_string(),
            holdout_label: self.config.holdout_label.clone(),
            dirs,
        })
    }

    pub fn genes(
        &self,
        include_ids: bool,
        sink: &dyn ProgressSink,
    ) -> Result<GeneSummary, DatasetError> {
        let sample_labels = self.sample_labels(sink)?;
        let dirs = self.training_dirs(false, &sample_labels, sink)?;
        let started = Instant::now();
        let gene_ids = intersect_genes(&dirs)?;
        emit(sink, "phase=Align; shared genes computed", Some(started));
        Ok(GeneSummary {
            studies: dirs.len(),
            genes: gene_ids.len(),
            gene_ids: include_ids.then_some(gene_ids),
        })
    }

    pub fn build_refinebio(
        &self,
        options: BuildOptions,
        sink: &dyn ProgressSink,
    ) -> Result<BuildSummary, DatasetError> {
        let sample_labels = self.sample_labels(sink)?;
        let dirs = self.training_dirs(options.exclude_holdout, &sample_labels, sink)?;

        let started = Instant::now();
        let genes = intersect_genes(&dirs)?;
        emit(
            sink,
            format!("phase=Align; {} shared genes", genes.len()),
            Some(started),
        );

        let started = Instant::now();
        let dataset = RefineBioDataset::new(&dirs, &self.config.classes, &sample_labels, &genes)?;
        emit(
            sink,
            format!("phase=Assemble; {} samples", dataset.len()),
            Some(started),
        );

        let class_names = dataset.encoding().decode(dataset.data().labels())?;
        self.summarize(
            "refinebio",
            dirs.len(),
            dataset.data(),
            dataset.encoding().clone(),
            class_names,
            options.output.as_deref(),
            sink,
        )
    }

    pub fn build_compendium(
        &self,
        options: BuildOptions,
        sink: &dyn ProgressSink,
    ) -> Result<BuildSummary, DatasetError> {
        let metadata_path = self.config.metadata()?;
        let compendium_path = self.config.compendium()?;
        let sample_labels = self.sample_labels(sink)?;

        let studies: Vec<String> = if self.config.studies.is_empty() {
            let document = metadata::parse(metadata_path.as_std_path())?;
            document.experiments.into_keys().collect()
        } else {
            self.config.studies.clone()
        };

        let mut classes = self.config.classes.clone();
        classes.push(HEALTHY_LABEL.to_string());
        let encoder = LabelEncoder::fit(&classes);

        let started = Instant::now();
        emit(sink, format!("phase=Load; {compendium_path}"), None);
        let dataset = CompendiumDataset::new(
            &studies,
            &classes,
            &sample_labels,
            metadata_path.as_std_path(),
            compendium_path.as_std_path(),
            &encoder,
            &self.cache,
        )?;
        emit(
            sink,
            format!("phase=Assemble; {} samples", dataset.len()),
            Some(started),
        );

        let class_names = encoder.inverse_transform(dataset.data().labels())?;
        self.summarize(
            "compendium",
            studies.len(),
            dataset.data(),
            encoder.encoding(),
            class_names,
            options.output.as_deref(),
            sink,
        )
    }

    fn sample_labels(&self, sink: &dyn ProgressSink) -> Result<SampleLabels, DatasetError> {
        emit(
            sink,
            format!("phase=Labels; reading {}", self.config.sample_labels),
            None,
        );
        labels::load_sample_labels(self.config.sample_labels.as_std_path())
    }

    fn training_dirs(
        &self,
        exclude_holdout: bool,
        sample_labels: &SampleLabels,
        sink: &dyn ProgressSink,
    ) -> Result<Vec<PathBuf>, DatasetError> {
        let root = self.config.data_root()?;
        emit(sink, format!("phase=Scan; listing {root}"), None);
        let dirs = catalog::list_data_dirs(root.as_std_path())?;
        match (&self.config.holdout_label, exclude_holdout) {
            (Some(label), true) => {
                let (without_label, with_label) =
                    catalog::split_by_label(&dirs, label, sample_labels)?;
                emit(
                    sink,
                    format!(
                        "phase=Scan; holding out {} studies with {label}",
                        with_label.len()
                    ),
                    None,
                );
                Ok(without_label)
            }
            (None, true) => Err(DatasetError::MissingSetting("holdout_label")),
            _ => Ok(dirs),
        }
    }

    fn summarize(
        &self,
        source: &str,
        studies: usize,
        data: &LabeledMatrix,
        encoding: LabelEncoding,
        class_names: Vec<Label>,
        output: Option<&Utf8Path>,
        sink: &dyn ProgressSink,
    ) -> Result<BuildSummary, DatasetError> {
        let mut label_counts = BTreeMap::new();
        for &code in data.labels() {
            *label_counts.entry(code).or_insert(0) += 1;
        }
        let mut class_counts = BTreeMap::new();
        for name in class_names {
            *class_counts.entry(name).or_insert(0) += 1;
        }

        let (matrix_path, labels_path) = match output {
            Some(path) => {
                emit(sink, format!("phase=Store; writing {path}"), None);
                let labels_path = export(data, path)?;
                (Some(path.to_string()), Some(labels_path.to_string()))
            }
            None => (None, None),
        };

        Ok(BuildSummary {
            source: source.to_string(),
            studies,
            samples: data.len(),
            genes: data.feature_count(),
            encoding,
            label_counts,
            class_counts,
            built_at: now_rfc3339(),
            matrix_path,
            labels_path,
        })
    }
}

/// Path of the label table written next to an exported matrix.
pub fn labels_path_for(matrix_path: &Utf8Path) -> Utf8PathBuf {
    let stem = matrix_path.file_stem().unwrap_or("dataset");
    matrix_path.with_file_name(format!("{stem}.labels.tsv"))
}

fn export(data: &LabeledMatrix, path: &Utf8Path) -> Result<Utf8PathBuf, DatasetError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_str().is_empty()) {
        std::fs::create_dir_all(parent.as_std_path())
            .map_err(|err| DatasetError::Filesystem(err.to_string()))?;
    }
    table::write_value_file(data.matrix(), path.as_std_path())?;

    let labels_path = labels_path_for(path);
    let mut writer = WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(labels_path.as_std_path())
        .map_err(|err| DatasetError::Filesystem(err.to_string()))?;
    writer
        .write_record(["sample", "label"])
        .map_err(|err| DatasetError::Filesystem(err.to_string()))?;
    for (sample, code) in data.matrix().sample_ids().iter().zip(data.labels()) {
        writer
            .write_record([sample.as_str(), code.to_string().as_str()])
            .map_err(|err| DatasetError::Filesystem(err.to_string()))?;
    }
    writer
        .flush()
        .map_err(|err| DatasetError::Filesystem(err.to_string()))?;
    Ok(labels_path)
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}
