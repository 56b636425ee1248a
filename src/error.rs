use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum DatasetError {
    #[error("missing config file whistl.json in current directory")]
    MissingConfig,

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("config does not set `{0}`")]
    MissingSetting(&'static str),

    #[error("failed to read {}: {message}", path.display())]
    Io { path: PathBuf, message: String },

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("failed to parse metadata {}: {message}", path.display())]
    MetadataParse { path: PathBuf, message: String },

    #[error("malformed value file {}: {message}", path.display())]
    ValueFileParse { path: PathBuf, message: String },

    #[error("failed to parse sample labels {}: {message}", path.display())]
    LabelsParse { path: PathBuf, message: String },

    #[error("gene {gene} not present in {source_name}")]
    GeneNotFound { gene: String, source_name: String },

    #[error("sample {0} has no phenotype label")]
    MissingLabel(String),

    #[error("label {0} has no encoding")]
    UnknownLabel(String),

    #[error("code {0} does not correspond to a known label")]
    UnknownCode(u32),

    #[error("index {index} out of range for dataset of {len} samples")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("shape mismatch: {0}")]
    Shape(String),
}

impl DatasetError {
    pub(crate) fn io(path: impl Into<PathBuf>, err: impl ToString) -> Self {
        DatasetError::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DatasetError>;
