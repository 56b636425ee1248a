use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

pub type SampleId = String;
pub type StudyId = String;
pub type GeneId = String;
pub type Label = String;

/// Integer class code assigned to a phenotype label.
pub type Code = u32;

/// Label assigned to control samples in every directory-built dataset.
pub const HEALTHY_LABEL: &str = "healthy";

static STUDY_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"SRP|GSE|E-MEXP").unwrap());

/// Archive a study directory was exported from, judged by its accession.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessionKind {
    Sra,
    Geo,
    ArrayExpress,
}

impl AccessionKind {
    /// Detects the first accession marker contained anywhere in `name`.
    pub fn detect(name: &str) -> Option<Self> {
        let found = STUDY_MARKER.find(name)?;
        match found.as_str() {
            "SRP" => Some(AccessionKind::Sra),
            "GSE" => Some(AccessionKind::Geo),
            "E-MEXP" => Some(AccessionKind::ArrayExpress),
            _ => None,
        }
    }
}

impl fmt::Display for AccessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessionKind::Sra => write!(f, "sra"),
            AccessionKind::Geo => write!(f, "geo"),
            AccessionKind::ArrayExpress => write!(f, "arrayexpress"),
        }
    }
}
