use std::fs;
use std::path::PathBuf;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::DatasetError;

pub const DEFAULT_CONFIG_FILE: &str = "whistl.json";

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub data_root: Option<Utf8PathBuf>,
    #[serde(default)]
    pub metadata: Option<Utf8PathBuf>,
    #[serde(default)]
    pub compendium: Option<Utf8PathBuf>,
    pub sample_labels: Utf8PathBuf,
    #[serde(default)]
    pub classes: Vec<ClassEntry>,
    #[serde(default)]
    pub studies: Vec<String>,
    #[serde(default)]
    pub holdout_label: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ClassEntry {
    Shorthand(String),
    Detailed(ClassEntryObject),
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ClassEntryObject {
    pub label: String,
    #[serde(default)]
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub data_root: Option<Utf8PathBuf>,
    pub metadata: Option<Utf8PathBuf>,
    pub compendium: Option<Utf8PathBuf>,
    pub sample_labels: Utf8PathBuf,
    pub classes: Vec<String>,
    pub studies: Vec<String>,
    pub holdout_label: Option<String>,
}

impl ResolvedConfig {
    pub fn data_root(&self) -> Result<&Utf8Path, DatasetError> {
        self.data_root
            .as_deref()
            .ok_or(DatasetError::MissingSetting("data_root"))
    }

    pub fn metadata(&self) -> Result<&Utf8Path, DatasetError> {
        self.metadata
            .as_deref()
            .ok_or(DatasetError::MissingSetting("metadata"))
    }

    pub fn compendium(&self) -> Result<&Utf8Path, DatasetError> {
        self.compendium
            .as_deref()
            .ok_or(DatasetError::MissingSetting("compendium"))
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, DatasetError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Err(DatasetError::MissingConfig);
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| DatasetError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| DatasetError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, DatasetError> {
        let schema_version = config.schema_version.unwrap_or(1);
        if schema_version != 1 {
            return Err(DatasetError::ConfigParse(format!(
                "unsupported schema_version {schema_version}"
            )));
        }

        let classes = config
            .classes
            .into_iter()
            .filter_map(|entry| match entry {
                ClassEntry::Shorthand(label) => Some(label),
                ClassEntry::Detailed(obj) => obj.enabled.unwrap_or(true).then_some(obj.label),
            })
            .map(|label| label.trim().to_string())
            .collect::<Vec<_>>();
        if classes.iter().any(|label| label.is_empty()) {
            return Err(DatasetError::ConfigParse("empty class label".to_string()));
        }

        Ok(ResolvedConfig {
            schema_version,
            data_root: config.data_root,
            metadata: config.metadata,
            compendium: config.compendium,
            sample_labels: config.sample_labels,
            classes,
            studies: config.studies,
            holdout_label: config.holdout_label,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_config_shorthand() {
        let config: Config = serde_json::from_str(
            r#"{
                "data_root": "data/refinebio",
                "sample_labels": "labels.json",
                "classes": ["sepsis", {"label": "tb", "enabled": false}, {"label": "sle"}]
            }"#,
        )
        .unwrap();

        let resolved = ConfigLoader::resolve_config(config).unwrap();
        assert_eq!(resolved.schema_version, 1);
        assert_eq!(resolved.classes, ["sepsis", "sle"]);
        assert_eq!(resolved.data_root().unwrap().as_str(), "data/refinebio");
        assert!(matches!(
            resolved.compendium(),
            Err(DatasetError::MissingSetting("compendium"))
        ));
    }
}
