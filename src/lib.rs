//! Deterministic assembly of gene-expression training sets from refine.bio
//! study directories and compendia.

pub mod app;
pub mod catalog;
pub mod compendium;
pub mod config;
pub mod dataset;
pub mod domain;
pub mod error;
pub mod genes;
pub mod labels;
pub mod matrix;
pub mod metadata;
pub mod output;
pub mod study;
pub mod table;

pub use compendium::{CompendiumCache, CompendiumDataset};
pub use dataset::{Dataset, RefineBioDataset, Sample};
pub use error::DatasetError;
pub use matrix::ExpressionMatrix;
