use std::path::PathBuf;

use tracing::info;

use crate::catalog::study_file;
use crate::domain::GeneId;
use crate::error::Result;
use crate::matrix::shared_genes;
use crate::table::{self, GENE_COLUMN};

/// Genes measured in every study under `dirs`, in the first study's row
/// order.
pub fn intersect_genes(dirs: &[PathBuf]) -> Result<Vec<GeneId>> {
    let gene_lists = dirs
        .iter()
        .map(|dir| {
            table::read_value_file(&study_file(dir), Some(GENE_COLUMN))
                .map(|matrix| matrix.gene_ids().to_vec())
        })
        .collect::<Result<Vec<_>>>()?;
    let genes = shared_genes(gene_lists.iter().map(Vec::as_slice));
    info!(
        studies = dirs.len(),
        genes = genes.len(),
        "computed shared gene set"
    );
    Ok(genes)
}
