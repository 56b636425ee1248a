//! Gene-by-sample expression tables.

use std::collections::{HashMap, HashSet};

use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

use crate::error::{DatasetError, Result};

/// A dense expression table: rows are genes, columns are samples.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionMatrix {
    values: Array2<f64>,
    gene_ids: Vec<String>,
    sample_ids: Vec<String>,
}

impl ExpressionMatrix {
    pub fn new(values: Array2<f64>, gene_ids: Vec<String>, sample_ids: Vec<String>) -> Result<Self> {
        let (n_genes, n_samples) = values.dim();
        if gene_ids.len() != n_genes {
            return Err(DatasetError::Shape(format!(
                "{} gene ids for {} rows",
                gene_ids.len(),
                n_genes
            )));
        }
        if sample_ids.len() != n_samples {
            return Err(DatasetError::Shape(format!(
                "{} sample ids for {} columns",
                sample_ids.len(),
                n_samples
            )));
        }
        Ok(Self {
            values,
            gene_ids,
            sample_ids,
        })
    }

    /// A table over `gene_ids` holding no samples.
    pub fn empty(gene_ids: Vec<String>) -> Self {
        let values = Array2::zeros((gene_ids.len(), 0));
        Self {
            values,
            gene_ids,
            sample_ids: Vec::new(),
        }
    }

    /// Builds a table from per-sample columns, mostly useful for fixtures.
    pub fn from_columns<G, S>(gene_ids: Vec<G>, columns: Vec<(S, Vec<f64>)>) -> Result<Self>
    where
        G: Into<String>,
        S: Into<String>,
    {
        let gene_ids: Vec<String> = gene_ids.into_iter().map(Into::into).collect();
        let n_genes = gene_ids.len();
        let mut values = Array2::zeros((n_genes, columns.len()));
        let mut sample_ids = Vec::with_capacity(columns.len());
        for (j, (sample, column)) in columns.into_iter().enumerate() {
            let sample = sample.into();
            if column.len() != n_genes {
                return Err(DatasetError::Shape(format!(
                    "column {sample} has {} values for {n_genes} genes",
                    column.len()
                )));
            }
            for (i, value) in column.into_iter().enumerate() {
                values[[i, j]] = value;
            }
            sample_ids.push(sample);
        }
        Self::new(values, gene_ids, sample_ids)
    }

    pub fn n_genes(&self) -> usize {
        self.gene_ids.len()
    }

    pub fn n_samples(&self) -> usize {
        self.sample_ids.len()
    }

    pub fn gene_ids(&self) -> &[String] {
        &self.gene_ids
    }

    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    /// Expression profile of the sample at column `idx`.
    pub fn column(&self, idx: usize) -> Option<ArrayView1<'_, f64>> {
        (idx < self.n_samples()).then(|| self.values.column(idx))
    }

    /// Keeps the columns at `indices`, in the order given.
    pub fn select_samples(&self, indices: &[usize]) -> Self {
        let values = self.values.select(Axis(1), indices);
        let sample_ids = indices
            .iter()
            .map(|&idx| self.sample_ids[idx].clone())
            .collect();
        Self {
            values,
            gene_ids: self.gene_ids.clone(),
            sample_ids,
        }
    }

    /// Keeps the columns whose sample id satisfies `keep`, preserving order.
    pub fn retain_samples<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(&str) -> bool,
    {
        let indices = self
            .sample_ids
            .iter()
            .enumerate()
            .filter(|(_, sample)| keep(sample))
            .map(|(idx, _)| idx)
            .collect::<Vec<_>>();
        self.select_samples(&indices)
    }

    /// Reorders and restricts rows to exactly `genes`. Duplicate gene ids
    /// resolve to their first row.
    pub fn select_genes(&self, genes: &[String], source_name: &str) -> Result<Self> {
        let index = self.gene_index();
        let rows = genes
            .iter()
            .map(|gene| {
                index
                    .get(gene.as_str())
                    .copied()
                    .ok_or_else(|| DatasetError::GeneNotFound {
                        gene: gene.clone(),
                        source_name: source_name.to_string(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            values: self.values.select(Axis(0), &rows),
            gene_ids: genes.to_vec(),
            sample_ids: self.sample_ids.clone(),
        })
    }

    /// Column-wise concatenation with an inner join on genes. Gene order
    /// follows the first table. Returns `None` for an empty input.
    pub fn concat_samples(tables: &[ExpressionMatrix]) -> Result<Option<Self>> {
        if tables.is_empty() {
            return Ok(None);
        }
        let shared = shared_genes(tables.iter().map(|table| table.gene_ids()));
        let aligned = tables
            .iter()
            .map(|table| {
                if table.gene_ids == shared {
                    Ok(table.values.clone())
                } else {
                    table
                        .select_genes(&shared, "concatenated table")
                        .map(|table| table.values)
                }
            })
            .collect::<Result<Vec<_>>>()?;
        let views = aligned.iter().map(|values| values.view()).collect::<Vec<_>>();
        let values = ndarray::concatenate(Axis(1), &views)
            .map_err(|err| DatasetError::Shape(err.to_string()))?;
        let sample_ids = tables
            .iter()
            .flat_map(|table| table.sample_ids.iter().cloned())
            .collect();
        Self::new(values, shared, sample_ids).map(Some)
    }

    fn gene_index(&self) -> HashMap<&str, usize> {
        let mut index = HashMap::with_capacity(self.gene_ids.len());
        for (row, gene) in self.gene_ids.iter().enumerate() {
            index.entry(gene.as_str()).or_insert(row);
        }
        index
    }
}

/// Gene ids present in every list, in the order of the first list.
pub fn shared_genes<'a, I>(lists: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a [String]>,
{
    let mut lists = lists.into_iter();
    let Some(first) = lists.next() else {
        return Vec::new();
    };
    let others = lists
        .map(|genes| genes.iter().map(String::as_str).collect::<HashSet<_>>())
        .collect::<Vec<_>>();
    let mut seen = HashSet::new();
    let mut shared = Vec::new();
    for gene in first {
        if others.iter().all(|set| set.contains(gene.as_str())) && seen.insert(gene.as_str()) {
            shared.push(gene.clone());
        }
    }
    shared
}
