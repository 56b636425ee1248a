//! Tab-separated expression files, optionally gzip-compressed.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use csv::{Reader, ReaderBuilder, StringRecord, WriterBuilder};
use flate2::read::GzDecoder;
use ndarray::Array2;
use tracing::debug;

use crate::error::{DatasetError, Result};
use crate::matrix::ExpressionMatrix;

/// Header of the gene identifier column in per-study files.
pub const GENE_COLUMN: &str = "Gene";

const MISSING_VALUES: [&str; 5] = ["", "NA", "NaN", "nan", "N/A"];

pub fn is_gzipped(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false)
}

fn open_reader(path: &Path) -> Result<Reader<Box<dyn Read>>> {
    let file = File::open(path).map_err(|err| DatasetError::io(path, err))?;
    let input: Box<dyn Read> = if is_gzipped(path) {
        Box::new(GzDecoder::new(BufReader::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };
    Ok(ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .from_reader(input))
}

fn parse_error(path: &Path, message: impl Into<String>) -> DatasetError {
    DatasetError::ValueFileParse {
        path: path.to_path_buf(),
        message: message.into(),
    }
}

fn read_headers(reader: &mut Reader<Box<dyn Read>>, path: &Path) -> Result<StringRecord> {
    let headers = reader.headers().map_err(|err| match err.kind() {
        csv::ErrorKind::Io(_) => DatasetError::io(path, &err),
        _ => parse_error(path, err.to_string()),
    })?;
    if headers.is_empty() {
        return Err(parse_error(path, "missing header line"));
    }
    Ok(headers.clone())
}

/// Sample identifiers of a value file, read from its header line only.
pub fn read_sample_header(path: &Path) -> Result<Vec<String>> {
    let mut reader = open_reader(path)?;
    let headers = read_headers(&mut reader, path)?;
    Ok(headers.iter().skip(1).map(str::to_string).collect())
}

/// Reads a full value file. With `index_column` set, that header names the
/// gene column; otherwise the first column is used.
pub fn read_value_file(path: &Path, index_column: Option<&str>) -> Result<ExpressionMatrix> {
    let mut reader = open_reader(path)?;
    let headers = read_headers(&mut reader, path)?;

    let index = match index_column {
        Some(name) => headers
            .iter()
            .position(|header| header == name)
            .ok_or_else(|| parse_error(path, format!("no `{name}` column in header")))?,
        None => 0,
    };
    let sample_ids = headers
        .iter()
        .enumerate()
        .filter(|(pos, _)| *pos != index)
        .map(|(_, header)| header.to_string())
        .collect::<Vec<_>>();

    let mut gene_ids = Vec::new();
    let mut data = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| parse_error(path, err.to_string()))?;
        let line = record.position().map(|pos| pos.line()).unwrap_or_default();
        for (pos, field) in record.iter().enumerate() {
            if pos == index {
                gene_ids.push(field.to_string());
                continue;
            }
            let value = parse_value(field).ok_or_else(|| {
                parse_error(path, format!("line {line}: invalid value `{field}`"))
            })?;
            data.push(value);
        }
    }

    debug!(
        path = %path.display(),
        genes = gene_ids.len(),
        samples = sample_ids.len(),
        "read value file"
    );
    let values = Array2::from_shape_vec((gene_ids.len(), sample_ids.len()), data)
        .map_err(|err| parse_error(path, err.to_string()))?;
    ExpressionMatrix::new(values, gene_ids, sample_ids)
}

/// Writes `matrix` with a `Gene` header, readable by [`read_value_file`].
pub fn write_value_file(matrix: &ExpressionMatrix, path: &Path) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .map_err(|err| DatasetError::Filesystem(err.to_string()))?;
    let header = std::iter::once(GENE_COLUMN).chain(matrix.sample_ids().iter().map(String::as_str));
    writer
        .write_record(header)
        .map_err(|err| DatasetError::Filesystem(err.to_string()))?;
    for (gene, row) in matrix.gene_ids().iter().zip(matrix.values().rows()) {
        let fields = std::iter::once(gene.clone()).chain(row.iter().map(|value| value.to_string()));
        writer
            .write_record(fields)
            .map_err(|err| DatasetError::Filesystem(err.to_string()))?;
    }
    writer
        .flush()
        .map_err(|err| DatasetError::Filesystem(err.to_string()))
}

fn parse_value(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if MISSING_VALUES.contains(&trimmed) {
        return Some(f64::NAN);
    }
    trimmed.parse().ok()
}
