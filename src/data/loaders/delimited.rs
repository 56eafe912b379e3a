// delimited.rs - Taxa x sites matrix loader (TSV/CSV)

use std::path::Path;

use crate::data::alignment::Alignment;
use crate::data::datatype::CharacterDataType;
use crate::error::{Error, Result};

/// Header: `taxon<sep>label1<sep>label2...`; one row per taxon.
/// Empty cells are missing data.
pub fn load(path: &Path, delimiter: u8, datatype: &CharacterDataType) -> Result<Alignment> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .comment(Some(b'#'))
        .from_path(path)
        .map_err(|e| csv_error(path, e))?;

    let headers = reader.headers().map_err(|e| csv_error(path, e))?.clone();
    if headers.len() < 2 {
        return Err(Error::input(format!(
            "'{}': header must have a taxon column and at least one site",
            path.display()
        )));
    }
    let labels: Vec<String> = headers.iter().skip(1).map(|h| h.trim().to_string()).collect();

    let mut taxa = Vec::new();
    let mut rows = Vec::new();
    for (line_num, record) in reader.records().enumerate() {
        let record = record.map_err(|e| csv_error(path, e))?;
        let taxon = record.get(0).unwrap_or("").trim().to_string();
        if taxon.is_empty() {
            return Err(Error::input(format!(
                "'{}' line {}: missing taxon name",
                path.display(),
                line_num + 2
            )));
        }

        let mut row = Vec::with_capacity(labels.len());
        for (col, cell) in record.iter().skip(1).enumerate() {
            row.push(decode_cell(cell.trim(), datatype).map_err(|e| {
                Error::input(format!(
                    "'{}' line {} site {}: {}",
                    path.display(),
                    line_num + 2,
                    labels[col],
                    e
                ))
            })?);
        }
        taxa.push(taxon);
        rows.push(row);
    }

    if taxa.is_empty() {
        return Err(Error::input(format!("no taxa found in '{}'", path.display())));
    }
    Alignment::from_rows(taxa, rows)?.with_labels(labels)
}

fn decode_cell(cell: &str, datatype: &CharacterDataType) -> Result<Option<u8>> {
    let mut chars = cell.chars();
    match (chars.next(), chars.next()) {
        (None, _) => Ok(None),
        (Some(c), None) => datatype.decode(c),
        _ => Err(Error::input(format!("'{}' is not a single character", cell))),
    }
}

fn csv_error(path: &Path, e: csv::Error) -> Error {
    if e.is_io_error() {
        match e.into_kind() {
            csv::ErrorKind::Io(io) => Error::io(path, io),
            other => Error::input(format!("'{}': {:?}", path.display(), other)),
        }
    } else {
        Error::input(format!("'{}': {}", path.display(), e))
    }
}
