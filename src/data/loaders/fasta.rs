// fasta.rs - FASTA loader for presence/absence alignments

use bio::io::fasta;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::data::alignment::Alignment;
use crate::data::datatype::CharacterDataType;
use crate::error::{Error, Result};

/// Load one record per taxon; every character is decoded by `datatype`.
pub fn load(path: &Path, datatype: &CharacterDataType) -> Result<Alignment> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let reader = fasta::Reader::new(BufReader::new(file));

    let mut taxa = Vec::new();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| Error::io(path, e))?;
        let row = record
            .seq()
            .iter()
            .filter(|b| !b.is_ascii_whitespace())
            .map(|&b| datatype.decode(b as char))
            .collect::<Result<Vec<_>>>()
            .map_err(|e| Error::input(format!("sequence '{}': {}", record.id(), e)))?;
        taxa.push(record.id().to_string());
        rows.push(row);
    }

    if taxa.is_empty() {
        return Err(Error::input(format!(
            "no sequences found in '{}'",
            path.display()
        )));
    }
    Alignment::from_rows(taxa, rows)
}
