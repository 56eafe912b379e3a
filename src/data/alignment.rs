// alignment.rs - Presence/absence alignment with cognate labels and partitions

use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::datatype::CharacterDataType;
use super::loaders;
use crate::error::{Error, Result};

/// What the statistics scanner needs from an alignment.
pub trait SitePatterns {
    fn site_count(&self) -> usize;
    fn taxon_count(&self) -> usize;
    /// State codes of one site, indexed by taxon; `None` is missing data
    fn pattern(&self, site: usize) -> &[Option<u8>];
    fn taxon_name(&self, taxon: usize) -> &str;

    /// Label of a site, or its 1-based position when unlabelled.
    fn site_label(&self, site: usize) -> String {
        (site + 1).to_string()
    }
}

/// Named contiguous block of sites, `start..end` (0-based, end exclusive).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub name: String,
    pub start: usize,
    pub end: usize,
}

impl Partition {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Sites x taxa matrix of observed codes.
#[derive(Debug, Clone)]
pub struct Alignment {
    taxa: Vec<String>,
    sites: Vec<Vec<Option<u8>>>,
    labels: Option<Vec<String>>,
    partitions: Vec<Partition>,
}

impl Alignment {
    /// Build from one row of codes per taxon.
    pub fn from_rows(taxa: Vec<String>, rows: Vec<Vec<Option<u8>>>) -> Result<Self> {
        if taxa.is_empty() {
            return Err(Error::input("alignment has no taxa"));
        }
        if taxa.len() != rows.len() {
            return Err(Error::input(format!(
                "{} taxon names for {} sequences",
                taxa.len(),
                rows.len()
            )));
        }
        let site_count = rows[0].len();
        if site_count == 0 {
            return Err(Error::input("alignment has no sites"));
        }
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != site_count) {
            return Err(Error::input(format!(
                "sequence '{}' has {} sites, expected {}",
                taxa[i],
                row.len(),
                site_count
            )));
        }

        let sites = (0..site_count)
            .map(|s| rows.iter().map(|row| row[s]).collect())
            .collect();

        Ok(Self {
            taxa,
            sites,
            labels: None,
            partitions: Vec::new(),
        })
    }

    /// Load a FASTA file, or a delimited matrix (`.csv` comma-separated,
    /// anything else tab-separated) whose header row holds site labels.
    pub fn from_file(path: &Path, datatype: &CharacterDataType) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        match extension.as_str() {
            "fasta" | "fa" | "fas" | "fna" => loaders::fasta::load(path, datatype),
            "csv" => loaders::delimited::load(path, b',', datatype),
            _ => loaders::delimited::load(path, b'\t', datatype),
        }
    }

    /// Attach one cognate label per site.
    pub fn with_labels(mut self, labels: Vec<String>) -> Result<Self> {
        if labels.len() != self.sites.len() {
            return Err(Error::input(format!(
                "{} cognate labels for {} sites",
                labels.len(),
                self.sites.len()
            )));
        }
        self.labels = Some(labels);
        Ok(self)
    }

    pub fn with_partitions(mut self, partitions: Vec<Partition>) -> Result<Self> {
        for p in &partitions {
            if p.is_empty() || p.end > self.sites.len() {
                return Err(Error::input(format!(
                    "partition '{}' ({}-{}) is outside 1-{}",
                    p.name,
                    p.start + 1,
                    p.end,
                    self.sites.len()
                )));
            }
        }
        self.partitions = partitions;
        Ok(self)
    }

    /// Declared partitions, or a single partition spanning every site.
    pub fn partitions(&self) -> Vec<Partition> {
        if self.partitions.is_empty() {
            vec![Partition {
                name: "all".to_string(),
                start: 0,
                end: self.sites.len(),
            }]
        } else {
            self.partitions.clone()
        }
    }

    pub fn taxa(&self) -> &[String] {
        &self.taxa
    }
}

impl SitePatterns for Alignment {
    fn site_count(&self) -> usize {
        self.sites.len()
    }

    fn taxon_count(&self) -> usize {
        self.taxa.len()
    }

    fn pattern(&self, site: usize) -> &[Option<u8>] {
        &self.sites[site]
    }

    fn taxon_name(&self, taxon: usize) -> &str {
        &self.taxa[taxon]
    }

    fn site_label(&self, site: usize) -> String {
        match &self.labels {
            Some(labels) => labels[site].clone(),
            None => (site + 1).to_string(),
        }
    }
}

/// Read cognate labels, one per non-empty line.
pub fn load_labels(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut labels = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| Error::io(path, e))?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            labels.push(trimmed.to_string());
        }
    }
    Ok(labels)
}

/// Read partitions written as `name = start-end;` (1-based, inclusive),
/// optionally prefixed by `charset`.
pub fn load_partitions(path: &Path) -> Result<Vec<Partition>> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    parse_partitions(&content)
}

pub fn parse_partitions(content: &str) -> Result<Vec<Partition>> {
    let re = Regex::new(r"(?i)^\s*(?:charset\s+)?([^\s=]+)\s*=\s*(\d+)\s*-\s*(\d+)\s*;?\s*$")
        .map_err(|e| Error::input(format!("invalid partition pattern: {}", e)))?;

    let mut partitions = Vec::new();
    for (line_num, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let caps = re.captures(trimmed).ok_or_else(|| {
            Error::input(format!(
                "invalid partition line {}: expected 'name = start-end;'",
                line_num + 1
            ))
        })?;
        let start: usize = caps[2]
            .parse()
            .map_err(|_| Error::input(format!("invalid start on line {}", line_num + 1)))?;
        let end: usize = caps[3]
            .parse()
            .map_err(|_| Error::input(format!("invalid end on line {}", line_num + 1)))?;
        if start == 0 || end < start {
            return Err(Error::input(format!(
                "invalid range {}-{} on line {}",
                start,
                end,
                line_num + 1
            )));
        }
        partitions.push(Partition {
            name: caps[1].to_string(),
            start: start - 1,
            end,
        });
    }
    Ok(partitions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_taxa() -> Alignment {
        Alignment::from_rows(
            vec!["A".into(), "B".into()],
            vec![vec![Some(1), Some(0), None], vec![Some(0), Some(0), Some(1)]],
        )
        .unwrap()
    }

    #[test]
    fn test_rows_are_transposed_into_sites() {
        let aln = two_taxa();
        assert_eq!(aln.site_count(), 3);
        assert_eq!(aln.taxon_count(), 2);
        assert_eq!(aln.pattern(0), &[Some(1), Some(0)]);
        assert_eq!(aln.pattern(2), &[None, Some(1)]);
        assert_eq!(aln.taxon_name(1), "B");
    }

    #[test]
    fn test_no_sites_is_input_error() {
        let err = Alignment::from_rows(vec!["A".into()], vec![vec![]]).unwrap_err();
        assert!(matches!(err, Error::InputFormat(_)));
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let err = Alignment::from_rows(
            vec!["A".into(), "B".into()],
            vec![vec![Some(1)], vec![Some(0), Some(1)]],
        )
        .unwrap_err();
        assert!(matches!(err, Error::InputFormat(_)));
    }

    #[test]
    fn test_label_count_mismatch() {
        let err = two_taxa().with_labels(vec!["x".into()]).unwrap_err();
        assert!(matches!(err, Error::InputFormat(_)));
        let aln = two_taxa()
            .with_labels(vec!["hand".into(), "foot".into(), "eye".into()])
            .unwrap();
        assert_eq!(aln.site_label(1), "foot");
        assert_eq!(two_taxa().site_label(1), "2");
    }

    #[test]
    fn test_parse_partitions() {
        let parts = parse_partitions("charset hand = 1-2;\n# comment\nfoot=3-3\n").unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].name, "hand");
        assert_eq!((parts[0].start, parts[0].end), (0, 2));
        assert_eq!((parts[1].start, parts[1].end), (2, 3));
        assert!(parse_partitions("bad line").is_err());
        assert!(parse_partitions("x = 0-2;").is_err());
    }

    #[test]
    fn test_partition_bounds() {
        let parts = parse_partitions("a = 2-4;").unwrap();
        assert!(two_taxa().with_partitions(parts).is_err());
        assert_eq!(two_taxa().partitions().len(), 1);
    }
}
