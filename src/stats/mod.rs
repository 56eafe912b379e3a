// mod.rs - Cognate statistics: singletons, presence histogram, duplicate patterns

use log::debug;
use serde::Serialize;

use crate::data::{Partition, SitePatterns};

/// Default code for "cognate present".
pub const DEFAULT_PRESENCE_STATE: u8 = 1;

/// A site where exactly one taxon has the cognate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Singleton {
    pub taxon: usize,
    pub taxon_name: String,
    pub site: usize,
    pub site_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartitionDuplicates {
    pub name: String,
    pub sites: usize,
    pub duplicates: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CognateReport {
    pub taxon_count: usize,
    pub site_count: usize,
    pub singletons: Vec<Singleton>,
    /// Singletons per taxon index
    pub singletons_per_taxon: Vec<usize>,
    /// `cognate_counts[k]` = sites present in exactly `k` taxa
    pub cognate_counts: Vec<usize>,
    pub partitions: Vec<PartitionDuplicates>,
    pub duplicates: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct CognateScanner {
    presence_state: u8,
}

impl Default for CognateScanner {
    fn default() -> Self {
        Self::new(DEFAULT_PRESENCE_STATE)
    }
}

impl CognateScanner {
    pub fn new(presence_state: u8) -> Self {
        Self { presence_state }
    }

    /// Taxa carrying the presence state; missing data never counts.
    pub fn presence_count(&self, pattern: &[Option<u8>]) -> usize {
        pattern
            .iter()
            .filter(|c| **c == Some(self.presence_state))
            .count()
    }

    pub fn scan<A: SitePatterns>(&self, alignment: &A, partitions: &[Partition]) -> CognateReport {
        let taxon_count = alignment.taxon_count();
        let site_count = alignment.site_count();

        let mut singletons = Vec::new();
        let mut singletons_per_taxon = vec![0; taxon_count];
        let mut cognate_counts = vec![0; taxon_count + 1];

        for site in 0..site_count {
            let pattern = alignment.pattern(site);
            let present = self.presence_count(pattern);
            cognate_counts[present] += 1;

            if present == 1 {
                if let Some(taxon) = pattern.iter().position(|c| *c == Some(self.presence_state)) {
                    singletons_per_taxon[taxon] += 1;
                    singletons.push(Singleton {
                        taxon,
                        taxon_name: alignment.taxon_name(taxon).to_string(),
                        site,
                        site_label: alignment.site_label(site),
                    });
                }
            }
        }

        let partitions: Vec<PartitionDuplicates> = partitions
            .iter()
            .map(|p| {
                let duplicates = count_duplicates(alignment, p.start, p.end);
                debug!("partition {}: {} duplicate pattern pairs", p.name, duplicates);
                PartitionDuplicates {
                    name: p.name.clone(),
                    sites: p.len(),
                    duplicates,
                }
            })
            .collect();
        let duplicates = partitions.iter().map(|p| p.duplicates).sum();

        CognateReport {
            taxon_count,
            site_count,
            singletons,
            singletons_per_taxon,
            cognate_counts,
            partitions,
            duplicates,
        }
    }
}

/// Identical site patterns within `start..end`, counted once per unordered pair.
pub fn count_duplicates<A: SitePatterns>(alignment: &A, start: usize, end: usize) -> usize {
    let mut duplicates = 0;
    for i in start..end {
        let a = alignment.pattern(i);
        for j in (i + 1)..end {
            if a == alignment.pattern(j) {
                duplicates += 1;
            }
        }
    }
    duplicates
}
