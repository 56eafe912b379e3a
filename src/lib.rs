// lib.rs - babelkit library root

//! # babelkit - Language-evolution models and tree summaries
//!
//! Substitution models for lexical and ordinal character data (pseudo-Dollo
//! birth-death, its covarion extension, ordinal and nested-ordinal rate
//! matrices) behind a cached eigensystem, centroid summary trees for
//! posterior samples under the ranked nearest-neighbour-interchange (RNNI)
//! metric, and cognate statistics for binary alignments.
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use babelkit::prelude::*;
//!
//! let trees = TreeFile::new("posterior.trees", 10)?.trees()?;
//! let outcome = CentroidSearch::new(RnniMetric, CentroidAlgorithm::Frechet)
//!     .with_seed(1)
//!     .with_trials(100)
//!     .run(&trees)?;
//! println!("{}", outcome.centroid.to_newick());
//! # Ok::<(), babelkit::Error>(())
//! ```

pub mod centroid;
pub mod cli;
pub mod data;
pub mod error;
pub mod logging;
pub mod models;
pub mod output;
pub mod stats;
pub mod tree;

// Convenience prelude for common imports
pub mod prelude {
    pub use crate::centroid::{
        CentroidAlgorithm, CentroidSearch, RnniMetric, SearchOutcome, TreeMetric,
    };
    pub use crate::data::{Alignment, CharacterDataType, Partition, SitePatterns};
    pub use crate::error::{Error, Result};
    pub use crate::models::{ModelConfig, ModelFactory, ModelKind, SubstitutionModel};
    pub use crate::stats::{CognateReport, CognateScanner};
    pub use crate::tree::{RankedTree, TaxonSet, TreeFile, TreeSource};
}

pub use error::{Error, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
