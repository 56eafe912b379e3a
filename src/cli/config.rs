// config.rs - Configuration file support

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    // Input/Output
    pub trees: Option<String>,
    pub output: Option<String>,
    pub summary: Option<String>,
    pub focal: Option<String>,

    // Sampling
    pub burnin: Option<usize>,

    // Search
    pub algorithm: Option<String>,
    pub trials: Option<usize>,
    pub seed: Option<u64>,

    // Performance
    pub threads: Option<usize>,

    // Flags
    pub quiet: Option<bool>,
    pub verbose: Option<bool>,
}

impl Config {
    /// Create a new empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), String> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        fs::write(path, content)
            .map_err(|e| format!("Failed to write config file '{}': {}", path.display(), e))?;

        log::info!("📄 Saved configuration to: {}", path.display());
        Ok(())
    }

    /// Generate a sample configuration file with comments
    pub fn generate_sample() -> String {
        r#"# treecentroid.toml - Configuration file for treecentroid
# Command line arguments will override these settings

# =============================================================================
# INPUT/OUTPUT
# =============================================================================

# Tree sample (NEXUS trees block, or one Newick tree per line)
trees = "/path/to/posterior.trees"

# Output file for the centroid tree (omit for standard output)
output = "centroid.tree"

# JSON run summary (algorithm, trials, sum of squared distances)
# summary = "centroid.json"

# Focal tree file: report sums of squared distances instead of a centroid
# focal = "/path/to/focal.trees"

# =============================================================================
# SAMPLING
# =============================================================================

# Percentage of leading trees discarded as burn-in (0-100)
burnin = 10

# =============================================================================
# SEARCH
# =============================================================================

# Centroid algorithm: frechet, halfway, binning, cluster, mcc
algorithm = "frechet"

# Randomised trials on shuffled copies of the sample
trials = 100

# Random seed for reproducible trials
# seed = 42

# =============================================================================
# PERFORMANCE
# =============================================================================

# Number of threads (omit for auto-detection)
# threads = 8

# =============================================================================
# FLAGS
# =============================================================================

quiet = false
verbose = false
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_config_parses() {
        let config: Config = toml::from_str(&Config::generate_sample()).unwrap();
        assert_eq!(config.trees.as_deref(), Some("/path/to/posterior.trees"));
        assert_eq!(config.burnin, Some(10));
        assert_eq!(config.trials, Some(100));
        assert_eq!(config.algorithm.as_deref(), Some("frechet"));
        assert!(config.focal.is_none());
    }

    #[test]
    fn test_file_round_trip() {
        let path = std::env::temp_dir().join("babelkit_config_round_trip.toml");
        let config = Config {
            trees: Some("x.trees".into()),
            seed: Some(3),
            ..Config::default()
        };
        config.to_file(&path).unwrap();
        assert_eq!(Config::from_file(&path).unwrap(), config);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_missing_file() {
        let err = Config::from_file("/no/such/config.toml").unwrap_err();
        assert!(err.contains("/no/such/config.toml"));
    }
}
