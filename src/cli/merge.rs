// merge.rs - Merge configuration file with CLI arguments

use crate::cli::args::{DEFAULT_ALGORITHM, DEFAULT_BURNIN};
use crate::cli::{Args, Config};

impl Args {
    /// Merge with configuration from file
    /// CLI arguments take precedence over config file values
    pub fn merge_with_config(mut self, config: Config) -> Self {
        // Input/Output
        if self.trees.is_none() {
            self.trees = config.trees;
        }
        if self.output.is_none() {
            self.output = config.output;
        }
        if self.summary.is_none() {
            self.summary = config.summary;
        }
        if self.focal.is_none() {
            self.focal = config.focal;
        }

        // Options with defaults (only override defaults, not explicit CLI values)
        if let Some(burnin) = config.burnin {
            if self.burnin == DEFAULT_BURNIN {
                self.burnin = burnin;
            }
        }
        if let Some(algorithm) = config.algorithm {
            if self.algorithm == DEFAULT_ALGORITHM {
                self.algorithm = algorithm;
            }
        }
        if let Some(trials) = config.trials {
            if self.trials == 0 {
                self.trials = trials;
            }
        }
        if self.seed.is_none() {
            self.seed = config.seed;
        }

        // Performance
        if self.threads.is_none() {
            self.threads = config.threads;
        }

        // Flags (config only sets if not explicitly set)
        if !self.quiet && config.quiet.unwrap_or(false) {
            self.quiet = true;
        }
        if !self.verbose && config.verbose.unwrap_or(false) {
            self.verbose = true;
        }

        self
    }

    /// Load configuration and merge with CLI args
    pub fn with_config_file(self, config_path: &str) -> Result<Self, String> {
        let config = Config::from_file(config_path)?;
        Ok(self.merge_with_config(config))
    }
}
