// args.rs - Command line arguments definition

use argh::FromArgs;
use log::LevelFilter;

pub const DEFAULT_BURNIN: usize = 10;
pub const DEFAULT_ALGORITHM: &str = "frechet";

#[derive(FromArgs, Debug, Clone, PartialEq)]
/// treecentroid - Centroid summary trees for posterior tree samples
pub struct Args {
    /// tree sample file (NEXUS trees block or one Newick tree per line)
    #[argh(option)]
    pub trees: Option<String>,

    /// percentage of leading trees discarded as burn-in (default: 10)
    #[argh(option, default = "DEFAULT_BURNIN")]
    pub burnin: usize,

    /// number of randomised trials on shuffled samples (default: 0)
    #[argh(option, default = "0")]
    pub trials: usize,

    /// output file for the centroid tree (default: standard output)
    #[argh(option)]
    pub output: Option<String>,

    /// centroid algorithm: frechet, halfway, binning, cluster, mcc (default: frechet)
    #[argh(option, default = "String::from(DEFAULT_ALGORITHM)")]
    pub algorithm: String,

    /// write a JSON run summary to this file
    #[argh(option)]
    pub summary: Option<String>,

    /// focal tree file: report sums of squared distances from its trees instead of computing a centroid
    #[argh(option)]
    pub focal: Option<String>,

    /// random seed for reproducible trials
    #[argh(option)]
    pub seed: Option<u64>,

    /// number of threads (default: auto-detect)
    #[argh(option)]
    pub threads: Option<usize>,

    /// path to TOML configuration file
    #[argh(option)]
    pub config: Option<String>,

    /// generate sample configuration file and exit
    #[argh(switch)]
    pub generate_config: bool,

    /// list available algorithms and exit
    #[argh(switch)]
    pub list_algorithms: bool,

    /// suppress progress bars and informational output
    #[argh(switch)]
    pub quiet: bool,

    /// verbose logging (per-trial improvements)
    #[argh(switch)]
    pub verbose: bool,
}

impl Args {
    /// Logger level: `--quiet` wins over `--verbose`.
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            LevelFilter::Warn
        } else if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }

    /// Arguments with every option at its default.
    pub fn empty() -> Self {
        Self {
            trees: None,
            burnin: DEFAULT_BURNIN,
            trials: 0,
            output: None,
            summary: None,
            algorithm: DEFAULT_ALGORITHM.to_string(),
            focal: None,
            seed: None,
            threads: None,
            config: None,
            generate_config: false,
            list_algorithms: false,
            quiet: false,
            verbose: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::from_args(&["treecentroid"], &["--trees", "sample.trees"]).unwrap();
        assert_eq!(args.trees.as_deref(), Some("sample.trees"));
        assert_eq!(args.burnin, 10);
        assert_eq!(args.trials, 0);
        assert_eq!(args.algorithm, "frechet");
        assert!(args.output.is_none());
        assert!(!args.quiet);
    }

    #[test]
    fn test_all_options() {
        let args = Args::from_args(
            &["treecentroid"],
            &[
                "--trees", "s.trees", "--burnin", "25", "--trials", "100", "--output", "c.tree",
                "--algorithm", "binning", "--seed", "7", "--quiet",
            ],
        )
        .unwrap();
        assert_eq!(args.burnin, 25);
        assert_eq!(args.trials, 100);
        assert_eq!(args.algorithm, "binning");
        assert_eq!(args.seed, Some(7));
        assert!(args.quiet);
    }
}
