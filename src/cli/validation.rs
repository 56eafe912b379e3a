// validation.rs - Input validation utilities

use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::centroid::CentroidAlgorithm;
use crate::cli::args::Args;

/// Validated settings for one centroid run.
#[derive(Debug, Clone, PartialEq)]
pub struct CentroidConfig {
    pub trees: PathBuf,
    pub burnin: usize,
    pub algorithm: CentroidAlgorithm,
    pub trials: usize,
    pub seed: Option<u64>,
    pub output: Option<PathBuf>,
    pub summary: Option<PathBuf>,
    pub focal: Option<PathBuf>,
}

/// Validate all command line arguments
pub fn validate_args(args: &Args) -> Result<CentroidConfig, String> {
    let trees = args.trees.as_ref().ok_or("--trees is required")?;
    require_file(trees, "tree sample")?;

    if args.burnin > 100 {
        return Err(format!(
            "Burn-in must be a percentage between 0 and 100, got {}",
            args.burnin
        ));
    }

    let algorithm = CentroidAlgorithm::from_str(&args.algorithm)?;
    if args.trials > 0 && !algorithm.is_order_sensitive() {
        log::warn!(
            "⚠️  {} does not depend on tree order; {} trials will all give the same tree",
            algorithm,
            args.trials
        );
    }

    if let Some(focal) = &args.focal {
        require_file(focal, "focal tree")?;
    }

    if let Some(threads) = args.threads {
        if threads == 0 {
            return Err("Number of threads must be at least 1".to_string());
        }
    }

    Ok(CentroidConfig {
        trees: PathBuf::from(trees),
        burnin: args.burnin,
        algorithm,
        trials: args.trials,
        seed: args.seed,
        output: args.output.as_ref().map(PathBuf::from),
        summary: args.summary.as_ref().map(PathBuf::from),
        focal: args.focal.as_ref().map(PathBuf::from),
    })
}

fn require_file(path: &str, what: &str) -> Result<(), String> {
    if Path::new(path).is_file() {
        Ok(())
    } else {
        Err(format!("{} file '{}' does not exist", what, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_with_trees() -> (Args, PathBuf) {
        let path = std::env::temp_dir().join("babelkit_validation.trees");
        std::fs::write(&path, "((A,B),C);\n").unwrap();
        let mut args = Args::empty();
        args.trees = Some(path.to_string_lossy().into_owned());
        (args, path)
    }

    #[test]
    fn test_valid_args() {
        let (mut args, path) = args_with_trees();
        args.algorithm = "Halfway".into();
        args.trials = 5;
        let config = validate_args(&args).unwrap();
        assert_eq!(config.algorithm, CentroidAlgorithm::Halfway);
        assert_eq!(config.trees, path);
        assert_eq!(config.burnin, 10);
        assert!(config.output.is_none());
    }

    #[test]
    fn test_missing_trees() {
        assert!(validate_args(&Args::empty()).unwrap_err().contains("--trees"));
        let mut args = Args::empty();
        args.trees = Some("/no/such/file.trees".into());
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_invalid_values() {
        let (mut args, _) = args_with_trees();
        args.burnin = 150;
        assert!(validate_args(&args).is_err());

        let (mut args, _) = args_with_trees();
        args.algorithm = "median".into();
        assert!(validate_args(&args).unwrap_err().contains("Unknown algorithm"));

        let (mut args, _) = args_with_trees();
        args.threads = Some(0);
        assert!(validate_args(&args).is_err());

        let (mut args, _) = args_with_trees();
        args.focal = Some("/no/such/focal.trees".into());
        assert!(validate_args(&args).is_err());
    }
}
