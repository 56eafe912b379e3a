// main.rs - CLI entry point

use std::sync::Arc;
use std::time::Instant;

use babelkit::centroid::search::focal_sums_of_squares;
use babelkit::cli::{validate_args, CentroidConfig, Config};
use babelkit::output::{self, RunSummary};
use babelkit::prelude::*;
use log::info;

fn main() {
    if let Err(e) = run_main() {
        eprintln!("❌ ERROR: {}", e);
        eprintln!("💡 Run 'treecentroid --help' for usage");
        std::process::exit(1);
    }
}

fn run_main() -> std::result::Result<(), String> {
    let mut args: babelkit::cli::Args = argh::from_env();
    let command_line = std::env::args().collect::<Vec<String>>().join(" ");

    // Handle generate config first
    if args.generate_config {
        let sample_config = Config::generate_sample();
        println!("{}", sample_config);
        println!("\n💡 Save this content to a .toml file and use --config /path/to/config.toml");
        return Ok(());
    }

    if args.list_algorithms {
        println!("Available algorithms:");
        for algorithm in [
            CentroidAlgorithm::Frechet,
            CentroidAlgorithm::Halfway,
            CentroidAlgorithm::Binning,
            CentroidAlgorithm::Cluster,
            CentroidAlgorithm::Mcc,
        ] {
            println!("  - {}: {}", algorithm, algorithm.description());
        }
        return Ok(());
    }

    // Load configuration file if specified
    if let Some(config_path) = args.config.clone() {
        args = args.with_config_file(&config_path)?;
    }

    // Level depends on the merged config flags
    babelkit::logging::init(args.log_level());

    info!("🚀 treecentroid v{}", babelkit::VERSION);
    if let Some(config_path) = &args.config {
        info!("📄 Loaded configuration from: {}", config_path);
    }

    // Configure thread pool
    if let Some(n) = args.threads.filter(|&n| n > 0) {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .map_err(|e| format!("Failed to configure thread pool: {}", e))?;
        info!("🧵 Threads: {}", n);
    } else {
        info!("🧵 Threads: {} (auto-detected)", rayon::current_num_threads());
    }

    let config = validate_args(&args)?;
    let total_start = Instant::now();

    let source = TreeFile::new(&config.trees, config.burnin).map_err(|e| e.to_string())?;
    let trees = source.trees().map_err(|e| e.to_string())?;
    info!(
        "🌳 Loaded {} trees over {} taxa from {}",
        trees.len(),
        trees[0].leaf_count(),
        config.trees.display()
    );

    match &config.focal {
        Some(focal) => run_focal(&config, focal, &trees)?,
        None => run_centroid(&config, &trees, &command_line, args.quiet)?,
    }

    info!("⏱️  Total time: {:.2}s", total_start.elapsed().as_secs_f64());
    Ok(())
}

fn run_centroid(
    config: &CentroidConfig,
    trees: &[RankedTree],
    command_line: &str,
    quiet: bool,
) -> std::result::Result<(), String> {
    info!(
        "📐 Algorithm: {} ({}), {} trials",
        config.algorithm,
        config.algorithm.description(),
        config.trials
    );

    let mut search = CentroidSearch::new(RnniMetric, config.algorithm)
        .with_trials(config.trials)
        .with_progress(!quiet);
    if let Some(seed) = config.seed {
        search = search.with_seed(seed);
    }

    let search_start = Instant::now();
    let outcome = search.run(trees).map_err(|e| e.to_string())?;
    info!(
        "✅ Centroid found in {:.2}s: sum of squared distances {} ({} improving trials)",
        search_start.elapsed().as_secs_f64(),
        outcome.sum_of_squares,
        outcome.improvements
    );

    let summary = RunSummary {
        trees_file: config.trees.display().to_string(),
        tree_count: trees.len(),
        taxon_count: outcome.centroid.leaf_count(),
        burnin: config.burnin,
        algorithm: config.algorithm.to_string(),
        trials: outcome.trials,
        improvements: outcome.improvements,
        seed: config.seed,
        sum_of_squares: outcome.sum_of_squares,
        newick: outcome.centroid.to_newick(),
        generated: chrono::Utc::now()
            .format("%Y-%m-%d %H:%M:%S UTC")
            .to_string(),
        version: babelkit::VERSION.to_string(),
    };

    let mut writer = output::open_output(config.output.as_deref())?;
    output::write_centroid(&mut writer, &outcome.centroid, &summary, command_line)?;
    if let Some(path) = &config.output {
        info!("✅ Centroid written to: {}", path.display());
    }

    if let Some(path) = &config.summary {
        output::write_summary_json(path, &summary)?;
        info!("✅ Run summary written to: {}", path.display());
    }
    Ok(())
}

fn run_focal(
    config: &CentroidConfig,
    focal: &std::path::Path,
    trees: &[RankedTree],
) -> std::result::Result<(), String> {
    let taxa = Arc::clone(trees[0].taxa());
    let focal_trees = TreeFile::new(focal, 0)
        .map_err(|e| e.to_string())?
        .with_taxa(taxa)
        .trees()
        .map_err(|e| e.to_string())?;
    info!(
        "🎯 Scoring {} focal trees from {}",
        focal_trees.len(),
        focal.display()
    );

    let sums = focal_sums_of_squares(&RnniMetric, &focal_trees, trees).map_err(|e| e.to_string())?;
    let mut writer = output::open_output(config.output.as_deref())?;
    output::write_focal_report(&mut writer, &sums)?;
    if let Some(path) = &config.output {
        info!("✅ Focal report written to: {}", path.display());
    }
    Ok(())
}
