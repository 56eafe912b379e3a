// cognate_stats.rs - Singleton and duplicate-pattern statistics for cognate alignments

use clap::{Arg, ArgAction, Command};
use std::path::Path;

use babelkit::data::{load_labels, load_partitions, Alignment, CharacterDataType};
use babelkit::output;
use babelkit::stats::{CognateScanner, DEFAULT_PRESENCE_STATE};
use log::{info, LevelFilter};

fn main() {
    if let Err(e) = run_main() {
        eprintln!("❌ ERROR: {}", e);
        eprintln!("💡 Run 'cognate-stats --help' for usage");
        std::process::exit(1);
    }
}

fn run_main() -> Result<(), String> {
    let matches = Command::new("cognate-stats")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Singleton cognates, presence histogram and duplicate site patterns of an alignment")
        .arg(
            Arg::new("alignment")
                .long("alignment")
                .value_name("FILE")
                .help("Alignment file (FASTA, CSV or tab-separated with a header row)")
                .required(true),
        )
        .arg(
            Arg::new("labels")
                .long("labels")
                .value_name("FILE")
                .help("Site labels, one per line"),
        )
        .arg(
            Arg::new("partitions")
                .long("partitions")
                .value_name("FILE")
                .help("Partition definitions: name = start-end (1-based, inclusive)"),
        )
        .arg(
            Arg::new("states")
                .long("states")
                .value_name("N")
                .help("Number of ordered states per character (2 for binary data)")
                .default_value("2"),
        )
        .arg(
            Arg::new("presence-state")
                .long("presence-state")
                .value_name("STATE")
                .help("State counted as cognate presence")
                .default_value("1"),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .value_name("FILE")
                .help("Output file (default: standard output)"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Write the report as JSON")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .help("Only log warnings and errors")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let quiet = matches.get_flag("quiet");
    babelkit::logging::init(if quiet { LevelFilter::Warn } else { LevelFilter::Info });

    let alignment_path = matches
        .get_one::<String>("alignment")
        .ok_or("--alignment is required")?;
    let states: usize = matches
        .get_one::<String>("states")
        .map(|s| s.parse())
        .transpose()
        .map_err(|e| format!("Invalid --states value: {}", e))?
        .unwrap_or(2);
    let presence: u8 = matches
        .get_one::<String>("presence-state")
        .map(|s| s.parse())
        .transpose()
        .map_err(|e| format!("Invalid --presence-state value: {}", e))?
        .unwrap_or(DEFAULT_PRESENCE_STATE);
    if usize::from(presence) >= states {
        return Err(format!(
            "Presence state {} is out of range for {} states",
            presence, states
        ));
    }

    let datatype = if states == 2 {
        CharacterDataType::binary()
    } else {
        CharacterDataType::ordered(states).map_err(|e| e.to_string())?
    };

    let mut alignment =
        Alignment::from_file(Path::new(alignment_path), &datatype).map_err(|e| e.to_string())?;
    info!(
        "📊 Loaded {} taxa × {} sites from {}",
        alignment.taxa().len(),
        babelkit::data::SitePatterns::site_count(&alignment),
        alignment_path
    );

    if let Some(path) = matches.get_one::<String>("labels") {
        let labels = load_labels(Path::new(path)).map_err(|e| e.to_string())?;
        alignment = alignment.with_labels(labels).map_err(|e| e.to_string())?;
    }
    if let Some(path) = matches.get_one::<String>("partitions") {
        let partitions = load_partitions(Path::new(path)).map_err(|e| e.to_string())?;
        info!("🧩 {} partitions from {}", partitions.len(), path);
        alignment = alignment
            .with_partitions(partitions)
            .map_err(|e| e.to_string())?;
    }

    let report = CognateScanner::new(presence).scan(&alignment, &alignment.partitions());
    info!(
        "✅ {} singletons, {} duplicate site pairs",
        report.singletons.len(),
        report.duplicates
    );

    let output_path = matches.get_one::<String>("output").map(Path::new);
    let mut writer = output::open_output(output_path)?;
    if matches.get_flag("json") {
        output::write_stats_json(&mut writer, &report)?;
    } else {
        output::write_stats_text(&mut writer, &report)?;
    }
    if let Some(path) = output_path {
        info!("✅ Report written to: {}", path.display());
    }
    Ok(())
}
