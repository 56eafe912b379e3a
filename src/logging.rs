// logging.rs - Terminal logger setup for the command line tools

use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

/// Environment variable overriding the log level (error, warn, info, debug, trace).
pub const LOG_ENV: &str = "BABELKIT_LOG";

fn resolve_level(default: LevelFilter, env: Option<&str>) -> LevelFilter {
    env.and_then(|v| v.parse::<LevelFilter>().ok())
        .unwrap_or(default)
}

/// Log to stderr so stdout stays free for results. Repeated calls are ignored.
pub fn init(default: LevelFilter) {
    let level = resolve_level(default, std::env::var(LOG_ENV).ok().as_deref());
    let config = ConfigBuilder::new()
        .set_target_level(LevelFilter::Off)
        .set_thread_level(LevelFilter::Off)
        .set_location_level(LevelFilter::Off)
        .build();
    let _ = TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto);
}
