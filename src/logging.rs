// src/logging.rs
// =============================================================================
// Sets up the `log` facade with an env_logger backend.
//
// Logs always go to stderr so they never end up inside the pager's input.
// RUST_LOG wins over the --verbose flag when both are present.
// =============================================================================

use env_logger::Env;
use log::LevelFilter;

pub fn init_logging(verbose: bool) {
    let default_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(default_level.as_str()))
        .target(env_logger::Target::Stderr)
        .format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "{} [{}] - {}: {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();

    log::debug!("Logging initialized with default level: {default_level}");
}
