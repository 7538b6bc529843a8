//! Log output for `tmatch`.
//!
//! The library crates log through the `log` facade; the subscriber installed
//! here picks those records up and writes them to stderr, leaving stdout for
//! `--json` output.

use tracing_subscriber::EnvFilter;

/// Filter directive for the `-v` / `-q` flags.
///
/// - `-q`: errors only
/// - default: warnings
/// - `-v`: info, `-vv`: debug, `-vvv`: trace
pub fn level_for(verbosity: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the stderr subscriber. `RUST_LOG`, when set, wins over the flags.
pub fn init(verbosity: u8, quiet: bool) -> Result<(), String> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_for(verbosity, quiet)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init()
        .map_err(|e| format!("cannot initialize logging: {e}"))
}
