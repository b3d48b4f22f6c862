//! Shared setup for the example programs.

use env_logger::{Builder, Env};
use log::LevelFilter;

/// Install the global logger.
///
/// `RUST_LOG` wins when set. Otherwise `verbose` selects debug output (every
/// merge, split and tier change) over info.
pub fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let env = Env::default().default_filter_or(level.to_string());
    // Fails only if a logger is already installed.
    let _ = Builder::from_env(env).try_init();
}

/// `--verbose` or `-v` anywhere on the command line.
pub fn verbose_flag() -> bool {
    std::env::args().skip(1).any(|a| a == "--verbose" || a == "-v")
}
