//! Logger installation for the command-line driver.

use env_logger::{Builder, Env};
use log::LevelFilter;

/// Installs the global logger.
///
/// `RUST_LOG` wins when set; otherwise `verbose` selects debug output and the
/// default is info.
pub fn init(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let env = Env::default().default_filter_or(level.to_string());

    // Fails only when a logger is already installed, e.g. across tests.
    let _ = Builder::from_env(env).format_timestamp_millis().try_init();
}
