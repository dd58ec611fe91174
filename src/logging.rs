//! Subscriber setup for `tracing` events emitted by the library.

use tracing::Level;

/// Installs a stderr formatter capped at `level`.
///
/// Later calls are no-ops, so tests and embedders may call it freely.
pub fn init(level: Level) {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .try_init();
}

/// Level for the given CLI flags and settings.
pub fn level_for(verbose: bool, quiet: bool, debug: bool) -> Level {
    if quiet {
        Level::WARN
    } else if verbose || debug {
        Level::DEBUG
    } else {
        Level::INFO
    }
}
