// src/logging.rs
// =============================================================================
// Sets up `tracing` so log events from the crawl are printed to stderr.
//
// - RUST_LOG wins if it is set (e.g. RUST_LOG=site_cloner=trace,reqwest=debug)
// - Otherwise -v / -vv pick the level for our own crate
// - stderr keeps stdout clean for the summary (and --json output)
// =============================================================================

use tracing_subscriber::EnvFilter;

// Maps the number of -v flags to a filter directive
fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "site_cloner=info",
        1 => "site_cloner=debug",
        _ => "site_cloner=trace",
    }
}

// Installs the global subscriber. Call once, at startup.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    // try_init: don't panic if something already installed a subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}
