//! Tracing initialization.

use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Install the process-wide subscriber. Safe to call repeatedly; only the
/// first call takes effect.
///
/// The filter is read from `SIFT_LOG` (same directive syntax as `RUST_LOG`,
/// e.g. `SIFT_LOG=sift=debug`), defaulting to `sift=info`. Output is compact,
/// ANSI-free and goes to stderr, so embedding applications keep stdout to
/// themselves. The engine itself never installs a subscriber; hosts and the
/// integration suite opt in through this entry point.
pub fn init() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_env("SIFT_LOG").unwrap_or_else(|_| EnvFilter::new("sift=info"));
        let result = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .with_target(true)
            .compact()
            .try_init();
        if let Err(e) = result {
            eprintln!("failed to initialize tracing: {e}");
        }
    });
}
