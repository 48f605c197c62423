//! Logging setup for the terminal client.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const QUIET: &str = "warn";
const VERBOSE: &str = "info,memoria=debug";

/// Installs the global subscriber. `RUST_LOG` wins over `verbose`, e.g.
/// `RUST_LOG=memoria::net=trace`.
///
/// Logs go to stderr; stdout belongs to the board view.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { VERBOSE } else { QUIET }));

    let fmt_layer = fmt::layer()
        .compact()
        .with_target(verbose)
        .with_writer(std::io::stderr);

    // A second call (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
