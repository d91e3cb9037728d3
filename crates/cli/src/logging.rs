//! Diagnostic logging to stderr.

use tracing_subscriber::EnvFilter;

/// Environment variable read when no explicit filter is given.
const LOG_ENV: &str = "BNFKIT_LOG";

/// Install the global subscriber. An explicit `level` wins over
/// `BNFKIT_LOG`; with neither, only warnings are shown.
pub(crate) fn init(level: Option<&str>) {
    let filter = match level {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .finish();
    // A subscriber may already be installed in tests; ignore that error.
    let _ = tracing::subscriber::set_global_default(subscriber);
}
