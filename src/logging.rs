use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initializes console logging on stderr.
///
/// Stdout carries the analysis report, so log lines stay off it. The level
/// defaults to `info` for this crate and can be overridden through `RUST_LOG`.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("biodiversity_eda=info,biodiversity=info"));

    let console_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    // A second init (e.g. from tests) leaves the first subscriber in place.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .try_init();
}
