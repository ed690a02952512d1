//! Logging setup based on `tracing-subscriber`.

use tracing_subscriber::{EnvFilter, fmt};

/// Installs the global subscriber.
///
/// The level is read from `RUST_LOG` (default: `info`), e.g.
/// `RUST_LOG=load_planner=debug`.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true)
        .init();
}

/// Subscriber for tests; repeated calls are ignored.
#[cfg(test)]
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
