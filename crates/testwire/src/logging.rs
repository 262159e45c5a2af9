//! Test logging.
//!
//! testwire emits `tracing` events for finds, variant selection, waits and
//! serialization. Call [`init_test_logging`] at the top of a test to see
//! them; `RUST_LOG` overrides the default filter.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "testwire=info";

/// Install a compact stderr subscriber that plays well with the test harness.
///
/// Safe to call from every test; only the first call installs a subscriber.
pub fn init_test_logging() {
    init_with_filter(DEFAULT_FILTER);
}

/// Same as [`init_test_logging`] with an explicit default filter
pub fn init_with_filter(default_filter: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_test_writer()
        .with_target(true)
        .with_level(true)
        .compact()
        .try_init();
}
