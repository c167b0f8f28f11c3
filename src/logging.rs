//! Logging setup for the provider process.
//!
//! All logs go to **stderr**; stdout belongs to the host framework.
//!
//! # Environment Variables
//!
//! - `PLATFORM_PROVIDER_LOG`: log filter for this provider (e.g. `debug`,
//!   `platform_provider=trace`). Takes precedence over `RUST_LOG`.
//! - `RUST_LOG`: used when `PLATFORM_PROVIDER_LOG` is not set.
//!
//! ```bash
//! # Trace every API request the provider makes
//! PLATFORM_PROVIDER_LOG=platform_provider::client=trace ./platform-provider
//! ```

use tracing::Subscriber;
use tracing_subscriber::{fmt, prelude::*, registry::LookupSpan, EnvFilter, Layer};

/// Environment variable holding the provider log filter.
pub const LOG_ENV: &str = "PLATFORM_PROVIDER_LOG";

/// Initialize the default logging subscriber at `info` level.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging() {
    init_logging_with_default("info");
}

/// Initialize logging, falling back to `default_level` when no filter is set
/// in the environment.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging_with_default(default_level: &str) {
    tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(stderr_layer())
        .init();
}

/// Try to initialize logging, returning false if already initialized.
///
/// Useful in tests, where several cases may race to install a subscriber.
pub fn try_init_logging() -> bool {
    tracing_subscriber::registry()
        .with(env_filter("info"))
        .with(stderr_layer())
        .try_init()
        .is_ok()
}

/// Build the filter from `PLATFORM_PROVIDER_LOG`, then `RUST_LOG`, then `default_level`.
pub fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_level))
}

fn stderr_layer<S>() -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
}
