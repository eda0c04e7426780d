//! Tracing subscriber setup for the `clinic-chat` binary.
//!
//! Logs go to stderr so they never interleave with the conversation on
//! stdout. The filter comes from `CLINIC_CHAT_LOG`, then `RUST_LOG`, then
//! [`DEFAULT_FILTER`].

use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directive.
pub const LOG_FILTER_ENV: &str = "CLINIC_CHAT_LOG";

pub const DEFAULT_FILTER: &str = "clinic_chat=info";

/// Resolve the filter from the environment, falling back to the default.
pub fn env_filter() -> EnvFilter {
    std::env::var(LOG_FILTER_ENV)
        .ok()
        .and_then(|value| EnvFilter::try_new(value).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber.
///
/// Returns `false` if a subscriber was already installed.
pub fn init_logging() -> bool {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .try_init()
        .is_ok()
}
