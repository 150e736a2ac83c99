//! Shared configuration and logging setup.

mod environment;
mod error;
mod settings;

pub use environment::{CmdbEnvironment, DEFAULT_API_VERSION, DEFAULT_BASE_URL};
pub use error::ConfigError;
pub use settings::{CrawlSettings, OutputFormat, ParseOutputFormatError};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default filter when `RUST_LOG` is not set.
const DEFAULT_LOG_FILTER: &str = "info";

/// Install the global `tracing` subscriber.
///
/// Reads the filter from `RUST_LOG`, falling back to `info`. Calling this more
/// than once is harmless; later calls are ignored.
pub fn init_logging() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false))
        .try_init();
}

/// Read a variable from the process environment.
pub(crate) fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Load a `.env` file if present.
pub(crate) fn load_dotenv() {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "Loaded .env");
    }
}
