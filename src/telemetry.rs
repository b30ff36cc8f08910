//! Logging setup for embedding binaries.

use tracing_subscriber::EnvFilter;

/// Installs a key/value `tracing` subscriber.
///
/// Filtering follows `RUST_LOG` and falls back to `info`. Calling this twice
/// is harmless; the second installation is ignored.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
