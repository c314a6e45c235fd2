//! Optional `tracing` subscriber setup (feature `logging`).
//!
//! ```rust,no_run
//! let cfg = wavisor::Config::default();
//! wavisor::logging::init(cfg.log_filter()).ok();
//! ```

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Installs a compact stderr subscriber.
///
/// `RUST_LOG` overrides `filter` when set. Fails if a global subscriber is
/// already installed.
pub fn init(filter: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(filter))?;

    let stderr = std::io::stderr.with_max_level(tracing::Level::TRACE);

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(stderr)
        .with_target(true)
        .with_level(true)
        .compact()
        .try_init()
}
