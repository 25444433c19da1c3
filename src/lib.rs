pub mod bleeding;
pub mod cascade;
pub mod config;
pub mod core_state;
pub mod db;
pub mod ingest;
pub mod models;
pub mod scoring;
pub mod triage;

pub use core_state::{Assessment, CoreError, CoreState};

use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber. `RUST_LOG` wins over `fallback`.
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing(fallback: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
