//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once, before anything else runs
//! - Route all events to stderr
//!
//! # Design Decisions
//! - `RUST_LOG` overrides the default `pg_entrypoint=info` filter
//! - No timestamps from us; the container runtime adds its own

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "pg_entrypoint=info";

/// Install the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_FILTER.into());

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .without_time()
                .with_target(false),
        )
        .try_init();
}
