//! First-run bootstrap of the database cluster.
//!
//! # Data Flow
//! ```text
//! PG_VERSION present? ── yes ──▶ Skipped (no external calls)
//!        │ no
//!        ▼
//! Initializing      initdb, pg_hba.conf rules
//!        ▼
//! ServerWarmingUp   pg_ctl start (localhost only)
//!        ▼
//! Configuring       admin password, users, databases, ALTER SYSTEM
//!        ▼
//! ServerCoolingDown pg_ctl stop
//!        ▼
//! Bootstrapped
//! ```
//!
//! # Design Decisions
//! - Idempotence is whole-sequence only, guarded by the initdb marker file
//! - Any failing step aborts the process; a half-built data directory must
//!   be discarded by the operator
//! - The temporary server never listens beyond loopback

pub mod executor;
pub mod hba;
pub mod sql;

use std::path::Path;

use thiserror::Error;

use crate::config::ConfigError;
use crate::tools::ToolError;

pub use executor::BootstrapExecutor;

/// File written by `initdb`; its presence means bootstrap already happened.
pub const MARKER_FILE: &str = "PG_VERSION";

/// True if `data_dir` holds the marker left by a completed `initdb`.
pub fn is_initialized(data_dir: &Path) -> bool {
    data_dir.join(MARKER_FILE).is_file()
}

/// Progress of the bootstrap sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapState {
    NotBootstrapped,
    Initializing,
    ServerWarmingUp,
    Configuring,
    ServerCoolingDown,
    Bootstrapped,
}

/// What a bootstrap run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// The marker file was found; nothing was touched.
    Skipped,
    /// The full sequence ran.
    Completed {
        /// At least one account got a `trust` rule.
        trust_enabled: bool,
    },
}

/// Errors that abort bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}
