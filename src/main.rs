//! PostgreSQL container entrypoint.
//!
//! # Architecture Overview
//!
//! ```text
//!   docker run image [cmd…]
//!            │
//!            ▼
//!   ┌─────────────────┐  root + postgres   ┌──────────────────────┐
//!   │ lifecycle::plan │───────────────────▶│ privileges: chown,   │
//!   └────────┬────────┘                    │ exec gosu … self …   │
//!            │ postgres                    └──────────────────────┘
//!            ▼
//!   ┌─────────────────┐   ┌──────────────────┐   ┌───────────────────┐
//!   │   bootstrap     │──▶│ config::resolve  │   │ tools: initdb,    │
//!   │ (first run only)│──────────────────────────▶│ pg_ctl, psql      │
//!   └────────┬────────┘   └──────────────────┘   └───────────────────┘
//!            ▼
//!   ┌─────────────────┐
//!   │ handoff: exec   │──▶ postgres (PID 1)
//!   └─────────────────┘
//! ```

use std::process::ExitCode;

use clap::Parser;

use pg_entrypoint::lifecycle::{self, Cli};
use pg_entrypoint::observability;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    observability::logging::init();

    let cli = Cli::parse();
    tracing::debug!(command = ?cli.command, "pg-entrypoint starting");

    match lifecycle::run(cli.command).await {
        Ok(never) => match never {},
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
