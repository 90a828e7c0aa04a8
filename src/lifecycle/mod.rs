//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! argv (startup.rs):
//!     empty → usage error
//!     leading "-" → prepend "postgres"
//!
//! postgres as root (privileges.rs):
//!     mkdir/chown/chmod data + run dirs → exec gosu <account> <self> <argv>
//!
//! postgres as service account:
//!     bootstrap (first run only) → handoff.rs
//!
//! anything else:
//!     handoff.rs (exec, no bootstrap)
//!
//! every handoff carries PGDATA (when known) and PGUSER (default postgres)
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The entrypoint never outlives the handoff; on Unix it is replaced by exec
//! - Root work is limited to directory ownership, everything else runs unprivileged

pub mod handoff;
pub mod privileges;
pub mod startup;

use std::convert::Infallible;

use thiserror::Error;

use crate::bootstrap::{BootstrapError, BootstrapExecutor};
use crate::config::{engine_env, load_settings, ConfigError, EnvResolver, ProcessEnv};
use crate::tools::{SystemRunner, ToolError};

pub use startup::{plan, Cli, LaunchPlan};

/// Errors that stop the entrypoint before handoff.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("No command given. At least 'postgres' must be specified to start the database")]
    NoCommand,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("cannot locate the entrypoint executable: {0}")]
    CurrentExe(#[source] std::io::Error),

    #[error("cannot exec {program}: {source}")]
    Handoff {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Run the entrypoint for `args` (argv without the program name).
///
/// Only returns on failure; success means control went to another program.
pub async fn run(args: Vec<String>) -> Result<Infallible, StartupError> {
    let mut env = EnvResolver::new(ProcessEnv);
    let settings = load_settings(&mut env)?;
    let runner = SystemRunner;

    match plan(args, &settings.server_program, privileges::is_root())? {
        LaunchPlan::DropPrivileges { command } => {
            settings.require_data_dir()?;
            tracing::info!(account = %settings.service_account, "Preparing directories as root");
            privileges::prepare_directories(&settings, &runner).await?;
            let exe = std::env::current_exe().map_err(StartupError::CurrentExe)?;
            let server_env = engine_env(&settings, &mut env)?;
            handoff::exec(
                &privileges::reexec_command(&settings, &exe, command),
                &server_env,
            )
        }
        LaunchPlan::Bootstrap { command } => {
            let outcome = BootstrapExecutor::new(&settings, &runner)
                .run(&mut env)
                .await?;
            tracing::debug!(?outcome, "Bootstrap finished");
            handoff::exec(&command, &engine_env(&settings, &mut env)?)
        }
        LaunchPlan::Passthrough { command } => {
            handoff::exec(&command, &engine_env(&settings, &mut env)?)
        }
    }
}
