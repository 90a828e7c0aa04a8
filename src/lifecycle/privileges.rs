//! Root-only preparation and the privilege drop.
//!
//! # Responsibilities
//! - Create the data and socket directories with the right owner and mode
//! - Build the command line that re-executes the entrypoint as the service account
//!
//! # Design Decisions
//! - Ownership and modes are delegated to `mkdir`/`chown`/`chmod`
//! - Every step is checked; a root that cannot chown is a broken container

use std::path::Path;

use crate::config::schema::EntrypointSettings;
use crate::tools::{check, CommandRunner, Invocation, ToolError};

/// True when running with effective uid 0.
#[cfg(unix)]
pub fn is_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
pub fn is_root() -> bool {
    false
}

/// Create and hand over the data and run directories to the service account.
pub async fn prepare_directories<R: CommandRunner>(
    settings: &EntrypointSettings,
    runner: &R,
) -> Result<(), ToolError> {
    for invocation in directory_commands(settings) {
        check(runner, &invocation).await?;
    }
    Ok(())
}

fn directory_commands(settings: &EntrypointSettings) -> Vec<Invocation> {
    let tools = &settings.tools;
    let account = settings.service_account.as_str();
    let data_dir = settings.data_dir.display().to_string();
    let run_dir = settings.run_dir.display().to_string();

    vec![
        Invocation::new(&tools.mkdir).args(["-p", data_dir.as_str()]),
        Invocation::new(&tools.chown).args(["-R", account, data_dir.as_str()]),
        Invocation::new(&tools.chmod).args(["700", data_dir.as_str()]),
        Invocation::new(&tools.mkdir).args(["-p", run_dir.as_str()]),
        Invocation::new(&tools.chown).args(["-R", account, run_dir.as_str()]),
        Invocation::new(&tools.chmod).args(["g+s", run_dir.as_str()]),
    ]
}

/// `gosu <account> <exe> <command…>`
pub fn reexec_command(
    settings: &EntrypointSettings,
    exe: &Path,
    command: Vec<String>,
) -> Vec<String> {
    let mut argv = vec![
        settings.tools.gosu.clone(),
        settings.service_account.clone(),
        exe.display().to_string(),
    ];
    argv.extend(command);
    argv
}
