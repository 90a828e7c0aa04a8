//! Final handoff to the requested program.
//!
//! On Unix the entrypoint's process image is replaced with `execvp`, so the
//! server becomes the container's main process and receives its signals
//! directly. Elsewhere the program runs as a child and its exit status
//! becomes ours.

use std::convert::Infallible;
use std::process::Command;

use crate::lifecycle::StartupError;

/// Replace the current process with `command`, adding `env` to the
/// inherited environment.
///
/// Returns only if the program could not be started.
pub fn exec(command: &[String], env: &[(String, String)]) -> Result<Infallible, StartupError> {
    let Some((program, args)) = command.split_first() else {
        return Err(StartupError::NoCommand);
    };

    tracing::info!(%program, ?args, "Handing off");
    let source = replace_process(&mut build_command(program, args, env));

    Err(StartupError::Handoff {
        program: program.clone(),
        source,
    })
}

fn build_command(program: &str, args: &[String], env: &[(String, String)]) -> Command {
    let mut command = Command::new(program);
    command.args(args).envs(env.iter().map(|(key, value)| (key, value)));
    command
}

#[cfg(unix)]
fn replace_process(command: &mut Command) -> std::io::Error {
    use std::os::unix::process::CommandExt;

    command.exec()
}

#[cfg(not(unix))]
fn replace_process(command: &mut Command) -> std::io::Error {
    match command.status() {
        Ok(status) => std::process::exit(status.code().unwrap_or(1)),
        Err(e) => e,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    #[test]
    fn test_empty_command() {
        assert!(matches!(exec(&[], &[]), Err(StartupError::NoCommand)));
    }

    #[test]
    fn test_missing_program_reports_error() {
        let command = ["/nonexistent/pg-entrypoint-test-binary".to_string()];
        let err = exec(&command, &[]).unwrap_err();
        assert!(matches!(
            err,
            StartupError::Handoff { ref program, .. } if program.contains("nonexistent")
        ));
    }

    #[test]
    fn test_command_carries_server_env() {
        let env = vec![
            ("PGDATA".to_string(), "/srv/pg".to_string()),
            ("PGUSER".to_string(), "postgres".to_string()),
        ];
        let command = build_command("postgres", &["-c".into(), "fsync=off".into()], &env);

        assert_eq!(command.get_program(), "postgres");
        assert_eq!(command.get_args().collect::<Vec<_>>(), ["-c", "fsync=off"]);
        let envs: Vec<_> = command.get_envs().collect();
        assert_eq!(envs.len(), 2);
        assert!(envs.contains(&(OsStr::new("PGDATA"), Some(OsStr::new("/srv/pg")))));
        assert!(envs.contains(&(OsStr::new("PGUSER"), Some(OsStr::new("postgres")))));
    }
}
