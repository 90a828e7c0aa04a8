//! Command-line interpretation.
//!
//! # Responsibilities
//! - Accept an arbitrary passthrough command line
//! - Apply the "flags only" shorthand (`-c foo=bar` means `postgres -c foo=bar`)
//! - Decide whether to drop privileges, bootstrap, or hand off directly
//!
//! # Design Decisions
//! - Planning is a pure function so it can be tested without exec
//! - Help and version flags belong to the server, not to the entrypoint

use clap::Parser;

use crate::lifecycle::StartupError;

#[derive(Parser, Debug)]
#[command(
    name = "pg-entrypoint",
    about = "Bootstraps a PostgreSQL data directory on first start, then execs the server",
    disable_help_flag = true,
    disable_version_flag = true
)]
pub struct Cli {
    /// Program to run followed by its arguments, e.g. `postgres -c fsync=off`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

/// What the entrypoint will do with its command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchPlan {
    /// Running as root: fix directory ownership, then re-exec unprivileged.
    DropPrivileges { command: Vec<String> },
    /// Bootstrap the data directory if needed, then exec the server.
    Bootstrap { command: Vec<String> },
    /// Exec the command untouched.
    Passthrough { command: Vec<String> },
}

/// Build the launch plan for `args`.
pub fn plan(
    mut args: Vec<String>,
    server_program: &str,
    is_root: bool,
) -> Result<LaunchPlan, StartupError> {
    let Some(first) = args.first() else {
        return Err(StartupError::NoCommand);
    };

    if first.starts_with('-') {
        args.insert(0, server_program.to_string());
    }

    if args[0] != server_program {
        return Ok(LaunchPlan::Passthrough { command: args });
    }

    Ok(if is_root {
        LaunchPlan::DropPrivileges { command: args }
    } else {
        LaunchPlan::Bootstrap { command: args }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_command_rejected() {
        assert!(matches!(
            plan(vec![], "postgres", false),
            Err(StartupError::NoCommand)
        ));
    }

    #[test]
    fn test_flags_imply_server() {
        let result = plan(argv(&["-c", "fsync=off"]), "postgres", false).unwrap();
        assert_eq!(
            result,
            LaunchPlan::Bootstrap {
                command: argv(&["postgres", "-c", "fsync=off"])
            }
        );
    }

    #[test]
    fn test_root_drops_privileges() {
        let result = plan(argv(&["postgres"]), "postgres", true).unwrap();
        assert_eq!(
            result,
            LaunchPlan::DropPrivileges {
                command: argv(&["postgres"])
            }
        );
    }

    #[test]
    fn test_other_commands_pass_through() {
        for is_root in [true, false] {
            let result = plan(argv(&["psql", "--version"]), "postgres", is_root).unwrap();
            assert_eq!(
                result,
                LaunchPlan::Passthrough {
                    command: argv(&["psql", "--version"])
                }
            );
        }
    }

    #[test]
    fn test_cli_keeps_hyphen_arguments() {
        let cli = Cli::try_parse_from(["pg-entrypoint", "--help", "-c", "x=1"]).unwrap();
        assert_eq!(cli.command, argv(&["--help", "-c", "x=1"]));

        let cli = Cli::try_parse_from(["pg-entrypoint"]).unwrap();
        assert!(cli.command.is_empty());
    }
}
