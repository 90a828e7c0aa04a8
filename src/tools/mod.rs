//! Invocation of external collaborators (`initdb`, `pg_ctl`, `psql`, …).
//!
//! # Responsibilities
//! - Describe one external program call as plain data ([`Invocation`])
//! - Run it to completion, piping optional stdin
//! - Report the exit status without interpreting it
//!
//! # Design Decisions
//! - [`CommandRunner`] is the seam tests replace with a recorder
//! - Calls are awaited one at a time; nothing runs concurrently
//! - stdout/stderr are inherited so tool output reaches the container log

use std::fmt;
use std::future::Future;
use std::process::{ExitStatus, Stdio};

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// A single external program call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Extra environment entries on top of the inherited environment.
    pub env: Vec<(String, String)>,
    /// Text written to the program's stdin, which is then closed.
    pub stdin: Option<String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            stdin: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn envs(mut self, env: &[(String, String)]) -> Self {
        self.env.extend_from_slice(env);
        self
    }

    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }
}

/// Outcome of a finished program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolStatus {
    Success,
    /// Nonzero exit, or `None` when terminated by a signal.
    Failed(Option<i32>),
}

impl ToolStatus {
    pub fn success(self) -> bool {
        self == ToolStatus::Success
    }
}

impl From<ExitStatus> for ToolStatus {
    fn from(status: ExitStatus) -> Self {
        if status.success() {
            ToolStatus::Success
        } else {
            ToolStatus::Failed(status.code())
        }
    }
}

impl fmt::Display for ToolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolStatus::Success => write!(f, "exit status 0"),
            ToolStatus::Failed(Some(code)) => write!(f, "exit status {}", code),
            ToolStatus::Failed(None) => write!(f, "termination by signal"),
        }
    }
}

/// Errors raised while driving external programs.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} failed with {status}")]
    Failed { program: String, status: ToolStatus },
}

/// Executes [`Invocation`]s.
pub trait CommandRunner {
    /// Run `invocation` to completion.
    ///
    /// An `Err` means the program could not be started or fed; a program that
    /// ran and failed is reported as [`ToolStatus::Failed`].
    fn run(
        &self,
        invocation: &Invocation,
    ) -> impl Future<Output = std::io::Result<ToolStatus>> + Send;
}

/// Fail-fast helper: any unsuccessful status becomes a [`ToolError`].
pub async fn check<R: CommandRunner>(runner: &R, invocation: &Invocation) -> Result<(), ToolError> {
    tracing::debug!(program = %invocation.program, args = ?invocation.args, "Running");

    let status = runner
        .run(invocation)
        .await
        .map_err(|source| ToolError::Spawn {
            program: invocation.program.clone(),
            source,
        })?;

    if status.success() {
        Ok(())
    } else {
        Err(ToolError::Failed {
            program: invocation.program.clone(),
            status,
        })
    }
}

/// Runs programs as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    async fn run(&self, invocation: &Invocation) -> std::io::Result<ToolStatus> {
        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .envs(invocation.env.iter().map(|(k, v)| (k, v)))
            .stdin(if invocation.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::inherit()
            });

        let mut child = command.spawn()?;

        if let Some(input) = &invocation.stdin {
            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(input.as_bytes()).await?;
                stdin.shutdown().await?;
            }
        }

        Ok(child.wait().await?.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_builder() {
        let inv = Invocation::new("psql")
            .args(["-v", "ON_ERROR_STOP=1"])
            .arg("--username")
            .arg("postgres")
            .envs(&[("PGUSER".to_string(), "postgres".to_string())])
            .stdin("SELECT 1");

        assert_eq!(inv.program, "psql");
        assert_eq!(inv.args, ["-v", "ON_ERROR_STOP=1", "--username", "postgres"]);
        assert_eq!(inv.env.len(), 1);
        assert_eq!(inv.stdin.as_deref(), Some("SELECT 1"));
    }

    #[test]
    fn test_status_display() {
        assert_eq!(ToolStatus::Failed(Some(2)).to_string(), "exit status 2");
        assert_eq!(ToolStatus::Failed(None).to_string(), "termination by signal");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_system_runner_pipes_stdin() {
        let ok = Invocation::new("sh")
            .args(["-c", "read line && test \"$line\" = hello"])
            .stdin("hello\n");
        assert_eq!(SystemRunner.run(&ok).await.unwrap(), ToolStatus::Success);

        let bad = Invocation::new("sh").args(["-c", "exit 3"]);
        let err = check(&SystemRunner, &bad).await.unwrap_err();
        assert!(matches!(
            err,
            ToolError::Failed {
                status: ToolStatus::Failed(Some(3)),
                ..
            }
        ));
    }
}
