//! Shared utilities for integration tests.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use pg_entrypoint::bootstrap::MARKER_FILE;
use pg_entrypoint::config::EntrypointSettings;
use pg_entrypoint::tools::{CommandRunner, Invocation, ToolStatus};

/// Build an in-memory environment from key/value pairs.
pub fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Settings pointing at `data_dir` with default tool names.
#[allow(dead_code)]
pub fn settings(data_dir: PathBuf) -> EntrypointSettings {
    EntrypointSettings {
        data_dir,
        ..Default::default()
    }
}

/// A runner that records every invocation instead of executing it.
///
/// `initdb` is simulated by writing the marker file and an initial
/// `pg_hba.conf` into `PGDATA`.
#[derive(Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<Invocation>>,
    failing: Option<(String, i32)>,
}

#[allow(dead_code)]
impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call to `program` exit with `code`.
    pub fn failing(program: &str, code: i32) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failing: Some((program.to_string(), code)),
        }
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    /// `program arg arg …` for every call.
    pub fn command_lines(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|inv| {
                std::iter::once(inv.program.as_str())
                    .chain(inv.args.iter().map(String::as_str))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect()
    }

    /// SQL piped to psql, prefixed with the target database if any.
    pub fn statements(&self) -> Vec<String> {
        self.calls()
            .iter()
            .filter(|inv| inv.program == "psql")
            .map(|inv| {
                let db = inv
                    .args
                    .iter()
                    .position(|a| a == "--dbname")
                    .and_then(|i| inv.args.get(i + 1));
                let sql = inv.stdin.clone().unwrap_or_default();
                match db {
                    Some(db) => format!("[{}] {}", db, sql),
                    None => sql,
                }
            })
            .collect()
    }
}

impl CommandRunner for RecordingRunner {
    async fn run(&self, invocation: &Invocation) -> std::io::Result<ToolStatus> {
        self.calls.lock().unwrap().push(invocation.clone());

        if let Some((program, code)) = &self.failing {
            if *program == invocation.program {
                return Ok(ToolStatus::Failed(Some(*code)));
            }
        }

        if invocation.program == "initdb" {
            let data_dir = invocation
                .env
                .iter()
                .find(|(k, _)| k == "PGDATA")
                .map(|(_, v)| PathBuf::from(v))
                .expect("initdb called without PGDATA");
            std::fs::write(data_dir.join(MARKER_FILE), "16\n")?;
            std::fs::write(data_dir.join("pg_hba.conf"), "local all all trust\n")?;
        }

        Ok(ToolStatus::Success)
    }
}
