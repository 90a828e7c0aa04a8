//! Configuration schema definitions.
//!
//! Two families of types live here: the resolved bootstrap configuration
//! ([`ResolvedConfig`] and its parts), built from operator environment
//! variables, and the entrypoint's own runtime settings
//! ([`EntrypointSettings`]), which derive `Deserialize` so they can be read
//! from an optional TOML file.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::config::validation::ConfigError;

/// Built-in superuser account of the engine.
pub const ADMIN_ACCOUNT: &str = "postgres";

/// Default database that always exists and belongs to [`ADMIN_ACCOUNT`].
pub const ADMIN_DATABASE: &str = "postgres";

/// Fully merged bootstrap configuration.
///
/// Built once per invocation by [`crate::config::resolve`] and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolvedConfig {
    /// Extra arguments passed verbatim to the storage initializer.
    pub init_args: Vec<String>,

    /// System-wide settings applied with `ALTER SYSTEM`.
    pub db_settings: Vec<DbSetting>,

    /// Password for [`ADMIN_ACCOUNT`], if one was declared.
    pub root_password: Option<String>,

    /// Non-administrative accounts in declaration order.
    pub users: Vec<UserSpec>,

    /// Databases in declaration order, excluding [`ADMIN_DATABASE`].
    pub databases: Vec<DatabaseSpec>,
}

impl ResolvedConfig {
    /// Accounts that log in without a password, administrative account first.
    pub fn trusted_accounts(&self) -> Vec<&str> {
        let admin = self
            .root_password
            .as_deref()
            .filter(|pw| pw.is_empty())
            .map(|_| ADMIN_ACCOUNT);

        admin
            .into_iter()
            .chain(
                self.users
                    .iter()
                    .filter(|u| u.password.as_deref() == Some(""))
                    .map(|u| u.name.as_str()),
            )
            .collect()
    }
}

/// A database account to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSpec {
    pub name: String,
    /// `None` disables password login; `Some("")` allows passwordless login.
    pub password: Option<String>,
    pub superuser: bool,
}

/// A database to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSpec {
    pub name: String,
    pub owner: Option<String>,
}

/// A persistent system-wide setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbSetting {
    pub name: String,
    pub value: String,
}

/// Runtime settings of the entrypoint itself.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EntrypointSettings {
    /// Data directory of the cluster (`PGDATA`).
    pub data_dir: PathBuf,

    /// Directory holding the server's unix sockets.
    pub run_dir: PathBuf,

    /// Unprivileged account the server runs as.
    pub service_account: String,

    /// Command name that triggers bootstrap before handoff.
    pub server_program: String,

    /// External programs invoked by the entrypoint.
    pub tools: ToolConfig,
}

impl Default for EntrypointSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::new(),
            run_dir: PathBuf::from("/var/run/postgresql"),
            service_account: "postgres".to_string(),
            server_program: "postgres".to_string(),
            tools: ToolConfig::default(),
        }
    }
}

impl EntrypointSettings {
    /// The data directory, or an error when `PGDATA` was never provided.
    pub fn require_data_dir(&self) -> Result<&Path, ConfigError> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::MissingSetting("PGDATA"));
        }
        Ok(&self.data_dir)
    }
}

/// Names (or paths) of the external collaborators.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    pub initdb: String,
    pub pg_ctl: String,
    pub psql: String,
    pub gosu: String,
    pub mkdir: String,
    pub chown: String,
    pub chmod: String,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            initdb: "initdb".to_string(),
            pg_ctl: "pg_ctl".to_string(),
            psql: "psql".to_string(),
            gosu: "gosu".to_string(),
            mkdir: "mkdir".to_string(),
            chown: "chown".to_string(),
            chmod: "chmod".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trusted_accounts_order() {
        let config = ResolvedConfig {
            root_password: Some(String::new()),
            users: vec![
                UserSpec {
                    name: "alice".into(),
                    password: Some("secret".into()),
                    superuser: false,
                },
                UserSpec {
                    name: "bob".into(),
                    password: Some(String::new()),
                    superuser: true,
                },
                UserSpec {
                    name: "carol".into(),
                    password: None,
                    superuser: false,
                },
            ],
            ..Default::default()
        };

        assert_eq!(config.trusted_accounts(), ["postgres", "bob"]);
    }

    #[test]
    fn test_settings_partial_toml() {
        let settings: EntrypointSettings = toml::from_str(
            r#"
            data_dir = "/srv/pg"

            [tools]
            gosu = "su-exec"
            "#,
        )
        .unwrap();

        assert_eq!(settings.data_dir, PathBuf::from("/srv/pg"));
        assert_eq!(settings.tools.gosu, "su-exec");
        assert_eq!(settings.tools.initdb, "initdb");
        assert_eq!(settings.run_dir, PathBuf::from("/var/run/postgresql"));
    }
}
