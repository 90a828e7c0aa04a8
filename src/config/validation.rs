//! Registration rules shared by every input scheme.
//!
//! # Responsibilities
//! - Accumulate users and databases in declaration order
//! - Reject duplicates across all schemes combined
//! - Route the administrative account to its dedicated password slot
//! - Protect the ownership of the administrative default database
//!
//! # Design Decisions
//! - Accumulator is an explicit struct, consumed once by [`ConfigBuilder::finish`]
//! - First violation aborts; there is nothing useful to do with a partial config
//! - Owners are not checked for existence here, creation order handles it

use std::collections::HashSet;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::schema::{
    DatabaseSpec, DbSetting, ResolvedConfig, UserSpec, ADMIN_ACCOUNT, ADMIN_DATABASE,
};

/// Fatal configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} and {file_key} were set, only one allowed")]
    BothSet { key: String, file_key: String },

    #[error("cannot read {key} from {}: {source}", path.display())]
    ReadFile {
        key: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("user {0} registered twice")]
    DuplicateUser(String),

    #[error("database {0} registered twice")]
    DuplicateDatabase(String),

    #[error("cannot change postgres to a non-superuser")]
    AdminNotSuperuser,

    #[error("cannot change owner of database postgres to {0}")]
    AdminDatabaseOwner(String),

    #[error("user name {name:?} in {key} contains a double quote")]
    QuotedUserName { name: String, key: String },

    #[error("empty {kind} name in {key}")]
    EmptyName { kind: &'static str, key: String },

    #[error("malformed entry {entry:?} in {key}")]
    MalformedEntry { key: String, entry: String },

    #[error("invalid configuration parameter name {0:?} in POSTGRES_CONFIGS")]
    InvalidSettingName(String),

    #[error("cannot split POSTGRES_INITDB_ARGS: unbalanced quoting in {0:?}")]
    InitArgs(String),

    #[error("{0} must be set")]
    MissingSetting(&'static str),

    #[error("cannot load settings file {}: {reason}", path.display())]
    SettingsFile { path: PathBuf, reason: String },
}

/// Mutable accumulator for users and databases declared by the operator.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    root_password: Option<String>,
    users: Vec<UserSpec>,
    databases: Vec<DatabaseSpec>,
    seen_users: HashSet<String>,
    seen_databases: HashSet<String>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user declared by `source` (the originating key, for messages).
    pub fn add_user(
        &mut self,
        source: &str,
        name: &str,
        password: Option<String>,
        superuser: bool,
    ) -> Result<(), ConfigError> {
        if name.is_empty() {
            return Err(ConfigError::EmptyName {
                kind: "user",
                key: source.to_string(),
            });
        }

        // pg_hba.conf has no escape for `"` inside a quoted name.
        if name.contains('"') {
            return Err(ConfigError::QuotedUserName {
                name: name.to_string(),
                key: source.to_string(),
            });
        }

        if self.seen_users.contains(name) {
            return Err(ConfigError::DuplicateUser(name.to_string()));
        }

        if name == ADMIN_ACCOUNT {
            if !superuser {
                return Err(ConfigError::AdminNotSuperuser);
            }
            self.root_password = password;
        } else {
            self.users.push(UserSpec {
                name: name.to_string(),
                password,
                superuser,
            });
        }

        self.seen_users.insert(name.to_string());
        Ok(())
    }

    /// Register a database declared by `source`.
    pub fn add_database(
        &mut self,
        source: &str,
        name: &str,
        owner: Option<String>,
    ) -> Result<(), ConfigError> {
        if name.is_empty() {
            return Err(ConfigError::EmptyName {
                kind: "database",
                key: source.to_string(),
            });
        }

        if name == ADMIN_DATABASE {
            return match owner {
                Some(owner) if owner != ADMIN_ACCOUNT => {
                    Err(ConfigError::AdminDatabaseOwner(owner))
                }
                // Always exists.
                _ => Ok(()),
            };
        }

        if !self.seen_databases.insert(name.to_string()) {
            return Err(ConfigError::DuplicateDatabase(name.to_string()));
        }

        self.databases.push(DatabaseSpec {
            name: name.to_string(),
            owner,
        });
        Ok(())
    }

    /// Freeze the accumulated state into a [`ResolvedConfig`].
    pub fn finish(self, init_args: Vec<String>, db_settings: Vec<DbSetting>) -> ResolvedConfig {
        ResolvedConfig {
            init_args,
            db_settings,
            root_password: self.root_password,
            users: self.users,
            databases: self.databases,
        }
    }
}
