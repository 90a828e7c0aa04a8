//! Merging of the three operator input schemes into a [`ResolvedConfig`].
//!
//! Schemes are applied in a fixed order, all feeding the same
//! [`ConfigBuilder`]:
//!
//! 1. `POSTGRES_USER` / `POSTGRES_PASSWORD` / `POSTGRES_DB`
//! 2. `POSTGRES_USERS` / `POSTGRES_DATABASES` (pipe-delimited lists)
//! 3. `POSTGRES_USER_<i>`, `POSTGRES_PASSWORD_<i>`, `POSTGRES_SUPERUSER_<i>`,
//!    `POSTGRES_DATABASES_<i>` for `i = 0, 1, …`
//!
//! The indexed scheme stops at the first index whose user key is unset, so
//! `POSTGRES_USER_3` is ignored when `POSTGRES_USER_2` is missing.

use std::fs;
use std::path::PathBuf;

use crate::config::env::{EnvResolver, EnvSource};
use crate::config::schema::{DbSetting, EntrypointSettings, ResolvedConfig, ADMIN_ACCOUNT};
use crate::config::validation::{ConfigBuilder, ConfigError};

const LIST_SEPARATOR: char = '|';
const FIELD_SEPARATOR: char = ':';
const SUPERUSER_MARKER: char = '!';

/// Resolve the bootstrap configuration from `env`.
pub fn resolve<S: EnvSource>(env: &mut EnvResolver<S>) -> Result<ResolvedConfig, ConfigError> {
    let init_args = parse_init_args(&env.get_or("POSTGRES_INITDB_ARGS", "")?)?;
    let db_settings = parse_settings(&env.get_or("POSTGRES_CONFIGS", "")?)?;

    let mut builder = ConfigBuilder::new();
    apply_single_user(env, &mut builder)?;
    apply_multi(env, &mut builder)?;
    apply_indexed(env, &mut builder)?;

    let config = builder.finish(init_args, db_settings);
    tracing::info!(
        users = config.users.len(),
        databases = config.databases.len(),
        settings = config.db_settings.len(),
        admin_password = config.root_password.is_some(),
        "Configuration resolved"
    );
    Ok(config)
}

fn apply_single_user<S: EnvSource>(
    env: &mut EnvResolver<S>,
    builder: &mut ConfigBuilder,
) -> Result<(), ConfigError> {
    let user = env.get("POSTGRES_USER")?;
    let password = env.get("POSTGRES_PASSWORD")?;

    let owner = match (user, password) {
        (Some(user), password) => {
            builder.add_user("POSTGRES_USER", &user, password, true)?;
            Some(user)
        }
        (None, Some(password)) => {
            builder.add_user("POSTGRES_PASSWORD", ADMIN_ACCOUNT, Some(password), true)?;
            Some(ADMIN_ACCOUNT.to_string())
        }
        (None, None) => None,
    };

    let database = match env.get("POSTGRES_DB")? {
        Some(db) => Some(db),
        None => env.get("POSTGRES_DATABASE")?,
    };
    if let Some(database) = database {
        builder.add_database("POSTGRES_DB", &database, owner)?;
    }

    Ok(())
}

fn apply_multi<S: EnvSource>(
    env: &mut EnvResolver<S>,
    builder: &mut ConfigBuilder,
) -> Result<(), ConfigError> {
    let users = env.get_or("POSTGRES_USERS", "")?;
    for entry in split_list(&users) {
        let (name, password) = split_pair("POSTGRES_USERS", entry)?;
        let (name, superuser) = match name.strip_prefix(SUPERUSER_MARKER) {
            Some(stripped) => (stripped.trim(), true),
            None => (name, false),
        };
        builder.add_user("POSTGRES_USERS", name, password.map(str::to_string), superuser)?;
    }

    let databases = env.get_or("POSTGRES_DATABASES", "")?;
    for entry in split_list(&databases) {
        let (name, owner) = split_pair("POSTGRES_DATABASES", entry)?;
        builder.add_database("POSTGRES_DATABASES", name, owner.map(str::to_string))?;
    }

    Ok(())
}

fn apply_indexed<S: EnvSource>(
    env: &mut EnvResolver<S>,
    builder: &mut ConfigBuilder,
) -> Result<(), ConfigError> {
    for i in 0usize.. {
        let user_key = format!("POSTGRES_USER_{i}");
        let Some(user) = env.get(&user_key)? else {
            tracing::debug!(index = i, "Indexed user scheme ends");
            break;
        };

        let password = env.get(&format!("POSTGRES_PASSWORD_{i}"))?;
        let superuser = env.get(&format!("POSTGRES_SUPERUSER_{i}"))?.as_deref() == Some("1");
        builder.add_user(&user_key, &user, password, superuser)?;

        let databases_key = format!("POSTGRES_DATABASES_{i}");
        let databases = env.get_or(&databases_key, "")?;
        for database in split_list(&databases) {
            builder.add_database(&databases_key, database, Some(user.clone()))?;
        }
    }

    Ok(())
}

/// Split a `|`-separated list, trimming entries and dropping empty ones.
fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value
        .split(LIST_SEPARATOR)
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
}

/// Split `first[:second]`; an empty or missing second segment is `None`.
fn split_pair<'a>(key: &str, entry: &'a str) -> Result<(&'a str, Option<&'a str>), ConfigError> {
    let mut fields = entry.split(FIELD_SEPARATOR).map(str::trim);
    let first = fields.next().unwrap_or_default();
    let second = fields.next().filter(|s| !s.is_empty());

    if fields.next().is_some() {
        return Err(ConfigError::MalformedEntry {
            key: key.to_string(),
            entry: entry.to_string(),
        });
    }

    Ok((first, second))
}

fn parse_settings(value: &str) -> Result<Vec<DbSetting>, ConfigError> {
    split_list(value)
        .map(|entry| {
            let malformed = || ConfigError::MalformedEntry {
                key: "POSTGRES_CONFIGS".to_string(),
                entry: entry.to_string(),
            };
            let (name, value) = entry.split_once(FIELD_SEPARATOR).ok_or_else(malformed)?;
            let (name, value) = (name.trim(), value.trim());
            if name.is_empty() || value.contains(FIELD_SEPARATOR) {
                return Err(malformed());
            }
            if !is_setting_name(name) {
                return Err(ConfigError::InvalidSettingName(name.to_string()));
            }
            Ok(DbSetting {
                name: name.to_string(),
                value: value.to_string(),
            })
        })
        .collect()
}

/// Setting names end up unquoted in `ALTER SYSTEM SET`.
fn is_setting_name(name: &str) -> bool {
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

fn parse_init_args(value: &str) -> Result<Vec<String>, ConfigError> {
    shlex::split(value).ok_or_else(|| ConfigError::InitArgs(value.to_string()))
}

/// Load the entrypoint's own settings.
///
/// `PG_ENTRYPOINT_CONFIG` may name a TOML file providing defaults; `PGDATA`
/// and `PGRUNDIR` from the environment take precedence over it. A missing
/// data directory is only reported by code paths that need one.
pub fn load_settings<S: EnvSource>(
    env: &mut EnvResolver<S>,
) -> Result<EntrypointSettings, ConfigError> {
    let mut settings = match env.get("PG_ENTRYPOINT_CONFIG")? {
        Some(path) => {
            let path = PathBuf::from(path);
            let content = fs::read_to_string(&path).map_err(|e| ConfigError::SettingsFile {
                path: path.clone(),
                reason: e.to_string(),
            })?;
            toml::from_str(&content).map_err(|e| ConfigError::SettingsFile {
                path,
                reason: e.to_string(),
            })?
        }
        None => EntrypointSettings::default(),
    };

    if let Some(data_dir) = env.get("PGDATA")? {
        settings.data_dir = PathBuf::from(data_dir);
    }
    if let Some(run_dir) = env.get("PGRUNDIR")? {
        settings.run_dir = PathBuf::from(run_dir);
    }

    Ok(settings)
}

/// Variables the engine programs and the server are started with.
///
/// `PGDATA` comes from the settings, so a data directory given only in the
/// TOML file still reaches the server. `PGUSER` keeps an operator value and
/// otherwise defaults to the administrative account.
pub fn engine_env<S: EnvSource>(
    settings: &EntrypointSettings,
    env: &mut EnvResolver<S>,
) -> Result<Vec<(String, String)>, ConfigError> {
    let mut vars = Vec::with_capacity(2);
    if !settings.data_dir.as_os_str().is_empty() {
        vars.push(("PGDATA".to_string(), settings.data_dir.display().to_string()));
    }
    vars.push(("PGUSER".to_string(), env.get_or("PGUSER", ADMIN_ACCOUNT)?));
    Ok(vars)
}
