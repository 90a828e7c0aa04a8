//! SQL statements issued during bootstrap.

use crate::config::schema::{DatabaseSpec, DbSetting, UserSpec, ADMIN_ACCOUNT};

/// Removes the default `PUBLIC` privileges on the `public` schema.
pub const REVOKE_PUBLIC_SCHEMA: &str = "REVOKE ALL ON SCHEMA public FROM PUBLIC";

/// Quote an identifier, doubling embedded double quotes.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote a string literal, doubling embedded single quotes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

pub fn alter_admin_password(password: &str) -> String {
    format!(
        "ALTER USER {} WITH SUPERUSER PASSWORD {}",
        quote_ident(ADMIN_ACCOUNT),
        quote_literal(password)
    )
}

/// `CREATE USER` with a password clause whenever a password is present,
/// including the empty one.
pub fn create_user(user: &UserSpec) -> String {
    let mut sql = format!("CREATE USER {} WITH", quote_ident(&user.name));
    if let Some(password) = &user.password {
        sql.push_str(" PASSWORD ");
        sql.push_str(&quote_literal(password));
    }
    if user.superuser {
        sql.push_str(" SUPERUSER");
    }
    sql
}

pub fn create_database(database: &DatabaseSpec) -> String {
    match &database.owner {
        Some(owner) => format!(
            "CREATE DATABASE {} WITH OWNER {}",
            quote_ident(&database.name),
            quote_ident(owner)
        ),
        None => format!("CREATE DATABASE {}", quote_ident(&database.name)),
    }
}

pub fn grant_public_schema(owner: &str) -> String {
    format!("GRANT ALL ON SCHEMA public TO {}", quote_ident(owner))
}

/// `ALTER SYSTEM SET`; the parameter name was checked when it was parsed.
pub fn alter_system(setting: &DbSetting) -> String {
    format!(
        "ALTER SYSTEM SET {} = {}",
        setting.name,
        quote_literal(&setting.value)
    )
}
