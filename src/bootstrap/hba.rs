//! Host-based access control rules (`pg_hba.conf`).
//!
//! # Responsibilities
//! - Render one `trust` rule per passwordless account
//! - Always finish with a catch-all `md5` rule
//! - Surface the security trade-off with a loud warning
//!
//! # Design Decisions
//! - Rules are appended, the file written by `initdb` is kept as-is
//! - Trust rules come before the catch-all, first match wins in pg_hba

use std::io;
use std::path::Path;

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// Name of the access control file inside the data directory.
pub const HBA_FILE: &str = "pg_hba.conf";

/// Printed to stderr when at least one trust rule was written.
pub const TRUST_WARNING: &str = "
****************************************************
WARNING: No password has been set for the database.
         This will allow anyone with access to the
         Postgres port to access your database. In
         Docker's default configuration, this is
         effectively any other container on the same
         system.

         Use \"-e POSTGRES_PASSWORD=password\" to set
         it in \"docker run\".
****************************************************
";

/// Render the rules to append for the given passwordless accounts.
pub fn render_rules(trusted: &[&str]) -> String {
    let mut rules: String = trusted
        .iter()
        .map(|name| format!("host all {} all trust\n", hba_name(name)))
        .collect();
    rules.push_str("host all all all md5\n");
    rules
}

/// Append rules to `<data_dir>/pg_hba.conf`; returns whether any trust rule
/// was written.
pub async fn append_rules(data_dir: &Path, trusted: &[&str]) -> io::Result<bool> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(data_dir.join(HBA_FILE))
        .await?;

    file.write_all(render_rules(trusted).as_bytes()).await?;
    file.flush().await?;

    for name in trusted {
        tracing::warn!(user = %name, "Trust authentication enabled");
    }
    Ok(!trusted.is_empty())
}

pub fn print_trust_warning() {
    eprintln!("{}", TRUST_WARNING);
}

// pg_hba.conf needs quotes around names with separators or keywords.
fn hba_name(name: &str) -> String {
    let plain = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.');
    let keyword = matches!(name, "all" | "sameuser" | "samerole" | "samegroup");
    if plain && !keyword {
        name.to_string()
    } else {
        format!("\"{}\"", name)
    }
}
