//! PostgreSQL container entrypoint library.

pub mod bootstrap;
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod tools;

pub use bootstrap::{BootstrapExecutor, BootstrapOutcome, BootstrapState};
pub use config::{resolve, EnvResolver, ResolvedConfig};
pub use lifecycle::StartupError;
