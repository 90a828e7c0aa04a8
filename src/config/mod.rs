//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! process environment (X or X_FILE)
//!     → env.rs (indirection, trimming, memoization)
//!     → loader.rs (three user/database schemes, settings, initdb args)
//!     → validation.rs (duplicate and reserved-name checks)
//!     → ResolvedConfig (immutable, consumed once by bootstrap)
//!
//! PG_ENTRYPOINT_CONFIG (TOML, optional) + PGDATA/PGRUNDIR
//!     → loader.rs
//!     → EntrypointSettings
//! ```
//!
//! # Design Decisions
//! - One `EnvResolver` per process; it owns the memoization cache
//! - Every inconsistency is fatal, there is no partial configuration
//! - Declaration order is execution order; nothing is reordered

pub mod env;
pub mod loader;
pub mod schema;
pub mod validation;

pub use env::{EnvResolver, EnvSource, ProcessEnv};
pub use loader::{engine_env, load_settings, resolve};
pub use schema::{
    DatabaseSpec, DbSetting, EntrypointSettings, ResolvedConfig, ToolConfig, UserSpec,
};
pub use validation::ConfigError;
