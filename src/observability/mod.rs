//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! config, bootstrap, lifecycle
//!     → tracing events (structured fields)
//!     → logging.rs subscriber
//!     → stderr (container log)
//! ```
//!
//! # Design Decisions
//! - stdout is left to the handed-off server
//! - Secrets are never recorded as fields
//! - Level configurable through RUST_LOG

pub mod logging;
