//! # dcorm-core
//!
//! Foundation types for dcorm: the shared error type, settings and logging.
//! This crate has no dependency on the query compiler and is used by every
//! other crate in the workspace.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`settings`] - Logging and database settings
//! - [`settings_loader`] - Loading settings from TOML, JSON and the environment
//! - [`logging`] - Tracing-based logging integration

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;

// Re-export the most commonly used types at the crate root.
pub use error::{DcormError, DcormResult};
pub use settings::{DatabaseSettings, Settings, DEFAULT_DB_ALIAS};
