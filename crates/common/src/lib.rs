//! QADrive Common Library
//!
//! Shared error taxonomy, harness configuration, and wire types for the
//! QADrive acceptance-test harness.

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{BrowserKind, HarnessConfig, Viewport};
pub use error::{Error, Result};
pub use types::*;

/// QADrive version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default directory for persisted session records
pub fn default_session_dir() -> std::path::PathBuf {
    std::path::PathBuf::from(".auth")
}

/// Cookie name the application uses as its session marker
pub const DEFAULT_SESSION_MARKER: &str = "sid";
