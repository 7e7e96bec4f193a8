//! Error types for QADrive

use thiserror::Error;

/// Result type alias using the QADrive Error
pub type Result<T> = std::result::Result<T, Error>;

/// QADrive error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("No persisted session for identity '{identity}'")]
    SessionNotFound { identity: String },

    #[error("Session record has no '{marker}' credential entry")]
    CredentialNotFound { marker: String },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Condition '{condition}' not met within {timeout_ms} ms")]
    AssertionTimeout { condition: String, timeout_ms: u64 },

    #[error("Fixture '{fixture}' setup failed: {source}")]
    FixtureSetup {
        fixture: &'static str,
        #[source]
        source: Box<Error>,
    },

    #[error("Fixture '{fixture}' teardown failed: {source}")]
    FixtureTeardown {
        fixture: &'static str,
        #[source]
        source: Box<Error>,
    },

    #[error("Fixture '{fixture}' is not available: {message}")]
    FixtureUnavailable {
        fixture: &'static str,
        message: String,
    },

    #[error("Fixture '{0}' is already registered")]
    DuplicateFixture(&'static str),

    #[error("Unknown fixture: {0}")]
    UnknownFixture(String),

    #[error("Fixture dependency cycle involving '{0}'")]
    FixtureCycle(String),

    #[error("Test body panicked: {0}")]
    TestPanicked(String),

    #[error("Browser bridge error: {0}")]
    Browser(String),

    #[error("Browser driver not found. Install node and run: npx playwright install")]
    BrowserNotFound,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// True for failures caused by a bounded wait expiring.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::AssertionTimeout { .. })
    }

    /// Fixture name attached to setup/teardown failures, if any.
    pub fn fixture_name(&self) -> Option<&'static str> {
        match self {
            Error::FixtureSetup { fixture, .. } | Error::FixtureTeardown { fixture, .. } => {
                Some(fixture)
            }
            _ => None,
        }
    }
}
