//! Persisted session records and credential extraction
//!
//! A session is established through the UI once, saved as a storage-state
//! document, and replayed read-only by every later test run. The document
//! layout matches what the browser driver consumes: an ordered list of
//! cookie entries plus per-origin storage, of which this module only
//! interprets cookie name/value pairs.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use qadrive_common::{Error, Result};

/// One credential entry in a persisted session record.
///
/// Transport attributes (domain, path, expiry) are carried verbatim for the
/// browser's benefit; extraction only reads `name` and `value`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieRecord {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default = "default_cookie_path")]
    pub path: String,
    /// Unix seconds; -1 means a session cookie
    #[serde(default)]
    pub expires: Option<f64>,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub same_site: Option<String>,
}

fn default_cookie_path() -> String {
    "/".to_string()
}

/// Storage-state snapshot of one authenticated browser context
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageState {
    #[serde(default)]
    pub cookies: Vec<CookieRecord>,
    #[serde(default)]
    pub origins: Vec<serde_json::Value>,
}

impl StorageState {
    /// Find a cookie by name.
    pub fn cookie(&self, name: &str) -> Option<&CookieRecord> {
        self.cookies.iter().find(|c| c.name == name)
    }
}

/// An extracted session credential, convertible to exactly one transport
/// form: a `Cookie` header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCredential {
    name: String,
    value: String,
}

impl SessionCredential {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    /// `name=value`, suitable for a `Cookie` request header.
    pub fn as_cookie_header(&self) -> String {
        format!("{}={}", self.name, self.value)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for SessionCredential {
    /// Redacts the value; credentials must not leak into logs or reports.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}=<redacted>", self.name)
    }
}

/// A loaded session record with its on-disk provenance
#[derive(Debug, Clone)]
pub struct PersistedSession {
    pub identity: String,
    pub state: StorageState,
    pub path: PathBuf,
}

impl PersistedSession {
    /// Extract the marker credential from this record.
    pub fn credential(&self, marker: &str) -> Result<SessionCredential> {
        extract_credential(&self.state, marker)
    }
}

/// Scan a record for the marker cookie and return it as a typed credential.
///
/// A missing marker is a hard failure: an absent credential would silently
/// downgrade every later API call to an unauthenticated request.
pub fn extract_credential(state: &StorageState, marker: &str) -> Result<SessionCredential> {
    state
        .cookie(marker)
        .map(|c| SessionCredential::new(&c.name, &c.value))
        .ok_or_else(|| Error::CredentialNotFound {
            marker: marker.to_string(),
        })
}

/// Durable store of session records, one JSON document per identity
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the record for an identity label.
    pub fn path_for(&self, identity: &str) -> PathBuf {
        self.dir.join(format!("{identity}.json"))
    }

    /// Serialize and durably write a record, replacing any prior one.
    ///
    /// The write goes to a temp file in the destination directory and is
    /// renamed into place, so a concurrent reader never observes a torn
    /// record.
    pub fn save(&self, identity: &str, state: &StorageState) -> Result<PersistedSession> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(identity);

        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        serde_json::to_writer_pretty(&mut tmp, state)?;
        tmp.persist(&path)
            .map_err(|e| Error::Io(e.error))?;

        info!(identity, path = %path.display(), "saved session record");
        Ok(PersistedSession {
            identity: identity.to_string(),
            state: state.clone(),
            path,
        })
    }

    /// Read back a previously saved record.
    pub fn load(&self, identity: &str) -> Result<PersistedSession> {
        let path = self.path_for(identity);
        let raw = std::fs::read_to_string(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::SessionNotFound {
                    identity: identity.to_string(),
                }
            } else {
                Error::Io(e)
            }
        })?;
        let state: StorageState = serde_json::from_str(&raw)?;
        debug!(identity, cookies = state.cookies.len(), "loaded session record");
        Ok(PersistedSession {
            identity: identity.to_string(),
            state,
            path,
        })
    }

    /// True when the record carries the marker cookie and it has not expired.
    ///
    /// Backend session expiry is not managed here; this only avoids replaying
    /// a record the backend is guaranteed to reject.
    pub fn is_fresh(state: &StorageState, marker: &str) -> bool {
        match state.cookie(marker) {
            Some(cookie) => match cookie.expires {
                Some(expires) if expires >= 0.0 => {
                    expires > chrono::Utc::now().timestamp() as f64
                }
                // session cookie or no expiry recorded
                _ => true,
            },
            None => false,
        }
    }

    /// Remove the record for an identity, if present.
    pub fn remove(&self, identity: &str) -> Result<()> {
        match std::fs::remove_file(self.path_for(identity)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sid_state(value: &str) -> StorageState {
        StorageState {
            cookies: vec![CookieRecord {
                name: "sid".into(),
                value: value.into(),
                domain: "qauto.test".into(),
                path: "/".into(),
                expires: Some(-1.0),
                http_only: true,
                secure: false,
                same_site: Some("Lax".into()),
            }],
            origins: vec![],
        }
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());

        store.save("user1", &sid_state("abc123")).unwrap();
        let loaded = store.load("user1").unwrap();
        assert_eq!(loaded.state.cookies.len(), 1);
        assert_eq!(loaded.state.cookie("sid").unwrap().value, "abc123");
    }

    #[test]
    fn load_missing_identity_is_session_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());

        match store.load("ghost") {
            Err(Error::SessionNotFound { identity }) => assert_eq!(identity, "ghost"),
            other => panic!("expected SessionNotFound, got {other:?}"),
        }
    }

    #[test]
    fn save_overwrites_prior_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());

        store.save("user1", &sid_state("old")).unwrap();
        store.save("user1", &sid_state("new")).unwrap();
        let loaded = store.load("user1").unwrap();
        assert_eq!(loaded.state.cookie("sid").unwrap().value, "new");
    }

    #[test]
    fn extraction_is_deterministic() {
        let state = sid_state("stable-value");
        let first = extract_credential(&state, "sid").unwrap();
        let second = extract_credential(&state, "sid").unwrap();
        assert_eq!(first, second);
        assert_eq!(first.as_cookie_header(), "sid=stable-value");
    }

    #[test]
    fn missing_marker_is_a_hard_failure() {
        let state = StorageState {
            cookies: vec![CookieRecord {
                name: "theme".into(),
                value: "dark".into(),
                domain: String::new(),
                path: "/".into(),
                expires: None,
                http_only: false,
                secure: false,
                same_site: None,
            }],
            origins: vec![],
        };
        match extract_credential(&state, "sid") {
            Err(Error::CredentialNotFound { marker }) => assert_eq!(marker, "sid"),
            other => panic!("expected CredentialNotFound, got {other:?}"),
        }
    }

    #[test]
    fn display_never_reveals_the_value() {
        let credential = SessionCredential::new("sid", "super-secret");
        assert_eq!(credential.to_string(), "sid=<redacted>");
        assert_eq!(credential.as_cookie_header(), "sid=super-secret");
    }

    #[test]
    fn freshness_honours_expiry() {
        let mut state = sid_state("abc");
        assert!(SessionStore::is_fresh(&state, "sid"));

        state.cookies[0].expires = Some(1.0); // long past
        assert!(!SessionStore::is_fresh(&state, "sid"));

        state.cookies[0].expires =
            Some(chrono::Utc::now().timestamp() as f64 + 3600.0);
        assert!(SessionStore::is_fresh(&state, "sid"));

        assert!(!SessionStore::is_fresh(&state, "token"));
    }
}
