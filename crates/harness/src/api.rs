//! Control-plane client
//!
//! Direct backend calls bypassing the UI, used for setup, teardown, and
//! negative-path verification. Calls return the raw status and body without
//! interpreting success or failure: the same call path serves positive and
//! negative scenarios, and the test body owns the assertion.

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{HeaderValue, COOKIE, SET_COOKIE};
use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing::{debug, info};

use qadrive_common::{Error, Result, UserProfile, VehiclePayload, VehicleRecord};

use crate::session::SessionCredential;

/// Raw outcome of one control-plane call
#[derive(Debug, Clone)]
pub struct ApiOutcome {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiOutcome {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// The backend's `message` field, when present.
    pub fn message(&self) -> Option<&str> {
        self.body.get("message").and_then(Value::as_str)
    }

    /// The backend's `data` field, `Null` when absent.
    pub fn data(&self) -> &Value {
        self.body.get("data").unwrap_or(&Value::Null)
    }

    /// Parse `data` as a vehicle listing; empty when it is not one.
    pub fn vehicles(&self) -> Vec<VehicleRecord> {
        match self.data() {
            Value::Array(rows) => rows
                .iter()
                .filter_map(|row| serde_json::from_value(row.clone()).ok())
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// HTTP client for the account and garage control-plane surface
#[derive(Debug, Clone)]
pub struct ControlPlaneClient {
    http: reqwest::Client,
    base_url: String,
    marker: String,
}

static COOKIE_PAIR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([^=;\s]+)=([^;]*)").expect("static regex"));

impl ControlPlaneClient {
    pub fn new(base_url: &str, marker: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            marker: marker.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn outcome(&self, response: reqwest::Response) -> Result<ApiOutcome> {
        let status = response.status();
        let bytes = response.bytes().await?;
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        debug!(%status, "control-plane response");
        Ok(ApiOutcome { status, body })
    }

    fn cookie_header(credential: &SessionCredential) -> HeaderValue {
        HeaderValue::from_str(&credential.as_cookie_header())
            .unwrap_or_else(|_| HeaderValue::from_static(""))
    }

    /// Register a new identity. Not idempotent: a repeated email surfaces
    /// the backend's "already exists" condition, not a client-side dedup.
    pub async fn create_identity(&self, profile: &UserProfile) -> Result<ApiOutcome> {
        let response = self
            .http
            .post(self.url("/api/auth/signup"))
            .json(&json!({
                "name": profile.name,
                "lastName": profile.last_name,
                "email": profile.email,
                "password": profile.password,
                "repeatPassword": profile.password,
            }))
            .send()
            .await?;
        self.outcome(response).await
    }

    /// Sign in and extract the session marker from the response cookies.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<SessionCredential> {
        let response = self
            .http
            .post(self.url("/api/auth/signin"))
            .json(&json!({
                "email": email,
                "password": password,
                "remember": false,
            }))
            .send()
            .await?;

        let cookies: Vec<String> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect();
        let status = response.status();

        match marker_from_set_cookie(cookies.iter().map(String::as_str), &self.marker) {
            Some(credential) => {
                info!(email, "authenticated via control plane");
                Ok(credential)
            }
            None => Err(Error::AuthenticationFailed(format!(
                "sign-in returned {status} without a '{}' cookie",
                self.marker
            ))),
        }
    }

    pub async fn delete_identity(
        &self,
        email: &str,
        credential: &SessionCredential,
    ) -> Result<ApiOutcome> {
        let response = self
            .http
            .delete(self.url("/api/users"))
            .header(COOKIE, Self::cookie_header(credential))
            .json(&json!({ "email": email }))
            .send()
            .await?;
        self.outcome(response).await
    }

    pub async fn create_record(
        &self,
        payload: &VehiclePayload,
        credential: Option<&SessionCredential>,
    ) -> Result<ApiOutcome> {
        let mut request = self.http.post(self.url("/api/cars")).json(payload);
        if let Some(credential) = credential {
            request = request.header(COOKIE, Self::cookie_header(credential));
        }
        self.outcome(request.send().await?).await
    }

    pub async fn list_records(
        &self,
        credential: Option<&SessionCredential>,
    ) -> Result<ApiOutcome> {
        let mut request = self.http.get(self.url("/api/cars"));
        if let Some(credential) = credential {
            request = request.header(COOKIE, Self::cookie_header(credential));
        }
        self.outcome(request.send().await?).await
    }

    pub async fn delete_record(
        &self,
        id: i64,
        credential: Option<&SessionCredential>,
    ) -> Result<ApiOutcome> {
        let mut request = self.http.delete(self.url(&format!("/api/cars/{id}")));
        if let Some(credential) = credential {
            request = request.header(COOKIE, Self::cookie_header(credential));
        }
        self.outcome(request.send().await?).await
    }

    /// Delete the newest vehicle record, if any.
    ///
    /// "Newest" is decided by the largest server-assigned id rather than by
    /// list position: the listing's order is a backend implementation detail
    /// this client refuses to depend on. No records means no delete call.
    pub async fn cleanup_most_recent(
        &self,
        credential: &SessionCredential,
    ) -> Result<Option<i64>> {
        let listing = self.list_records(Some(credential)).await?;
        let newest = listing.vehicles().into_iter().max_by_key(|v| v.id);
        match newest {
            Some(vehicle) => {
                info!(id = vehicle.id, "removing newest vehicle record");
                self.delete_record(vehicle.id, Some(credential)).await?;
                Ok(Some(vehicle.id))
            }
            None => Ok(None),
        }
    }
}

/// Find the marker cookie among `Set-Cookie` header values.
fn marker_from_set_cookie<'a>(
    values: impl Iterator<Item = &'a str>,
    marker: &str,
) -> Option<SessionCredential> {
    for value in values {
        if let Some(captures) = COOKIE_PAIR.captures(value) {
            let name = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
            if name == marker {
                let cookie_value = captures.get(2).map(|m| m.as_str()).unwrap_or_default();
                return Some(SessionCredential::new(name, cookie_value));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_extraction_takes_the_named_cookie() {
        let headers = [
            "theme=dark; Path=/",
            "sid=s%3Aabc123; Path=/; HttpOnly",
        ];
        let credential = marker_from_set_cookie(headers.iter().copied(), "sid").unwrap();
        assert_eq!(credential.as_cookie_header(), "sid=s%3Aabc123");
    }

    #[test]
    fn marker_extraction_ignores_attributes_and_whitespace() {
        let headers = [" sid=v; Expires=Wed, 01 Jan 2031 00:00:00 GMT; Secure"];
        let credential = marker_from_set_cookie(headers.iter().copied(), "sid").unwrap();
        assert_eq!(credential.as_cookie_header(), "sid=v");
    }

    #[test]
    fn missing_marker_yields_none() {
        let headers = ["other=1; Path=/"];
        assert!(marker_from_set_cookie(headers.iter().copied(), "sid").is_none());
    }

    #[test]
    fn outcome_helpers_read_message_and_data() {
        let outcome = ApiOutcome {
            status: StatusCode::NOT_FOUND,
            body: serde_json::json!({"status": "error", "message": "Model not found"}),
        };
        assert!(!outcome.is_success());
        assert_eq!(outcome.message(), Some("Model not found"));
        assert!(outcome.data().is_null());
        assert!(outcome.vehicles().is_empty());
    }

    #[test]
    fn vehicles_parses_a_listing() {
        let outcome = ApiOutcome {
            status: StatusCode::OK,
            body: serde_json::json!({
                "status": "ok",
                "data": [
                    {"id": 7, "carBrandId": 3, "carModelId": 13, "mileage": 5, "initialMileage": 5},
                    {"id": 9, "carBrandId": 1, "carModelId": 1, "mileage": 1, "initialMileage": 1},
                ],
            }),
        };
        let vehicles = outcome.vehicles();
        assert_eq!(vehicles.len(), 2);
        assert_eq!(vehicles.iter().map(|v| v.id).max(), Some(9));
    }
}
