//! Wire types for the account and garage control-plane surface

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Profile used to register and sign in an identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    pub email: String,
    pub password: String,
}

impl UserProfile {
    pub fn new(name: &str, last_name: &str, email: &str, password: &str) -> Self {
        Self {
            name: name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    /// A profile with a unique, uuid-suffixed email.
    ///
    /// Registration is not idempotent on the backend, so every test that
    /// signs up a fresh identity needs an email nothing else has used.
    pub fn unique(prefix: &str) -> Self {
        let tag = Uuid::new_v4().simple().to_string();
        Self::new(
            "Test",
            "User",
            &format!("{prefix}+{tag}@qadrive.test"),
            "Qadrive1Pass",
        )
    }
}

/// Payload for creating a vehicle record (`POST /api/cars`)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehiclePayload {
    pub car_brand_id: i64,
    pub car_model_id: i64,
    pub mileage: i64,
}

/// A vehicle record as returned by the garage listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleRecord {
    pub id: i64,
    pub car_brand_id: i64,
    pub car_model_id: i64,
    pub mileage: i64,
    pub initial_mileage: i64,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

/// Brand and model ids the suite exercises.
///
/// Server-assigned and stable for the deployed application; the stub backend
/// uses the same catalog.
pub mod catalog {
    pub const BRAND_AUDI: i64 = 1;
    pub const BRAND_BMW: i64 = 2;
    pub const BRAND_FORD: i64 = 3;
    pub const BRAND_PORSCHE: i64 = 4;
    pub const BRAND_FIAT: i64 = 5;

    pub const MODEL_FORD_FIESTA: i64 = 11;
    pub const MODEL_FORD_FOCUS: i64 = 12;
    pub const MODEL_FORD_FUSION: i64 = 13;
}
