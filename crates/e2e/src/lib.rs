//! Shared test data and helpers for the QADrive suite

use qadrive_common::UserProfile;

pub mod test_data;

/// Identity label of the primary shared-session user
pub const USER1_IDENTITY: &str = "testUser1";

/// Identity label of the secondary shared-session user
pub const USER2_IDENTITY: &str = "testUser2";

fn env_or(var: &str, default: &str) -> String {
    std::env::var(var).unwrap_or_else(|_| default.to_string())
}

/// The primary test user. Credentials come from `QADRIVE_USER1_EMAIL` /
/// `QADRIVE_USER1_PASSWORD` when set.
pub fn test_user1() -> UserProfile {
    UserProfile::new(
        "Test",
        "UserOne",
        &env_or("QADRIVE_USER1_EMAIL", "qadrive.user1@qadrive.test"),
        &env_or("QADRIVE_USER1_PASSWORD", "Qadrive1Pass"),
    )
}

/// The secondary test user.
pub fn test_user2() -> UserProfile {
    UserProfile::new(
        "Test",
        "UserTwo",
        &env_or("QADRIVE_USER2_EMAIL", "qadrive.user2@qadrive.test"),
        &env_or("QADRIVE_USER2_PASSWORD", "Qadrive2Pass"),
    )
}

/// Seed for the suite's pseudo-random choices; override with `QADRIVE_SEED`
/// to reproduce a reported run.
pub fn test_seed() -> u64 {
    std::env::var("QADRIVE_SEED")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(42)
}

/// Initialize logging for a test binary; safe to call repeatedly.
pub fn init_test_logging() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
