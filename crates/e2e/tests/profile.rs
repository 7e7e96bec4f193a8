//! Profile page over a replayed session with a mocked profile route
//!
//! Ignored unless the environment provides `QADRIVE_BASE_URL` and node with
//! playwright; additionally reuses (or establishes) the persisted session of
//! the primary test user.

use serde_json::json;

use qadrive_common::HarnessConfig;
use qadrive_e2e::{init_test_logging, test_user1, USER1_IDENTITY};
use qadrive_harness::bootstrap::ensure_session;
use qadrive_harness::browser::ensure_node_installed;
use qadrive_harness::pages::ProfilePage;
use qadrive_harness::{BrowserSession, SessionStore};

fn environment_ready() -> bool {
    if std::env::var("QADRIVE_BASE_URL").is_err() {
        eprintln!("Skipping: QADRIVE_BASE_URL is not set");
        return false;
    }
    if ensure_node_installed().is_err() {
        eprintln!("Skipping: node not available in PATH");
        return false;
    }
    true
}

#[tokio::test]
#[ignore]
async fn profile_page_shows_the_mocked_user_data() {
    if !environment_ready() {
        return;
    }
    init_test_logging();

    let config = HarnessConfig::from_env().unwrap();
    let store = SessionStore::new(&config.session_dir);
    let record = ensure_session(&config, &store, &test_user1(), USER1_IDENTITY)
        .await
        .unwrap();

    let session = BrowserSession::launch(&config, Some(record.path.as_path()))
        .await
        .unwrap();

    let mocked = json!({
        "status": "ok",
        "data": {
            "userId": 999_999,
            "photoFilename": "default-user.png",
            "name": "Mocked FN",
            "lastName": "Mocked LN",
        },
    });
    session
        .mock_route("**/api/users/profile", 200, &mocked)
        .await
        .unwrap();

    let profile = ProfilePage::new(session.clone());
    profile.open().await.unwrap();
    profile.wait_profile_name("Mocked FN Mocked LN").await.unwrap();

    session.close().await.unwrap();
}
