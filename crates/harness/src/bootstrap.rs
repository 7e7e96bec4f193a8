//! One-time session establishment
//!
//! Signing in through the UI is the expensive part of every authenticated
//! test, so it happens once: the resulting storage state is persisted and
//! every later test run replays it read-only.

use tracing::{debug, info};

use qadrive_common::{Error, HarnessConfig, Result, UserProfile};

use crate::api::ControlPlaneClient;
use crate::browser::BrowserSession;
use crate::pages::{GaragePage, HomePage};
use crate::session::{extract_credential, PersistedSession, SessionStore};

/// Register the identity, sign in through the UI, and persist the session.
///
/// Registration going through the control plane keeps the browser flow to
/// the single sign-in; an "already exists" outcome is expected on every run
/// after the first.
pub async fn establish_session(
    config: &HarnessConfig,
    store: &SessionStore,
    user: &UserProfile,
    identity: &str,
) -> Result<PersistedSession> {
    let client = ControlPlaneClient::new(&config.base_url, &config.session_marker)?;
    let signup = client.create_identity(user).await?;
    if !signup.is_success() {
        debug!(
            status = %signup.status,
            message = signup.message().unwrap_or(""),
            "sign-up not applied; identity likely exists"
        );
    }

    info!(identity, "establishing session through the UI");
    let session = BrowserSession::launch(config, None).await?;
    let outcome = sign_in_and_persist(config, store, user, identity, &session).await;
    let closed = session.close().await;
    let record = outcome?;
    closed?;
    Ok(record)
}

async fn sign_in_and_persist(
    config: &HarnessConfig,
    store: &SessionStore,
    user: &UserProfile,
    identity: &str,
    session: &BrowserSession,
) -> Result<PersistedSession> {
    let home = HomePage::new(session.clone());
    home.open().await?;
    let sign_in = home.open_sign_in_form().await?;
    sign_in
        .login_with_credentials(&user.email, &user.password)
        .await?;
    GaragePage::new(session.clone()).wait_until_open().await?;

    let state = session.storage_state().await?;
    // fail before persisting a record no test could use
    extract_credential(&state, &config.session_marker)?;
    store.save(identity, &state)
}

/// Load the persisted session, or establish it when missing or stale.
pub async fn ensure_session(
    config: &HarnessConfig,
    store: &SessionStore,
    user: &UserProfile,
    identity: &str,
) -> Result<PersistedSession> {
    match store.load(identity) {
        Ok(record) if SessionStore::is_fresh(&record.state, &config.session_marker) => {
            debug!(identity, "reusing persisted session");
            Ok(record)
        }
        Ok(_) => {
            info!(identity, "persisted session is stale; re-establishing");
            establish_session(config, store, user, identity).await
        }
        Err(Error::SessionNotFound { .. }) => {
            establish_session(config, store, user, identity).await
        }
        Err(e) => Err(e),
    }
}
