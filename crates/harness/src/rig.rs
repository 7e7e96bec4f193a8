//! Standard fixture wiring for the garage suite
//!
//! One graph covers the common shape of an authenticated garage test: the
//! persisted session seeds a fresh browser context per test, the garage page
//! opens on demand, and the add-car form removes whatever it added through
//! the symmetric UI flow during teardown. The control-plane fixture rides on
//! the same persisted record, impersonating the browser's identity.

use std::sync::Arc;

use futures::FutureExt;

use qadrive_common::{HarnessConfig, Result, UserProfile};

use crate::api::ControlPlaneClient;
use crate::bootstrap;
use crate::browser::BrowserSession;
use crate::fixture::{FixtureGraph, FixtureKey};
use crate::pages::{AddCarForm, GaragePage};
use crate::session::{PersistedSession, SessionCredential, SessionStore};

/// Control-plane client bound to the shared session's credential
pub struct ApiSession {
    pub client: ControlPlaneClient,
    pub credential: SessionCredential,
}

/// Typed keys into the standard graph
pub struct StandardFixtures {
    pub persisted_session: FixtureKey<PersistedSession>,
    pub browser: FixtureKey<BrowserSession>,
    pub garage_page: FixtureKey<GaragePage>,
    pub add_car_form: FixtureKey<AddCarForm>,
    pub control_plane: FixtureKey<ApiSession>,
}

/// Build the standard garage fixture graph for one identity.
pub fn standard_graph(
    config: HarnessConfig,
    user: UserProfile,
    identity: &str,
) -> Result<(Arc<FixtureGraph>, StandardFixtures)> {
    let config = Arc::new(config);
    let user = Arc::new(user);
    let identity: Arc<str> = Arc::from(identity);

    let mut builder = FixtureGraph::builder();

    let persisted_session = {
        let config = config.clone();
        let user = user.clone();
        let identity = identity.clone();
        builder.fixture("persisted_session", &[], move |_| {
            let config = config.clone();
            let user = user.clone();
            let identity = identity.clone();
            async move {
                let store = SessionStore::new(&config.session_dir);
                bootstrap::ensure_session(&config, &store, &user, &identity).await
            }
            .boxed()
        })?
    };

    let browser = {
        let config = config.clone();
        builder.fixture_with_teardown(
            "browser",
            &[persisted_session.id()],
            move |handles| {
                let config = config.clone();
                async move {
                    let record = handles.get(persisted_session)?;
                    BrowserSession::launch(&config, Some(record.path.as_path())).await
                }
                .boxed()
            },
            |session: Arc<BrowserSession>, _| async move { session.close().await }.boxed(),
        )?
    };

    let garage_page = builder.fixture("garage_page", &[browser.id()], move |handles| {
        async move {
            let session = handles.get(browser)?;
            let page = GaragePage::new((*session).clone());
            page.open().await?;
            page.wait_until_open().await?;
            Ok(page)
        }
        .boxed()
    })?;

    let add_car_form = builder.fixture_with_teardown(
        "add_car_form",
        &[garage_page.id()],
        move |handles| {
            async move { handles.get(garage_page)?.open_add_car_form().await }.boxed()
        },
        move |_form, handles| {
            // remove the car the test added, through the same UI it used
            async move {
                let page = handles.get(garage_page)?;
                let edit_form = page.open_edit_car_form().await?;
                let dialog = edit_form.remove_car().await?;
                dialog.confirm().await
            }
            .boxed()
        },
    )?;

    let control_plane = {
        let config = config.clone();
        builder.fixture("control_plane", &[persisted_session.id()], move |handles| {
            let config = config.clone();
            async move {
                let record = handles.get(persisted_session)?;
                let client = ControlPlaneClient::new(&config.base_url, &config.session_marker)?;
                let credential = record.credential(&config.session_marker)?;
                Ok(ApiSession { client, credential })
            }
            .boxed()
        })?
    };

    let graph = Arc::new(builder.build()?);
    Ok((
        graph,
        StandardFixtures {
            persisted_session,
            browser,
            garage_page,
            add_car_form,
            control_plane,
        },
    ))
}
