//! Profile page

use qadrive_common::Result;

use crate::browser::BrowserSession;
use crate::wait::poll_until;

const PROFILE_NAME: &str = "//p[contains(@class, 'profile_name')]";

pub struct ProfilePage {
    session: BrowserSession,
}

impl ProfilePage {
    pub fn new(session: BrowserSession) -> Self {
        Self { session }
    }

    pub async fn open(&self) -> Result<()> {
        self.session.goto("/panel/profile").await
    }

    pub async fn profile_name(&self) -> Result<String> {
        Ok(self
            .session
            .text_content(PROFILE_NAME)
            .await?
            .trim()
            .to_string())
    }

    pub async fn wait_profile_name(&self, expected: &str) -> Result<()> {
        poll_until(
            &format!("profile name '{expected}'"),
            self.session.config().wait_timeout(),
            self.session.config().poll_interval(),
            || async move { Ok(self.profile_name().await? == expected) },
        )
        .await
    }
}
