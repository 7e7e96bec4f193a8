//! Landing page

use qadrive_common::Result;

use crate::browser::{BrowserSession, WaitState};
use crate::pages::{SignInForm, SignUpForm};

const SIGN_UP_BUTTON: &str =
    "//button[contains(@class, 'hero-descriptor_btn') and contains(@class, 'btn-primary')]";
const SIGN_IN_BUTTON: &str = "//button[contains(@class, 'header_signin')]";

pub struct HomePage {
    session: BrowserSession,
}

impl HomePage {
    pub fn new(session: BrowserSession) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &BrowserSession {
        &self.session
    }

    pub async fn open(&self) -> Result<()> {
        self.session.goto("/").await
    }

    /// Open the registration modal.
    pub async fn open_sign_up_form(&self) -> Result<SignUpForm> {
        self.session.click(SIGN_UP_BUTTON).await?;
        let form = SignUpForm::new(self.session.clone());
        form.wait_visible().await?;
        Ok(form)
    }

    /// Open the sign-in modal from the header.
    pub async fn open_sign_in_form(&self) -> Result<SignInForm> {
        self.session.click(SIGN_IN_BUTTON).await?;
        let form = SignInForm::new(self.session.clone());
        self.session
            .wait_for(crate::pages::sign_in::EMAIL_FIELD, WaitState::Visible, None)
            .await?;
        Ok(form)
    }
}
