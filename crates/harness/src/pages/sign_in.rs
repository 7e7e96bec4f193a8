//! Sign-in modal

use qadrive_common::Result;

use crate::browser::BrowserSession;

pub(crate) const EMAIL_FIELD: &str = "//input[@id='signinEmail']";
const PASSWORD_FIELD: &str = "//input[@id='signinPassword']";
const LOGIN_BUTTON: &str =
    "//div[contains(@class, 'modal-footer')]//button[@class='btn btn-primary']";

pub struct SignInForm {
    session: BrowserSession,
}

impl SignInForm {
    pub fn new(session: BrowserSession) -> Self {
        Self { session }
    }

    pub async fn enter_email(&self, email: &str) -> Result<()> {
        self.session.fill(EMAIL_FIELD, email).await
    }

    pub async fn enter_password(&self, password: &str) -> Result<()> {
        self.session.fill(PASSWORD_FIELD, password).await
    }

    pub async fn submit(&self) -> Result<()> {
        self.session.click(LOGIN_BUTTON).await
    }

    /// Fill credentials and submit, strictly in order.
    pub async fn login_with_credentials(&self, email: &str, password: &str) -> Result<()> {
        self.enter_email(email).await?;
        self.enter_password(password).await?;
        self.submit().await
    }

    /// Focus then blur a field to trigger its validation.
    pub async fn trigger_error_on(&self, selector: &str) -> Result<()> {
        self.session.focus(selector).await?;
        self.session.blur(selector).await
    }
}
