//! Registration modal

use rand::rngs::StdRng;
use rand::Rng;
use tracing::info;

use qadrive_common::Result;

use crate::browser::{BrowserSession, WaitState};
use crate::pages::GaragePage;
use crate::wait::{poll_for, poll_until};

const MODAL: &str = "//app-signup-modal";
const MODAL_WINDOW: &str = "//ngb-modal-window[contains(@class, 'd-block')]";
const REGISTRATION_TITLE: &str = "//h4[text()='Registration']";
const CLOSE_BUTTON: &str = "//button[@class='close']";
const NAME_FIELD: &str = "//input[@id='signupName']";
const LAST_NAME_FIELD: &str = "//input[@id='signupLastName']";
const EMAIL_FIELD: &str = "//input[@id='signupEmail']";
const PASSWORD_FIELD: &str = "//input[@id='signupPassword']";
const REPEAT_PASSWORD_FIELD: &str = "//input[@id='signupRepeatPassword']";
const REGISTER_BUTTON: &str = "//app-signup-modal//button[text()='Register']";
const FIELD_ERROR_MESSAGE: &str = "//div[@class='invalid-feedback']//p";
const EXISTING_USER_ERROR: &str = "p.alert-danger";

const INVALID_CLASS: &str = "is-invalid";
const INVALID_BORDER: &str = "rgb(220, 53, 69)";

/// The registration form's input fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignUpField {
    Name,
    LastName,
    Email,
    Password,
    RepeatPassword,
}

impl SignUpField {
    pub const ALL: [SignUpField; 5] = [
        SignUpField::Name,
        SignUpField::LastName,
        SignUpField::Email,
        SignUpField::Password,
        SignUpField::RepeatPassword,
    ];

    pub fn selector(&self) -> &'static str {
        match self {
            SignUpField::Name => NAME_FIELD,
            SignUpField::LastName => LAST_NAME_FIELD,
            SignUpField::Email => EMAIL_FIELD,
            SignUpField::Password => PASSWORD_FIELD,
            SignUpField::RepeatPassword => REPEAT_PASSWORD_FIELD,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SignUpField::Name => "name",
            SignUpField::LastName => "last name",
            SignUpField::Email => "email",
            SignUpField::Password => "password",
            SignUpField::RepeatPassword => "repeat password",
        }
    }
}

/// Input for filling the whole form
#[derive(Debug, Clone)]
pub struct SignUpData {
    pub name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub repeat_password: String,
}

impl SignUpData {
    pub fn matching(name: &str, last_name: &str, email: &str, password: &str) -> Self {
        Self {
            name: name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            repeat_password: password.to_string(),
        }
    }
}

pub struct SignUpForm {
    session: BrowserSession,
}

impl SignUpForm {
    pub fn new(session: BrowserSession) -> Self {
        Self { session }
    }

    pub async fn wait_visible(&self) -> Result<()> {
        self.session.wait_for(MODAL, WaitState::Visible, None).await
    }

    pub async fn is_visible(&self) -> Result<bool> {
        self.session.is_visible(MODAL).await
    }

    pub async fn wait_closed(&self) -> Result<()> {
        self.session.wait_for(MODAL, WaitState::Hidden, None).await
    }

    pub async fn title_visible(&self) -> Result<bool> {
        self.session.is_visible(REGISTRATION_TITLE).await
    }

    /// Fill a field, then blur it so validation fires.
    pub async fn fill_field(&self, field: SignUpField, value: &str) -> Result<()> {
        self.session.fill(field.selector(), value).await?;
        self.session.blur(field.selector()).await
    }

    pub async fn field_value(&self, field: SignUpField) -> Result<String> {
        self.session.input_value(field.selector()).await
    }

    pub async fn fill_all(&self, data: &SignUpData) -> Result<()> {
        self.session.fill(NAME_FIELD, &data.name).await?;
        self.session.fill(LAST_NAME_FIELD, &data.last_name).await?;
        self.session.fill(EMAIL_FIELD, &data.email).await?;
        self.session.fill(PASSWORD_FIELD, &data.password).await?;
        self.session
            .fill(REPEAT_PASSWORD_FIELD, &data.repeat_password)
            .await?;
        // blur the last field so the form state settles
        self.session.blur(REPEAT_PASSWORD_FIELD).await
    }

    /// Pick one input field with a seeded generator and log the choice, so a
    /// failure names the exact field that was exercised.
    pub fn pick_random_field(&self, rng: &mut StdRng) -> SignUpField {
        let index = rng.gen_range(0..SignUpField::ALL.len());
        let field = SignUpField::ALL[index];
        info!(field = field.label(), index, "selected random sign-up field");
        field
    }

    pub async fn all_fields_visible(&self) -> Result<bool> {
        for field in SignUpField::ALL {
            if !self.session.is_visible(field.selector()).await? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub async fn wait_all_fields_empty(&self) -> Result<()> {
        for field in SignUpField::ALL {
            poll_until(
                &format!("sign-up field '{}' empty", field.label()),
                self.session.config().wait_timeout(),
                self.session.config().poll_interval(),
                || async move { Ok(self.field_value(field).await?.is_empty()) },
            )
            .await?;
        }
        Ok(())
    }

    /// True when the field carries the invalid class or the red border.
    pub async fn field_flagged_invalid(&self, field: SignUpField) -> Result<bool> {
        let class = self.session.class_attr(field.selector()).await?;
        if class.split_whitespace().any(|c| c == INVALID_CLASS) {
            return Ok(true);
        }
        let border = self.session.css_value(field.selector(), "border-color").await?;
        Ok(border == INVALID_BORDER)
    }

    pub async fn error_messages(&self) -> Result<Vec<String>> {
        let texts = self.session.all_text_contents(FIELD_ERROR_MESSAGE).await?;
        Ok(texts.into_iter().map(|t| t.trim().to_string()).collect())
    }

    /// Wait until exactly `expected` validation messages are shown; returns
    /// their texts.
    pub async fn wait_error_count(&self, expected: usize) -> Result<Vec<String>> {
        poll_for(
            &format!("{expected} sign-up validation message(s)"),
            self.session.config().wait_timeout(),
            self.session.config().poll_interval(),
            || async move { self.error_messages().await },
            |messages| messages.len() == expected,
        )
        .await
    }

    /// Fill a field and wait for the single expected validation message.
    pub async fn expect_field_error(
        &self,
        field: SignUpField,
        input: &str,
        message: &str,
    ) -> Result<()> {
        self.fill_field(field, input).await?;
        poll_until(
            &format!("validation message '{message}' on {}", field.label()),
            self.session.config().wait_timeout(),
            self.session.config().poll_interval(),
            || async move {
                let messages = self.error_messages().await?;
                Ok(messages.len() == 1 && messages[0] == message)
            },
        )
        .await
    }

    pub async fn register_enabled(&self) -> Result<bool> {
        self.session.is_enabled(REGISTER_BUTTON).await
    }

    pub async fn wait_register_enabled(&self, expected: bool) -> Result<()> {
        poll_until(
            &format!("register button enabled = {expected}"),
            self.session.config().wait_timeout(),
            self.session.config().poll_interval(),
            || async move { Ok(self.register_enabled().await? == expected) },
        )
        .await
    }

    /// Submit the registration; on success the application lands on the
    /// garage page.
    pub async fn register(&self) -> Result<GaragePage> {
        self.session.click(REGISTER_BUTTON).await?;
        Ok(GaragePage::new(self.session.clone()))
    }

    pub async fn close(&self) -> Result<()> {
        self.session.click(CLOSE_BUTTON).await?;
        self.wait_closed().await
    }

    pub async fn click_outside(&self) -> Result<()> {
        self.session.click(MODAL_WINDOW).await
    }

    pub async fn wait_existing_user_error(&self) -> Result<()> {
        self.session
            .wait_for(EXISTING_USER_ERROR, WaitState::Visible, None)
            .await
    }

    pub async fn existing_user_error_count(&self) -> Result<usize> {
        self.session.count(EXISTING_USER_ERROR).await
    }
}
