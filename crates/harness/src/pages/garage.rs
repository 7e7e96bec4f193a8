//! Garage page

use qadrive_common::Result;

use crate::browser::{BrowserSession, WaitState};
use crate::pages::{AddCarForm, EditCarForm};
use crate::wait::poll_until;

const GARAGE_HEADER: &str = "//h1[contains(., 'Garage')]";
const USER_PROFILE_DROPDOWN: &str = "//button[@id='userNavDropdown']";
const ADD_CAR_BUTTON: &str = "//button[contains(@class, 'btn-primary')]";
const CAR_NAMES: &str = "//p[contains(@class, 'car_name')]";
const EDIT_CAR_ICON: &str = "//span[contains(@class, 'icon-edit')]";
const LOG_OUT_BUTTON: &str =
    "//a[contains(@class, 'btn-link') and contains(@class, 'text-danger')]";

pub struct GaragePage {
    session: BrowserSession,
}

impl GaragePage {
    pub fn new(session: BrowserSession) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &BrowserSession {
        &self.session
    }

    pub async fn open(&self) -> Result<()> {
        self.session.goto("/panel/garage").await
    }

    /// Satisfied once the header and the profile dropdown are both visible.
    pub async fn wait_until_open(&self) -> Result<()> {
        self.session
            .wait_for(GARAGE_HEADER, WaitState::Visible, None)
            .await?;
        self.session
            .wait_for(USER_PROFILE_DROPDOWN, WaitState::Visible, None)
            .await
    }

    pub async fn open_add_car_form(&self) -> Result<AddCarForm> {
        self.session.click(ADD_CAR_BUTTON).await?;
        let form = AddCarForm::new(self.session.clone());
        form.wait_visible().await?;
        Ok(form)
    }

    /// Open the edit form of the most recently listed car.
    pub async fn open_edit_car_form(&self) -> Result<EditCarForm> {
        self.session.click(EDIT_CAR_ICON).await?;
        let form = EditCarForm::new(self.session.clone());
        form.wait_visible().await?;
        Ok(form)
    }

    /// Name shown for the most recently added car.
    pub async fn last_car_name(&self) -> Result<String> {
        Ok(self.session.text_content(CAR_NAMES).await?.trim().to_string())
    }

    /// Wait until the newest listing entry carries the expected name.
    pub async fn wait_last_car_name(&self, expected: &str) -> Result<()> {
        poll_until(
            &format!("newest car named '{expected}'"),
            self.session.config().wait_timeout(),
            self.session.config().poll_interval(),
            || async move { Ok(self.last_car_name().await? == expected) },
        )
        .await
    }

    pub async fn car_count(&self) -> Result<usize> {
        self.session.count(CAR_NAMES).await
    }

    pub async fn log_out(&self) -> Result<()> {
        self.session.click(USER_PROFILE_DROPDOWN).await?;
        self.session.click(LOG_OUT_BUTTON).await
    }
}
