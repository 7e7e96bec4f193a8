//! Add-car modal

use qadrive_common::Result;

use crate::browser::{BrowserSession, WaitState};
use crate::wait::poll_until;

const MODAL: &str = "//app-add-car-modal";
const BRAND_DROPDOWN: &str = "//select[@id='addCarBrand']";
const MODEL_DROPDOWN: &str = "//select[@id='addCarModel']";
const MILEAGE_FIELD: &str = "//input[@id='addCarMileage']";
const ADD_BUTTON: &str =
    "//div[contains(@class, 'modal-footer')]//button[@class='btn btn-primary']";

pub struct AddCarForm {
    session: BrowserSession,
}

impl AddCarForm {
    pub fn new(session: BrowserSession) -> Self {
        Self { session }
    }

    pub async fn wait_visible(&self) -> Result<()> {
        self.session
            .wait_for(BRAND_DROPDOWN, WaitState::Visible, None)
            .await
    }

    pub async fn select_brand(&self, brand: &str) -> Result<()> {
        self.session.select_option(BRAND_DROPDOWN, brand).await?;
        // the model list repopulates after a brand change; wait for it
        // instead of sleeping
        self.wait_model_available("").await
    }

    /// Wait until the model dropdown offers the given model (any model when
    /// empty).
    async fn wait_model_available(&self, model: &str) -> Result<()> {
        let option_selector = if model.is_empty() {
            format!("{MODEL_DROPDOWN}/option")
        } else {
            format!("{MODEL_DROPDOWN}/option[text()='{model}']")
        };
        poll_until(
            &format!("model option '{model}' available"),
            self.session.config().wait_timeout(),
            self.session.config().poll_interval(),
            || {
                let selector = option_selector.clone();
                async move { Ok(self.session.count(&selector).await? > 0) }
            },
        )
        .await
    }

    pub async fn select_model(&self, model: &str) -> Result<()> {
        self.wait_model_available(model).await?;
        self.session.select_option(MODEL_DROPDOWN, model).await
    }

    pub async fn enter_mileage(&self, mileage: &str) -> Result<()> {
        self.session.fill(MILEAGE_FIELD, mileage).await
    }

    /// Submit and wait for the modal to close.
    pub async fn submit(&self) -> Result<()> {
        self.session.click(ADD_BUTTON).await?;
        self.session.wait_for(MODAL, WaitState::Hidden, None).await
    }

    /// Fill and submit the whole form, strictly in order.
    pub async fn add_car(&self, brand: &str, model: &str, mileage: &str) -> Result<()> {
        self.select_brand(brand).await?;
        self.select_model(model).await?;
        self.enter_mileage(mileage).await?;
        self.submit().await
    }
}
