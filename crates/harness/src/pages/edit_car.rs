//! Edit-car modal and the remove-car confirmation it opens

use qadrive_common::Result;

use crate::browser::{BrowserSession, WaitState};

const REMOVE_CAR_BUTTON: &str = "text=Remove car";
const CONFIRM_REMOVE_BUTTON: &str = "//button[contains(@class, 'btn-danger')]";
const REMOVE_MODAL: &str = "//app-remove-car-modal";

pub struct EditCarForm {
    session: BrowserSession,
}

impl EditCarForm {
    pub fn new(session: BrowserSession) -> Self {
        Self { session }
    }

    pub async fn wait_visible(&self) -> Result<()> {
        self.session
            .wait_for(REMOVE_CAR_BUTTON, WaitState::Visible, None)
            .await
    }

    /// Ask to remove the car; confirmation happens in the returned dialog.
    pub async fn remove_car(&self) -> Result<RemoveCarDialog> {
        self.session.click(REMOVE_CAR_BUTTON).await?;
        let dialog = RemoveCarDialog::new(self.session.clone());
        dialog.wait_visible().await?;
        Ok(dialog)
    }
}

pub struct RemoveCarDialog {
    session: BrowserSession,
}

impl RemoveCarDialog {
    pub fn new(session: BrowserSession) -> Self {
        Self { session }
    }

    pub async fn wait_visible(&self) -> Result<()> {
        self.session
            .wait_for(CONFIRM_REMOVE_BUTTON, WaitState::Visible, None)
            .await
    }

    /// Confirm the removal and wait for the dialog to close.
    pub async fn confirm(&self) -> Result<()> {
        self.session.click(CONFIRM_REMOVE_BUTTON).await?;
        self.session
            .wait_for(REMOVE_MODAL, WaitState::Hidden, None)
            .await
    }
}
